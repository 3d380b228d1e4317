use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sankey_rs::config::SankeyConfig;
use sankey_rs::ir::FlowSpec;
use sankey_rs::layout::compute_layout_with;
use sankey_rs::parser::parse_sankey;
use sankey_rs::render::render_svg;
use sankey_rs::text_metrics::CharWidthMetrics;
use sankey_rs::theme::Theme;
use std::hint::black_box;

/// `columns` layers of `per_column` nodes, each feeding `fan_out` nodes of the
/// next layer.
fn layered_flows(columns: usize, per_column: usize, fan_out: usize) -> Vec<FlowSpec> {
    let mut flows = Vec::new();
    for column in 0..columns.saturating_sub(1) {
        for i in 0..per_column {
            for k in 0..fan_out.min(per_column) {
                let j = (i + k) % per_column;
                let value = ((i * 7 + j * 3 + column) % 23 + 1) as f64;
                flows.push(FlowSpec::new(
                    &format!("C{column}N{i}"),
                    &format!("C{}N{j}", column + 1),
                    value,
                ));
            }
        }
    }
    flows
}

fn fixture() -> &'static str {
    include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/benches/fixtures/sankey_medium.mmd"
    ))
}

fn bench_parse(c: &mut Criterion) {
    let input = fixture();
    c.bench_function("parse/sankey_medium", |b| {
        b.iter(|| {
            let doc = parse_sankey(black_box(input)).expect("parse failed");
            black_box(doc.flows.len());
        });
    });
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = SankeyConfig::default();
    for (columns, per_column, fan_out) in [(3, 4, 2), (6, 10, 3), (10, 25, 4), (20, 40, 5)] {
        let flows = layered_flows(columns, per_column, fan_out);
        let label = format!("{columns}x{per_column}x{fan_out}");
        group.bench_with_input(BenchmarkId::from_parameter(label), &flows, |b, flows| {
            b.iter(|| {
                let layout = compute_layout_with(black_box(flows), &config, &CharWidthMetrics)
                    .expect("layout failed");
                black_box(layout.metrics.content_height);
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let theme = Theme::classic();
    let input = fixture();
    c.bench_function("end_to_end/sankey_medium", |b| {
        b.iter(|| {
            let doc = parse_sankey(black_box(input)).expect("parse failed");
            let layout = compute_layout_with(&doc.flows, &doc.config, &CharWidthMetrics)
                .expect("layout failed");
            let svg = render_svg(&layout, &theme);
            black_box(svg.len());
        });
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_parse, bench_layout, bench_end_to_end
);
criterion_main!(benches);
