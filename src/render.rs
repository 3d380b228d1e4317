use crate::layout::{Layout, SankeyNode};
use crate::theme::Theme;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

pub fn render_svg(layout: &Layout, theme: &Theme) -> String {
    let mut svg = String::new();
    let width = layout.metrics.width;
    let height = layout.metrics.height;
    let max_column = layout.metrics.max_column;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"{}\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        escape_xml(&layout.id)
    ));
    svg.push_str(&style_block(layout, theme));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<g id=\"nodes\">");
    for node in layout.nodes() {
        if node.width <= 0.0 || node.pixel_size <= 0.0 {
            continue;
        }
        svg.push_str(&format!(
            "<rect id=\"node-{}\" class=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\"{}/>",
            node.id_clean,
            escape_xml(&column_classes(node, max_column, "node", node.class_name.as_deref())),
            node.pixel_x,
            node.pixel_y,
            node.width,
            node.pixel_size,
            theme.node_fill,
            theme.node_stroke,
            tooltip_attr(node.tooltip.as_deref())
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g id=\"flows\">");
    for flow in layout.flows() {
        let mut classes: Vec<&str> = Vec::new();
        if let Some(class_name) = flow.class_name.as_deref() {
            classes.push(class_name);
        }
        if flow.value == 0.0 {
            classes.push("flowvalue-zero");
        }
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", escape_xml(&classes.join(" ")))
        };
        svg.push_str(&format!(
            "<path id=\"flow-{}\"{} d=\"{}\" fill=\"{}\" fill-opacity=\"{}\"{}/>",
            flow.id_clean,
            class_attr,
            flow.path,
            theme.flow_fill,
            theme.flow_opacity,
            tooltip_attr(flow.tooltip.as_deref())
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g id=\"labels\">");
    for node in layout.nodes() {
        if let Some(label) = node.label.as_deref().filter(|text| !text.is_empty()) {
            svg.push_str(&label_svg(layout, node, label, theme));
        }
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}

fn label_svg(layout: &Layout, node: &SankeyNode, label: &str, theme: &Theme) -> String {
    let (x, y) = layout.label_origin(node);
    let font_size = layout.metrics.font_size;
    let padding = layout.metrics.label_padding;
    let mut group = format!(
        "<g id=\"label-node-{}\" class=\"{}\" transform=\"translate({x:.2}, {y:.2})\">",
        node.id_clean,
        column_classes(node, layout.metrics.max_column, "label", None)
    );
    group.push_str(&format!(
        "<rect width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"{}\"/>",
        node.label_size.width,
        node.label_size.height,
        theme.label_background,
        theme.label_background_opacity
    ));
    group.push_str(&format!(
        "<text y=\"{padding:.2}\" font-family=\"{}\" font-size=\"{font_size}pt\" fill=\"{}\">",
        escape_xml(&theme.font_family),
        theme.text_color
    ));
    for line in label.split('\n') {
        group.push_str(&format!(
            "<tspan x=\"{padding:.2}\" dy=\"1.2em\">{}</tspan>",
            escape_xml(line)
        ));
    }
    group.push_str("</text></g>");
    group
}

/// `{kind}-column-{x}`, plus `-last` for the last column or `-middle` for
/// any column in between, plus the user class.
fn column_classes(node: &SankeyNode, max_column: usize, kind: &str, extra: Option<&str>) -> String {
    let mut classes = vec![format!("{kind}-column-{}", node.x)];
    if node.x == max_column {
        classes.push(format!("{kind}-column-last"));
    } else if node.x != 0 {
        classes.push(format!("{kind}-column-middle"));
    }
    if let Some(extra) = extra.filter(|extra| !extra.is_empty()) {
        classes.push(extra.to_string());
    }
    classes.join(" ")
}

fn tooltip_attr(tooltip: Option<&str>) -> String {
    match tooltip {
        Some(text) if !text.is_empty() => format!(" data-tooltip=\"{}\"", escape_xml(text)),
        _ => String::new(),
    }
}

fn style_block(layout: &Layout, theme: &Theme) -> String {
    let scope = format!("svg#{}", layout.id);
    let mut css = String::new();
    css.push_str(&format!(
        "{scope} path[id^='flow-']:hover{{fill-opacity:{}}}\n",
        theme.flow_hover_opacity
    ));
    css.push_str(&format!(
        "{scope} path.flowvalue-zero{{stroke:{};stroke-width:1}}\n",
        theme.zero_flow_stroke
    ));
    css.push_str(&format!("{scope} g[id^='label-node']{{pointer-events:none}}\n"));
    css.push_str(&format!("{scope} *{{font-size:{}pt}}\n", layout.metrics.font_size));

    for node in layout.nodes() {
        if let Some(rules) = css_declarations(&node.style) {
            css.push_str(&format!("{scope} #node-{}{{{rules}}}\n", node.id_clean));
        }
    }
    for flow in layout.flows() {
        if let Some(rules) = css_declarations(&flow.style) {
            css.push_str(&format!("{scope} #flow-{}{{{rules}}}\n", flow.id_clean));
        }
    }
    format!("<style>{}</style>", escape_xml(&css))
}

fn css_declarations(style: &BTreeMap<String, String>) -> Option<String> {
    if style.is_empty() {
        return None;
    }
    Some(
        style
            .iter()
            .map(|(key, value)| format!("{key}:{value};"))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, width: f32, height: f32, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "sans-serif".to_string());
    opt.default_size = usvg::Size::from_wh(width, height)
        .or_else(|| usvg::Size::from_wh(500.0, 500.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid canvas size {width}x{height}"))?;
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SankeyConfig;
    use crate::ir::{FlowSpec, NodeConfig};
    use crate::layout::compute_layout_with;
    use crate::text_metrics::CharWidthMetrics;

    fn render(flows: &[FlowSpec], config: &SankeyConfig) -> String {
        let layout = compute_layout_with(flows, config, &CharWidthMetrics).unwrap();
        render_svg(&layout, &Theme::classic())
    }

    #[test]
    fn render_svg_basic() {
        let svg = render(
            &[FlowSpec::new("A", "B", 10.0), FlowSpec::new("A", "C", 5.0)],
            &SankeyConfig::default(),
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("id=\"sankey\""));
        assert!(svg.contains("<g id=\"nodes\">"));
        assert!(svg.contains("<g id=\"flows\">"));
        assert!(svg.contains("<g id=\"labels\">"));
        assert!(svg.contains("id=\"node-A\""));
        assert!(svg.contains("id=\"flow-A-C\""));
        assert!(svg.contains("id=\"label-node-B\""));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn column_classes_mark_last_and_middle() {
        let svg = render(
            &[FlowSpec::new("A", "B", 1.0), FlowSpec::new("B", "C", 1.0)],
            &SankeyConfig::default(),
        );
        assert!(svg.contains("class=\"node-column-0\""));
        assert!(svg.contains("class=\"node-column-1 node-column-middle\""));
        assert!(svg.contains("class=\"node-column-2 node-column-last\""));
        assert!(svg.contains("class=\"label-column-2 label-column-last\""));
    }

    #[test]
    fn zero_flow_gets_marker_class_and_no_node_rects() {
        let svg = render(&[FlowSpec::new("A", "B", 0.0)], &SankeyConfig::default());
        assert!(svg.contains("id=\"flow-A-B\" class=\"flowvalue-zero\""));
        // Zero-size nodes have no rect.
        assert!(!svg.contains("id=\"node-A\""));
    }

    #[test]
    fn tooltips_and_styles_are_escaped() {
        let mut config = SankeyConfig::default();
        let mut style = BTreeMap::new();
        style.insert("fill".to_string(), "red".to_string());
        config.node_config.insert(
            "A&B".to_string(),
            NodeConfig {
                style: Some(style),
                class_name: Some("source".to_string()),
                ..NodeConfig::default()
            },
        );
        let svg = render(&[FlowSpec::new("A&B", "C", 2.0)], &config);
        assert!(svg.contains("data-tooltip=\"A&amp;B (2)\""));
        assert!(svg.contains("data-tooltip=\"A&amp;B → C: 2\""));
        assert!(svg.contains("svg#sankey #node-AB{fill:red;}"));
        assert!(svg.contains("node-column-0 source"));
        assert!(svg.contains(">A&amp;B</tspan>"));
    }

    #[test]
    fn style_block_puts_one_rule_per_line() {
        let mut style = BTreeMap::new();
        style.insert("stroke".to_string(), "blue".to_string());
        let flows = [
            FlowSpec {
                style: Some(style),
                ..FlowSpec::new("A", "B", 3.0)
            },
            FlowSpec::new("A", "C", 0.0),
        ];
        let layout = compute_layout_with(&flows, &SankeyConfig::default(), &CharWidthMetrics).unwrap();
        let block = style_block(&layout, &Theme::classic());
        assert!(block.starts_with("<style>svg#sankey path[id^=&apos;flow-&apos;]:hover{fill-opacity:0.9}\n"));
        assert!(block.contains("\nsvg#sankey path.flowvalue-zero{stroke:#BBBBBB;stroke-width:1}\n"));
        assert!(block.contains("\nsvg#sankey *{font-size:12pt}\n"));
        assert!(block.ends_with("\nsvg#sankey #flow-A-B{stroke:blue;}\n</style>"));
        assert_eq!(block.matches('\n').count(), 5);
    }

    #[test]
    fn multi_line_labels_become_tspans() {
        let mut config = SankeyConfig::default();
        config.node_config.insert(
            "A".to_string(),
            NodeConfig {
                label: crate::ir::LabelConfig {
                    text: "first\nsecond".into(),
                    position: None,
                },
                ..NodeConfig::default()
            },
        );
        let svg = render(&[FlowSpec::new("A", "B", 1.0)], &config);
        assert!(svg.contains("<tspan x=\"4.00\" dy=\"1.2em\">first</tspan><tspan x=\"4.00\" dy=\"1.2em\">second</tspan>"));
    }
}
