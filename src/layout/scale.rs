use tracing::debug;

use crate::config::Margin;

use super::types::{LabelSpace, SankeyGraph, Scale};

/// Canvas the logical layout is mapped onto.
#[derive(Debug, Clone, Copy)]
pub(super) struct Canvas {
    pub width: f32,
    pub height: f32,
    pub margin: Margin,
}

pub(super) fn compute_scale(
    canvas: &Canvas,
    max_column: usize,
    content_height: f32,
    labels: &LabelSpace,
) -> Scale {
    let x = if max_column == 0 {
        0.0
    } else {
        let usable = canvas.width
            - labels.left
            - labels.right
            - labels.column_width(max_column)
            - canvas.margin.horizontal();
        (usable / max_column as f32).max(0.0)
    };
    let y = if content_height > 0.0 {
        ((canvas.height - canvas.margin.vertical()) / content_height).max(0.0)
    } else {
        0.0
    };
    Scale { x, y }
}

/// Maps (column, y, size) to pixels. Nodes narrower than their column's
/// widest node sit flush left in column 0, flush right in the last column
/// and centered elsewhere.
pub(super) fn scale_nodes(
    graph: &mut SankeyGraph,
    canvas: &Canvas,
    max_column: usize,
    content_height: f32,
    labels: &LabelSpace,
) -> Scale {
    let scale = compute_scale(canvas, max_column, content_height, labels);
    for node in &mut graph.nodes {
        let slack = labels.column_width(node.x) - node.width;
        let shift = if node.x == 0 {
            0.0
        } else if node.x == max_column {
            slack
        } else {
            slack / 2.0
        };
        node.pixel_x = node.x as f32 * scale.x + labels.left + shift + canvas.margin.left;
        node.pixel_y = node.y * scale.y + canvas.margin.top;
        node.pixel_size = node.size * scale.y;
    }
    debug!(scale_x = scale.x, scale_y = scale.y, "scaled layout");
    scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SankeyConfig;
    use crate::ir::{FlowSpec, NodeConfig};
    use crate::layout::columns::assign_columns;
    use crate::layout::enrich::enrich;

    fn canvas(width: f32, height: f32) -> Canvas {
        Canvas {
            width,
            height,
            margin: Margin::default(),
        }
    }

    fn space(left: f32, right: f32, widths: Vec<f32>) -> LabelSpace {
        LabelSpace {
            left,
            right,
            column_widths: widths,
        }
    }

    #[test]
    fn scale_accounts_for_labels_margins_and_last_column() {
        let mut c = canvas(500.0, 400.0);
        c.margin = Margin::from([10.0, 5.0, 30.0, 15.0]);
        let scale = compute_scale(&c, 2, 18.0, &space(40.0, 20.0, vec![20.0, 20.0, 20.0]));
        assert_eq!(scale.x, (500.0 - 60.0 - 20.0 - 20.0) / 2.0);
        assert_eq!(scale.y, (400.0 - 40.0) / 18.0);
    }

    #[test]
    fn degenerate_dimensions_give_zero_scale() {
        let scale = compute_scale(&canvas(500.0, 500.0), 0, 0.0, &space(0.0, 0.0, vec![20.0]));
        assert_eq!(scale, Scale { x: 0.0, y: 0.0 });
        let scale = compute_scale(&canvas(0.0, 0.0), 3, 10.0, &space(0.0, 0.0, vec![20.0; 4]));
        assert_eq!(scale, Scale { x: 0.0, y: 0.0 });
    }

    #[test]
    fn narrow_nodes_are_shifted_within_their_column() {
        let mut config = SankeyConfig::default();
        for id in ["A", "B", "C"] {
            config.node_config.insert(
                id.to_string(),
                NodeConfig {
                    width: Some(10.0),
                    ..NodeConfig::default()
                },
            );
        }
        let flows = vec![
            FlowSpec::new("A", "B", 1.0),
            FlowSpec::new("B", "C", 1.0),
            FlowSpec::new("W", "X", 1.0),
            FlowSpec::new("X", "Y", 1.0),
        ];
        let mut graph = enrich(&flows, &config);
        let max = assign_columns(&mut graph).unwrap();
        let labels = space(0.0, 0.0, vec![20.0, 20.0, 20.0]);
        let scale = scale_nodes(&mut graph, &canvas(240.0, 100.0), max, 1.0, &labels);
        assert_eq!(scale.x, 110.0);
        assert_eq!(graph.node("A").unwrap().pixel_x, 0.0);
        assert_eq!(graph.node("B").unwrap().pixel_x, 110.0 + 5.0);
        assert_eq!(graph.node("C").unwrap().pixel_x, 220.0 + 10.0);
        assert_eq!(graph.node("Y").unwrap().pixel_x, 220.0);
        assert_eq!(graph.node("C").unwrap().pixel_size, 100.0);
    }
}
