use tracing::{debug, warn};

use super::types::SankeyGraph;

/// Stacks each column top-down in `sorting` order (stable over input order).
/// A node with a relative-position constraint whose target already has a y
/// in this pass is placed relative to it; anything else goes at the column
/// cursor. Returns the tallest column extent.
pub(super) fn place_nodes(graph: &mut SankeyGraph, max_column: usize) -> f32 {
    let node_count = graph.nodes.len();
    let mut order: Vec<usize> = (0..node_count).collect();
    order.sort_by(|&a, &b| graph.nodes[a].sorting.total_cmp(&graph.nodes[b].sorting));

    let mut placed: Vec<Option<f32>> = vec![None; node_count];
    let mut max_y = 0.0f32;
    for column in 0..=max_column {
        let mut cursor = 0.0f32;
        for &idx in order.iter().filter(|&&idx| graph.nodes[idx].x == column) {
            let node = &graph.nodes[idx];
            let anchor = node.relative_to.as_ref().and_then(|rel| {
                let target = graph.node_index(&rel.id)?;
                let target_y = placed[target]?;
                Some(
                    target_y
                        + rel.fraction_of_target * graph.nodes[target].size
                        + rel.fraction_of_self * node.size,
                )
            });
            let y = match anchor {
                Some(y) => y,
                None => {
                    if let Some(rel) = &node.relative_to {
                        warn!(node = %node.id, target = %rel.id, "relative target not placed yet, stacking instead");
                    }
                    cursor
                }
            };
            placed[idx] = Some(y);
            cursor = y + node.size;
        }
        max_y = max_y.max(cursor);
    }

    for (node, y) in graph.nodes.iter_mut().zip(placed) {
        node.y = y.unwrap_or(0.0);
    }
    debug!(content_height = max_y, "placed nodes");
    max_y
}

/// Derives the logical padding unit from a pixel gap so that, once scaled
/// onto `canvas_height`, each gap measures `padding` pixels.
pub(super) fn padding_unit(content_height: f32, canvas_height: f32, padding: f32) -> f32 {
    if canvas_height <= 0.0 || !content_height.is_finite() {
        return 0.0;
    }
    content_height / canvas_height * padding
}

/// Walks nodes in ascending y and pushes each one down by a per-column
/// running multiple of `unit`. Relatively placed nodes reset the counter to
/// 0, an explicit override sets it. Afterwards the layout is shifted so the
/// smallest y is exactly 0. Returns the new content height.
pub(super) fn add_padding(graph: &mut SankeyGraph, unit: f32, max_column: usize) -> f32 {
    if graph.nodes.is_empty() {
        return 0.0;
    }
    let mut order: Vec<usize> = (0..graph.nodes.len()).collect();
    order.sort_by(|&a, &b| graph.nodes[a].y.total_cmp(&graph.nodes[b].y));

    for column in 0..=max_column {
        let mut paddings = 0.0f32;
        for &idx in &order {
            let node = &mut graph.nodes[idx];
            if node.x != column {
                continue;
            }
            if node.relative_to.is_some() {
                paddings = 0.0;
            }
            if let Some(explicit) = node.padding_override {
                paddings = explicit;
            }
            node.y += paddings * unit;
            paddings += 1.0;
        }
    }

    let min_y = graph
        .nodes
        .iter()
        .map(|node| node.y)
        .fold(f32::INFINITY, f32::min);
    let mut max_y = 0.0f32;
    for node in &mut graph.nodes {
        node.y -= min_y;
        max_y = max_y.max(node.y + node.size);
    }
    max_y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SankeyConfig;
    use crate::ir::{FlowSpec, NodeConfig, RelativePosition};
    use crate::layout::columns::assign_columns;
    use crate::layout::enrich::enrich;

    fn prepared(flows: &[FlowSpec], config: &SankeyConfig) -> (SankeyGraph, usize) {
        let mut graph = enrich(flows, config);
        let max = assign_columns(&mut graph).unwrap();
        (graph, max)
    }

    fn y_of(graph: &SankeyGraph, id: &str) -> f32 {
        graph.node(id).unwrap().y
    }

    fn relative(target: &str, of_target: f32, of_self: f32) -> NodeConfig {
        NodeConfig {
            relative_to: Some(RelativePosition {
                id: target.to_string(),
                fraction_of_target: of_target,
                fraction_of_self: of_self,
            }),
            ..NodeConfig::default()
        }
    }

    #[test]
    fn column_nodes_stack_in_input_order() {
        let flows = vec![FlowSpec::new("A", "B", 10.0), FlowSpec::new("A", "C", 5.0)];
        let (mut graph, max) = prepared(&flows, &SankeyConfig::default());
        let height = place_nodes(&mut graph, max);
        assert_eq!(y_of(&graph, "A"), 0.0);
        assert_eq!(y_of(&graph, "B"), 0.0);
        assert_eq!(y_of(&graph, "C"), 10.0);
        assert_eq!(height, 15.0);
    }

    #[test]
    fn sorting_key_reorders_a_column() {
        let mut config = SankeyConfig::default();
        config.node_config.insert(
            "C".to_string(),
            NodeConfig {
                sorting: Some(-1.0),
                ..NodeConfig::default()
            },
        );
        let flows = vec![FlowSpec::new("A", "B", 10.0), FlowSpec::new("A", "C", 5.0)];
        let (mut graph, max) = prepared(&flows, &config);
        place_nodes(&mut graph, max);
        assert_eq!(y_of(&graph, "C"), 0.0);
        assert_eq!(y_of(&graph, "B"), 5.0);
    }

    #[test]
    fn relative_position_uses_target_and_self_fractions() {
        let mut config = SankeyConfig::default();
        config
            .node_config
            .insert("B".to_string(), relative("A", 0.5, -0.5));
        // A: size 20 in column 0; B: size 6 in column 0 after A.
        let flows = vec![
            FlowSpec::new("A", "X", 20.0),
            FlowSpec::new("B", "X", 6.0),
        ];
        let (mut graph, max) = prepared(&flows, &config);
        place_nodes(&mut graph, max);
        assert_eq!(y_of(&graph, "A"), 0.0);
        assert_eq!(y_of(&graph, "B"), 0.0 + 0.5 * 20.0 - 0.5 * 6.0);
    }

    #[test]
    fn unresolved_relative_target_falls_back_to_cursor() {
        let mut config = SankeyConfig::default();
        config
            .node_config
            .insert("A".to_string(), relative("Nowhere", 1.0, 0.0));
        // A refers to a node in a later column: not placed yet either.
        config.node_config.insert("C".to_string(), relative("B", 1.0, 0.0));
        let flows = vec![
            FlowSpec::new("C", "B", 4.0),
            FlowSpec::new("A", "B", 3.0),
        ];
        let (mut graph, max) = prepared(&flows, &config);
        place_nodes(&mut graph, max);
        assert_eq!(y_of(&graph, "C"), 0.0);
        assert_eq!(y_of(&graph, "A"), 4.0);
    }

    #[test]
    fn padding_spreads_stacked_nodes_per_column() {
        let flows = vec![
            FlowSpec::new("A", "B", 10.0),
            FlowSpec::new("A", "C", 5.0),
            FlowSpec::new("A", "D", 5.0),
        ];
        let (mut graph, max) = prepared(&flows, &SankeyConfig::default());
        place_nodes(&mut graph, max);
        let height = add_padding(&mut graph, 2.0, max);
        assert_eq!(y_of(&graph, "A"), 0.0);
        assert_eq!(y_of(&graph, "B"), 0.0);
        assert_eq!(y_of(&graph, "C"), 12.0);
        assert_eq!(y_of(&graph, "D"), 19.0);
        assert_eq!(height, 24.0);
    }

    #[test]
    fn relative_node_resets_padding_and_override_sets_it() {
        let mut config = SankeyConfig::default();
        config.node_config.insert("C".to_string(), relative("B", 1.0, 0.0));
        config.node_config.insert(
            "D".to_string(),
            NodeConfig {
                paddings: Some(5.0),
                ..NodeConfig::default()
            },
        );
        let flows = vec![
            FlowSpec::new("A", "B", 4.0),
            FlowSpec::new("A", "C", 4.0),
            FlowSpec::new("A", "D", 4.0),
        ];
        let (mut graph, max) = prepared(&flows, &config);
        place_nodes(&mut graph, max);
        add_padding(&mut graph, 1.0, max);
        assert_eq!(y_of(&graph, "B"), 0.0);
        // C sits flush under B: the relative constraint resets the counter.
        assert_eq!(y_of(&graph, "C"), 4.0);
        assert_eq!(y_of(&graph, "D"), 8.0 + 5.0);
    }

    #[test]
    fn negative_positions_are_renormalized_to_zero() {
        let mut config = SankeyConfig::default();
        config.node_config.insert("B".to_string(), relative("A", 0.0, -1.0));
        let flows = vec![FlowSpec::new("A", "X", 10.0), FlowSpec::new("B", "X", 4.0)];
        let (mut graph, max) = prepared(&flows, &config);
        place_nodes(&mut graph, max);
        assert_eq!(y_of(&graph, "B"), -4.0);
        let height = add_padding(&mut graph, 0.0, max);
        assert_eq!(y_of(&graph, "B"), 0.0);
        assert_eq!(y_of(&graph, "A"), 4.0);
        let min = graph.nodes.iter().map(|n| n.y).fold(f32::INFINITY, f32::min);
        assert_eq!(min, 0.0);
        // X (size 14) was at 0 in column 1 and moves down with everything else.
        assert_eq!(y_of(&graph, "X"), 4.0);
        assert_eq!(height, 18.0);
    }

    #[test]
    fn padding_unit_guards_zero_canvas() {
        assert_eq!(padding_unit(100.0, 0.0, 20.0), 0.0);
        assert_eq!(padding_unit(100.0, 500.0, 20.0), 4.0);
    }
}
