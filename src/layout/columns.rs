use tracing::debug;

use super::error::SankeyError;
use super::types::SankeyGraph;

/// Layered topological sort over incoming flows. Each round collects every
/// node whose predecessors all have a column and gives it the round index
/// (or its pinned column). Sinks are then pulled to the right edge.
/// Returns the maximum column in use.
pub(super) fn assign_columns(graph: &mut SankeyGraph) -> Result<usize, SankeyError> {
    let node_count = graph.nodes.len();
    let mut resolved: Vec<Option<usize>> = vec![None; node_count];
    let mut pending: Vec<usize> = (0..node_count).collect();
    let mut max_column = 0usize;

    // Every round places at least one node, so node_count rounds suffice.
    for round in 0..=node_count {
        if pending.is_empty() {
            break;
        }
        let ready: Vec<usize> = pending
            .iter()
            .copied()
            .filter(|&idx| {
                graph.nodes[idx]
                    .incoming
                    .iter()
                    .all(|&flow| resolved[graph.flows[flow].from_idx].is_some())
            })
            .collect();
        if ready.is_empty() {
            break;
        }
        for idx in ready {
            let column = graph.nodes[idx].pinned_column.unwrap_or(round);
            resolved[idx] = Some(column);
            max_column = max_column.max(column);
        }
        pending.retain(|&idx| resolved[idx].is_none());
    }

    if !pending.is_empty() {
        return Err(SankeyError::Cycle {
            unplaced: pending
                .iter()
                .map(|&idx| graph.nodes[idx].id.clone())
                .collect(),
        });
    }

    for (node, column) in graph.nodes.iter_mut().zip(resolved) {
        node.x = column.unwrap_or(0);
    }

    for node in graph.nodes.iter_mut().filter(|node| node.is_sink()) {
        node.x = node
            .pinned_column
            .map_or(max_column, |pin| pin.max(max_column));
        max_column = node.x;
    }

    debug!(nodes = node_count, max_column, "assigned columns");
    Ok(max_column)
}
