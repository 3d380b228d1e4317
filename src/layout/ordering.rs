use super::types::SankeyGraph;

/// Stacks the flows at each node end: incoming flows sorted by the y of
/// their source, outgoing by the y of their target (stable on ties), each
/// taking `value` of vertical space from a running offset starting at 0.
pub(super) fn order_flows(graph: &mut SankeyGraph) {
    let node_y: Vec<f32> = graph.nodes.iter().map(|node| node.y).collect();

    for node in &graph.nodes {
        let mut incoming = node.incoming.clone();
        incoming.sort_by(|&a, &b| {
            node_y[graph.flows[a].from_idx].total_cmp(&node_y[graph.flows[b].from_idx])
        });
        let mut offset = 0.0f32;
        for flow_idx in incoming {
            let flow = &mut graph.flows[flow_idx];
            flow.offset_to = offset;
            offset += flow.value;
        }

        let mut outgoing = node.outgoing.clone();
        outgoing.sort_by(|&a, &b| {
            node_y[graph.flows[a].to_idx].total_cmp(&node_y[graph.flows[b].to_idx])
        });
        let mut offset = 0.0f32;
        for flow_idx in outgoing {
            let flow = &mut graph.flows[flow_idx];
            flow.offset_from = offset;
            offset += flow.value;
        }
    }
}
