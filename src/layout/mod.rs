//! Sankey layout pipeline.
//!
//! Passes run in a fixed order over one [`SankeyGraph`], each owning it for
//! its duration: enrichment, column assignment, vertical placement, padding,
//! flow endpoint ordering, label space reservation, scaling, and finally
//! curve geometry for every flow.

mod columns;
pub mod curve;
mod enrich;
pub mod error;
mod labels;
mod ordering;
mod scale;
pub mod types;
mod vertical;

use tracing::debug;

use crate::config::SankeyConfig;
use crate::ir::FlowSpec;
use crate::text_metrics::{CharWidthMetrics, FontMetrics, TextMeasure};

pub use curve::{Point, bezier_path, flow_path, ribbon_path};
pub use enrich::clean_id;
pub use error::SankeyError;
pub use types::{
    FlowPath, LabelSize, LabelSpace, LayoutMetrics, SankeyFlow, SankeyGraph, SankeyNode, Scale,
};

use scale::Canvas;

/// A fully resolved diagram: logical and pixel coordinates for every node,
/// stacking offsets and outlines for every flow, plus the aggregate metrics.
#[derive(Debug, Clone)]
pub struct Layout {
    pub id: String,
    graph: SankeyGraph,
    pub metrics: LayoutMetrics,
}

/// Lays out `flows` with labels measured by the configured text metrics.
pub fn compute_layout(flows: &[FlowSpec], config: &SankeyConfig) -> Result<Layout, SankeyError> {
    if config.fast_text_metrics {
        compute_layout_with(flows, config, &CharWidthMetrics)
    } else {
        compute_layout_with(flows, config, &FontMetrics::new(&config.font_family))
    }
}

pub fn compute_layout_with(
    flows: &[FlowSpec],
    config: &SankeyConfig,
    measurer: &dyn TextMeasure,
) -> Result<Layout, SankeyError> {
    let mut graph = enrich::enrich(flows, config);
    let max_column = columns::assign_columns(&mut graph)?;

    let placed_height = vertical::place_nodes(&mut graph, max_column);
    let padding_unit = vertical::padding_unit(placed_height, config.height, config.padding);
    let content_height = vertical::add_padding(&mut graph, padding_unit, max_column);

    ordering::order_flows(&mut graph);

    labels::measure_labels(&mut graph, measurer, config.fontsize, config.label_padding);
    let label_space = labels::reserve_label_space(&mut graph, max_column);

    let canvas = Canvas {
        width: config.width,
        height: config.height,
        margin: config.margin,
    };
    let scale = scale::scale_nodes(&mut graph, &canvas, max_column, content_height, &label_space);

    let mut layout = Layout {
        id: config.svg_id(),
        graph,
        metrics: LayoutMetrics {
            max_column,
            content_height,
            padding_unit,
            label_space,
            scale,
            width: config.width,
            height: config.height,
            font_size: config.fontsize,
            label_padding: config.label_padding,
        },
    };
    layout.refresh_paths();
    debug!(
        nodes = layout.graph.nodes.len(),
        flows = layout.graph.flows.len(),
        "layout complete"
    );
    Ok(layout)
}

impl Layout {
    pub fn nodes(&self) -> &[SankeyNode] {
        &self.graph.nodes
    }

    pub fn flows(&self) -> &[SankeyFlow] {
        &self.graph.flows
    }

    pub fn graph(&self) -> &SankeyGraph {
        &self.graph
    }

    pub fn node(&self, id: &str) -> Option<&SankeyNode> {
        self.graph.node(id)
    }

    /// Flows between `from` and `to`, in input order.
    pub fn flows_between<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> impl Iterator<Item = &'a SankeyFlow> + 'a {
        self.graph
            .flows
            .iter()
            .filter(move |flow| flow.from == from && flow.to == to)
    }

    fn compute_flow_path(&self, flow_idx: usize) -> String {
        let flow = &self.graph.flows[flow_idx];
        flow_path(
            flow,
            &self.graph.nodes[flow.from_idx],
            &self.graph.nodes[flow.to_idx],
            self.metrics.scale,
        )
    }

    fn refresh_paths(&mut self) {
        for flow_idx in 0..self.graph.flows.len() {
            let path = self.compute_flow_path(flow_idx);
            self.graph.flows[flow_idx].path = path;
        }
    }

    /// Moves a node to a new pixel position and recomputes the outline of
    /// every flow touching it (incoming first, then outgoing). Columns,
    /// logical y and stacking offsets are left as they are.
    pub fn reposition(
        &mut self,
        node_id: &str,
        position: (f32, f32),
    ) -> Result<Vec<FlowPath>, SankeyError> {
        let node_idx = self
            .graph
            .node_index(node_id)
            .ok_or_else(|| SankeyError::UnknownNode(node_id.to_string()))?;

        let node = &mut self.graph.nodes[node_idx];
        node.pixel_x = position.0;
        node.pixel_y = position.1;
        let incident: Vec<usize> = node
            .incoming
            .iter()
            .chain(node.outgoing.iter())
            .copied()
            .collect();

        let mut updated = Vec::with_capacity(incident.len());
        for flow_idx in incident {
            let path = self.compute_flow_path(flow_idx);
            let flow = &mut self.graph.flows[flow_idx];
            flow.path = path.clone();
            updated.push(FlowPath {
                index: flow_idx,
                id: flow.id_clean.clone(),
                path,
            });
        }
        Ok(updated)
    }

    /// Top-left corner of a node's label box in pixel space.
    pub fn label_origin(&self, node: &SankeyNode) -> (f32, f32) {
        let label = node.label_size;
        let y = node.pixel_y + node.pixel_size / 2.0 - label.height / 2.0
            - self.metrics.font_size * 0.3;
        let x = match node.anchor() {
            crate::ir::LabelAnchor::Left => node.pixel_x - label.width,
            crate::ir::LabelAnchor::Right => node.pixel_x + node.width,
            crate::ir::LabelAnchor::Center => node.pixel_x + node.width / 2.0 - label.width / 2.0,
        };
        (x, y)
    }
}
