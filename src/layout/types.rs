use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::ir::{LabelAnchor, RelativePosition, RenderMode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LabelSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct SankeyNode {
    pub id: String,
    pub id_clean: String,
    pub label: Option<String>,
    pub tooltip: Option<String>,
    /// Indices into [`SankeyGraph::flows`], in input order.
    pub incoming: Vec<usize>,
    pub outgoing: Vec<usize>,
    pub width: f32,
    pub pinned_column: Option<usize>,
    pub sorting: f32,
    pub padding_override: Option<f32>,
    pub relative_to: Option<RelativePosition>,
    pub style: BTreeMap<String, String>,
    pub class_name: Option<String>,
    /// max(sum of incoming values, sum of outgoing values)
    pub size: f32,
    pub x: usize,
    pub y: f32,
    /// Declared anchor; filled in with the column default by label space reservation.
    pub label_anchor: Option<LabelAnchor>,
    pub label_size: LabelSize,
    pub pixel_x: f32,
    pub pixel_y: f32,
    pub pixel_size: f32,
}

impl SankeyNode {
    pub fn anchor(&self) -> LabelAnchor {
        self.label_anchor.unwrap_or(LabelAnchor::Center)
    }

    pub fn is_sink(&self) -> bool {
        self.outgoing.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SankeyFlow {
    pub from: String,
    pub to: String,
    pub from_idx: usize,
    pub to_idx: usize,
    pub id_clean: String,
    pub value: f32,
    pub render: RenderMode,
    pub style: BTreeMap<String, String>,
    pub class_name: Option<String>,
    pub tooltip: Option<String>,
    pub offset_from: f32,
    pub offset_to: f32,
    /// Closed SVG outline in pixel space.
    pub path: String,
}

/// Cross-linked node/flow graph shared by every layout pass.
#[derive(Debug, Clone, Default)]
pub struct SankeyGraph {
    pub nodes: Vec<SankeyNode>,
    pub flows: Vec<SankeyFlow>,
    pub(crate) index: HashMap<String, usize>,
}

impl SankeyGraph {
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&SankeyNode> {
        self.node_index(id).map(|idx| &self.nodes[idx])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSpace {
    pub left: f32,
    pub right: f32,
    /// Widest node per column, indexed by column.
    pub column_widths: Vec<f32>,
}

impl LabelSpace {
    pub fn column_width(&self, column: usize) -> f32 {
        self.column_widths.get(column).copied().unwrap_or(0.0)
    }
}

/// Aggregate numbers a renderer needs to place labels and handle drags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    pub max_column: usize,
    pub content_height: f32,
    pub padding_unit: f32,
    pub label_space: LabelSpace,
    pub scale: Scale,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub label_padding: f32,
}

/// Path data recomputed for one flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPath {
    pub index: usize,
    pub id: String,
    pub path: String,
}
