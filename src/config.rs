use crate::ir::{FlowBaseConfig, NodeConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_NODE_WIDTH: f32 = 20.0;

/// Four-sided canvas margin. Deserializes from `[top, right, bottom, left]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margin {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl From<[f32; 4]> for Margin {
    fn from([top, right, bottom, left]: [f32; 4]) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

impl From<Margin> for [f32; 4] {
    fn from(margin: Margin) -> Self {
        [margin.top, margin.right, margin.bottom, margin.left]
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SankeyConfig {
    /// Id of the generated `<svg>`; also scopes the generated CSS.
    pub id: Option<String>,
    pub width: f32,
    pub height: f32,
    /// Vertical gap between stacked nodes, in pixels.
    pub padding: f32,
    pub margin: Margin,
    pub label_padding: f32,
    /// Label font size in points.
    pub fontsize: f32,
    pub font_family: String,
    /// Measure labels with per-character width factors instead of font files.
    pub fast_text_metrics: bool,
    pub node_base_config: NodeConfig,
    pub node_config: BTreeMap<String, NodeConfig>,
    pub flow_base_config: FlowBaseConfig,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            id: None,
            width: 500.0,
            height: 500.0,
            padding: 20.0,
            margin: Margin::default(),
            label_padding: 4.0,
            fontsize: 12.0,
            font_family: "sans-serif".to_string(),
            fast_text_metrics: false,
            node_base_config: NodeConfig::default(),
            node_config: BTreeMap::new(),
            flow_base_config: FlowBaseConfig::default(),
        }
    }
}

impl SankeyConfig {
    pub fn svg_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| "sankey".to_string())
    }

    /// Base node config layered with the override for `id`, if any.
    pub fn node_config_for(&self, id: &str) -> NodeConfig {
        match self.node_config.get(id) {
            Some(over) => self.node_base_config.merged(over),
            None => self.node_base_config.clone(),
        }
    }
}

/// Reads a JSON or JSON5 config file. A missing path yields the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SankeyConfig> {
    let Some(path) = path else {
        return Ok(SankeyConfig::default());
    };

    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<SankeyConfig> {
    let config = match serde_json::from_str::<SankeyConfig>(contents) {
        Ok(config) => config,
        Err(_) => json5::from_str::<SankeyConfig>(contents)?,
    };
    Ok(config)
}
