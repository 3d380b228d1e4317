use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub font_family: String,
    pub text_color: String,
    pub node_fill: String,
    pub node_stroke: String,
    pub flow_fill: String,
    pub flow_opacity: f32,
    pub flow_hover_opacity: f32,
    /// Stroke drawn around zero-value flows so they stay visible.
    pub zero_flow_stroke: String,
    pub label_background: String,
    pub label_background_opacity: f32,
    pub background: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            text_color: "#000000".to_string(),
            node_fill: "#777777".to_string(),
            node_stroke: "none".to_string(),
            flow_fill: "#DDDDDD".to_string(),
            flow_opacity: 0.6,
            flow_hover_opacity: 0.9,
            zero_flow_stroke: "#BBBBBB".to_string(),
            label_background: "#FFFFFF".to_string(),
            label_background_opacity: 0.6,
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            text_color: "#1C2430".to_string(),
            node_fill: "#4E6A94".to_string(),
            node_stroke: "#C7D2E5".to_string(),
            flow_fill: "#7A8AA6".to_string(),
            flow_opacity: 0.35,
            flow_hover_opacity: 0.7,
            zero_flow_stroke: "#7A8AA6".to_string(),
            label_background: "#F8FAFF".to_string(),
            label_background_opacity: 0.8,
            background: "#FFFFFF".to_string(),
        }
    }
}
