use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// Symmetric cubic Bézier outline.
    #[default]
    #[serde(rename = "b", alias = "bezier")]
    Bezier,
    /// Sampled centerline offset along its normal (Tiller–Hanson).
    #[serde(rename = "th", alias = "ribbon")]
    Ribbon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAnchor {
    Left,
    Right,
    Center,
}

impl LabelAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

/// Places a node at `target.y + fraction_of_target * target.size + fraction_of_self * size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativePosition {
    pub id: String,
    #[serde(default, alias = "y1")]
    pub fraction_of_target: f32,
    #[serde(default, alias = "y2")]
    pub fraction_of_self: f32,
}

/// Raw flow magnitude as it appears in input documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlowValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FlowValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            FlowValue::Number(val) => Some(*val as f32),
            FlowValue::Text(val) => val.trim().parse::<f32>().ok(),
            FlowValue::Other(_) => None,
        }
    }
}

impl From<f64> for FlowValue {
    fn from(value: f64) -> Self {
        FlowValue::Number(value)
    }
}

/// Snapshot of an enriched node handed to computed label/tooltip text.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSummary {
    pub id: String,
    pub size: f32,
    pub incoming_total: f32,
    pub outgoing_total: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowSummary {
    pub from: String,
    pub to: String,
    pub from_label: Option<String>,
    pub to_label: Option<String>,
    pub value: f32,
}

pub type TextFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Text that is either absent, suppressed, literal, or computed from the
/// enriched item. Resolved exactly once, during enrichment.
pub enum TextSpec<S> {
    /// Not configured: the caller's default applies.
    Auto,
    /// Explicit `null`: no text at all.
    Hidden,
    Literal(String),
    Computed(TextFn<S>),
}

impl<S> TextSpec<S> {
    pub fn computed(f: impl Fn(&S) -> String + Send + Sync + 'static) -> Self {
        TextSpec::Computed(Arc::new(f))
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, TextSpec::Auto)
    }

    /// `self` unless it is `Auto`, in which case `base`.
    pub fn or(&self, base: &TextSpec<S>) -> TextSpec<S> {
        if self.is_auto() {
            base.clone()
        } else {
            self.clone()
        }
    }

    pub fn resolve(&self, subject: &S, default: impl FnOnce() -> String) -> Option<String> {
        match self {
            TextSpec::Auto => Some(default()),
            TextSpec::Hidden => None,
            TextSpec::Literal(text) if text.is_empty() => Some(default()),
            TextSpec::Literal(text) => Some(text.clone()),
            TextSpec::Computed(f) => Some(f(subject)),
        }
    }
}

impl<S> Default for TextSpec<S> {
    fn default() -> Self {
        TextSpec::Auto
    }
}

impl<S> Clone for TextSpec<S> {
    fn clone(&self) -> Self {
        match self {
            TextSpec::Auto => TextSpec::Auto,
            TextSpec::Hidden => TextSpec::Hidden,
            TextSpec::Literal(text) => TextSpec::Literal(text.clone()),
            TextSpec::Computed(f) => TextSpec::Computed(Arc::clone(f)),
        }
    }
}

impl<S> fmt::Debug for TextSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSpec::Auto => f.write_str("Auto"),
            TextSpec::Hidden => f.write_str("Hidden"),
            TextSpec::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            TextSpec::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<S> From<&str> for TextSpec<S> {
    fn from(text: &str) -> Self {
        TextSpec::Literal(text.to_string())
    }
}

// `null` -> Hidden, string -> Literal; a missing field falls back to
// `Default` (Auto) through `#[serde(default)]`.
impl<'de, S> Deserialize<'de> for TextSpec<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TextVisitor<S>(PhantomData<S>);

        impl<'de, S> Visitor<'de> for TextVisitor<S> {
            type Value = TextSpec<S>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or null")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(TextSpec::Literal(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(TextSpec::Literal(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(TextSpec::Hidden)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(TextSpec::Hidden)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                d.deserialize_any(self)
            }
        }

        deserializer.deserialize_any(TextVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelConfig {
    pub text: TextSpec<NodeSummary>,
    #[serde(alias = "anchor")]
    pub position: Option<LabelAnchor>,
}

/// Per-node options. Every field is optional so a base config and a
/// per-id override can be layered with [`NodeConfig::merged`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeConfig {
    pub width: Option<f32>,
    pub column: Option<usize>,
    #[serde(alias = "sortingKey")]
    pub sorting: Option<f32>,
    #[serde(alias = "paddingOverride")]
    pub paddings: Option<f32>,
    pub relative_to: Option<RelativePosition>,
    pub label: LabelConfig,
    pub tooltip: TextSpec<NodeSummary>,
    pub style: Option<BTreeMap<String, String>>,
    pub class_name: Option<String>,
}

impl NodeConfig {
    /// Field-by-field merge; `over` wins wherever it is set.
    pub fn merged(&self, over: &NodeConfig) -> NodeConfig {
        NodeConfig {
            width: over.width.or(self.width),
            column: over.column.or(self.column),
            sorting: over.sorting.or(self.sorting),
            paddings: over.paddings.or(self.paddings),
            relative_to: over.relative_to.clone().or_else(|| self.relative_to.clone()),
            label: LabelConfig {
                text: over.label.text.or(&self.label.text),
                position: over.label.position.or(self.label.position),
            },
            tooltip: over.tooltip.or(&self.tooltip),
            style: over.style.clone().or_else(|| self.style.clone()),
            class_name: over.class_name.clone().or_else(|| self.class_name.clone()),
        }
    }
}

/// Defaults layered under every flow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowBaseConfig {
    pub render: Option<RenderMode>,
    pub style: Option<BTreeMap<String, String>>,
    pub class_name: Option<String>,
    pub tooltip: TextSpec<FlowSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub value: Option<FlowValue>,
    #[serde(default)]
    pub render: Option<RenderMode>,
    #[serde(default)]
    pub style: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub tooltip: TextSpec<FlowSummary>,
}

impl FlowSpec {
    pub fn new(from: &str, to: &str, value: f64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            value: Some(FlowValue::Number(value)),
            render: None,
            style: None,
            class_name: None,
            tooltip: TextSpec::Auto,
        }
    }

    pub fn with_render(mut self, render: RenderMode) -> Self {
        self.render = Some(render);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_value_parses_numbers_and_numeric_strings() {
        assert_eq!(FlowValue::Number(3.5).as_f32(), Some(3.5));
        assert_eq!(FlowValue::Text(" 12 ".to_string()).as_f32(), Some(12.0));
        assert_eq!(FlowValue::Text("abc".to_string()).as_f32(), None);
        assert_eq!(FlowValue::Other(serde_json::Value::Bool(true)).as_f32(), None);
    }

    #[test]
    fn flow_spec_deserializes_render_aliases() {
        let flow: FlowSpec =
            serde_json::from_str(r#"{"from":"A","to":"B","value":"7","render":"th"}"#).unwrap();
        assert_eq!(flow.render, Some(RenderMode::Ribbon));
        assert_eq!(flow.value.and_then(|v| v.as_f32()), Some(7.0));

        let flow: FlowSpec =
            serde_json::from_str(r#"{"from":"A","to":"B","render":"bezier"}"#).unwrap();
        assert_eq!(flow.render, Some(RenderMode::Bezier));
        assert!(flow.value.is_none());
    }

    #[test]
    fn text_spec_distinguishes_null_from_missing() {
        let cfg: NodeConfig = serde_json::from_str(r#"{"label":{"text":null}}"#).unwrap();
        assert!(matches!(cfg.label.text, TextSpec::Hidden));
        let cfg: NodeConfig = serde_json::from_str(r#"{"label":{"position":"left"}}"#).unwrap();
        assert!(cfg.label.text.is_auto());
        assert_eq!(cfg.label.position, Some(LabelAnchor::Left));
    }

    #[test]
    fn merge_prefers_override_fields() {
        let base: NodeConfig =
            serde_json::from_str(r#"{"width":20,"label":{"text":"base","position":"right"}}"#)
                .unwrap();
        let over: NodeConfig =
            serde_json::from_str(r#"{"column":2,"label":{"text":"mine"}}"#).unwrap();
        let merged = base.merged(&over);
        assert_eq!(merged.width, Some(20.0));
        assert_eq!(merged.column, Some(2));
        assert_eq!(merged.label.position, Some(LabelAnchor::Right));
        assert!(matches!(merged.label.text, TextSpec::Literal(ref t) if t == "mine"));
    }

    #[test]
    fn relative_position_accepts_short_keys() {
        let rel: RelativePosition =
            serde_json::from_str(r#"{"id":"A","y1":0.5,"y2":-0.5}"#).unwrap();
        assert_eq!(rel.fraction_of_target, 0.5);
        assert_eq!(rel.fraction_of_self, -0.5);
    }

    #[test]
    fn computed_text_sees_the_subject() {
        let spec: TextSpec<NodeSummary> = TextSpec::computed(|n: &NodeSummary| format!("{}={}", n.id, n.size));
        let summary = NodeSummary {
            id: "A".to_string(),
            size: 3.0,
            incoming_total: 0.0,
            outgoing_total: 3.0,
        };
        assert_eq!(spec.resolve(&summary, || "x".to_string()), Some("A=3".to_string()));
        assert_eq!(TextSpec::<NodeSummary>::Hidden.resolve(&summary, || "x".to_string()), None);
    }
}
