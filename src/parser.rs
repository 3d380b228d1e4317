use crate::config::SankeyConfig;
use crate::ir::{FlowSpec, FlowValue, TextSpec};
use anyhow::{Result, anyhow, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^sankey(-beta)?\s*$").unwrap());
static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());

/// A diagram as read from disk: the flows plus any config carried inline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SankeyDocument {
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    #[serde(flatten)]
    pub config: SankeyConfig,
}

/// Parses either a JSON/JSON5 document (`{"flows": [...], ...config}`) or a
/// Mermaid `sankey-beta` body.
pub fn parse_sankey(input: &str) -> Result<SankeyDocument> {
    if skip_leading_comments(input).starts_with('{') {
        parse_document(input.trim_start())
    } else {
        parse_sankey_diagram(input)
    }
}

/// Strips the `//` and `/* */` comments a JSON5 document may open with.
fn skip_leading_comments(input: &str) -> &str {
    let mut rest = input.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| &after[end + 1..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |end| &after[end + 2..]);
        } else {
            return rest;
        }
        rest = rest.trim_start();
    }
}

fn parse_document(input: &str) -> Result<SankeyDocument> {
    match serde_json::from_str::<SankeyDocument>(input) {
        Ok(doc) => Ok(doc),
        Err(json_err) => json5::from_str::<SankeyDocument>(input)
            .map_err(|err| anyhow!("invalid sankey document: {json_err}; as JSON5: {err}")),
    }
}

fn parse_sankey_diagram(input: &str) -> Result<SankeyDocument> {
    let mut doc = SankeyDocument::default();
    let mut seen_header = false;

    for (line_no, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(line) {
            if let Some(json_str) = caps.get(1).map(|m| m.as_str()) {
                apply_init_config(&mut doc.config, json_str)?;
            }
            continue;
        }
        if line.starts_with("%%") {
            continue;
        }
        if !seen_header {
            if HEADER_RE.is_match(line) {
                seen_header = true;
                continue;
            }
            bail!("expected `sankey-beta` header, found {line:?}");
        }

        let fields = split_csv_line(line)
            .map_err(|err| anyhow!("line {}: {err}", line_no + 1))?;
        let [from, to, value]: [String; 3] = fields.try_into().map_err(|fields: Vec<String>| {
            anyhow!(
                "line {}: expected `source,target,value`, found {} field(s)",
                line_no + 1,
                fields.len()
            )
        })?;
        if from.is_empty() || to.is_empty() {
            bail!("line {}: empty node name", line_no + 1);
        }
        doc.flows.push(FlowSpec {
            from,
            to,
            value: Some(parse_value(&value)),
            render: None,
            style: None,
            class_name: None,
            tooltip: TextSpec::Auto,
        });
    }

    if !seen_header {
        bail!("no sankey diagram found in input");
    }
    Ok(doc)
}

/// Layers the `sankey` section of a Mermaid `%%{init: ...}%%` directive
/// over `config`.
fn apply_init_config(config: &mut SankeyConfig, json_str: &str) -> Result<()> {
    let value = match serde_json::from_str::<serde_json::Value>(json_str) {
        Ok(value) => value,
        Err(_) => json5::from_str::<serde_json::Value>(json_str)?,
    };
    let Some(sankey) = value.get("sankey").and_then(|v| v.as_object()) else {
        return Ok(());
    };
    let mut merged = serde_json::to_value(ConfigOverrides::from(&*config))?;
    if let Some(target) = merged.as_object_mut() {
        for (key, val) in sankey {
            target.insert(key.clone(), val.clone());
        }
    }
    let overrides: ConfigOverrides = serde_json::from_value(merged)?;
    overrides.apply(config);
    Ok(())
}

/// The subset of [`SankeyConfig`] a Mermaid init directive may set.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOverrides {
    width: f32,
    height: f32,
    padding: f32,
    label_padding: f32,
    fontsize: f32,
    font_family: String,
}

impl From<&SankeyConfig> for ConfigOverrides {
    fn from(config: &SankeyConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            padding: config.padding,
            label_padding: config.label_padding,
            fontsize: config.fontsize,
            font_family: config.font_family.clone(),
        }
    }
}

impl ConfigOverrides {
    fn apply(self, config: &mut SankeyConfig) {
        config.width = self.width;
        config.height = self.height;
        config.padding = self.padding;
        config.label_padding = self.label_padding;
        config.fontsize = self.fontsize;
        config.font_family = self.font_family;
    }
}

fn parse_value(raw: &str) -> FlowValue {
    match raw.trim().parse::<f64>() {
        Ok(number) => FlowValue::Number(number),
        Err(_) => FlowValue::Text(raw.to_string()),
    }
}

/// Splits one CSV row. Fields may be double-quoted, with `""` standing for a
/// literal quote; unquoted fields are trimmed.
fn split_csv_line(line: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut quoted = false;

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => current.push(ch),
            }
            continue;
        }
        match ch {
            '"' if current.trim().is_empty() && !quoted => {
                current.clear();
                in_quotes = true;
                quoted = true;
            }
            ',' => {
                fields.push(finish_field(&current, quoted));
                current.clear();
                quoted = false;
            }
            _ if quoted => {
                if !ch.is_whitespace() {
                    bail!("unexpected {ch:?} after closing quote");
                }
            }
            _ => current.push(ch),
        }
    }
    if in_quotes {
        bail!("unterminated quoted field");
    }
    fields.push(finish_field(&current, quoted));
    Ok(fields)
}

fn finish_field(raw: &str, quoted: bool) -> String {
    if quoted {
        raw.to_string()
    } else {
        raw.trim().to_string()
    }
}
