use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::{DEFAULT_NODE_WIDTH, SankeyConfig};
use crate::ir::{FlowSpec, FlowSummary, NodeSummary};

use super::types::{LabelSize, SankeyFlow, SankeyGraph, SankeyNode};

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());

/// Strips every run of non-word characters so ids are usable in CSS selectors.
pub fn clean_id(id: &str) -> String {
    NON_WORD_RE.replace_all(id, "").into_owned()
}

fn normalize_value(flow: &FlowSpec) -> f32 {
    let Some(raw) = flow.value.as_ref() else {
        return 0.0;
    };
    match raw.as_f32() {
        Some(value) if value.is_finite() && value >= 0.0 => value,
        _ => {
            warn!(from = %flow.from, to = %flow.to, value = ?raw, "malformed flow value, using 0");
            0.0
        }
    }
}

/// Builds the cross-linked graph: one node per id mentioned by any flow
/// (first-mention order), incident lists in flow input order, node sizes,
/// and resolved config, labels and tooltips.
pub(super) fn enrich(specs: &[FlowSpec], config: &SankeyConfig) -> SankeyGraph {
    let base = &config.flow_base_config;
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut ids: Vec<String> = Vec::new();
    for spec in specs {
        for id in [&spec.from, &spec.to] {
            if !index.contains_key(id) {
                index.insert(id.clone(), ids.len());
                ids.push(id.clone());
            }
        }
    }

    let mut flows: Vec<SankeyFlow> = Vec::with_capacity(specs.len());
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    for spec in specs {
        let from_idx = index[&spec.from];
        let to_idx = index[&spec.to];
        let flow_idx = flows.len();
        outgoing[from_idx].push(flow_idx);
        incoming[to_idx].push(flow_idx);
        flows.push(SankeyFlow {
            from: spec.from.clone(),
            to: spec.to.clone(),
            from_idx,
            to_idx,
            id_clean: format!("{}-{}", clean_id(&spec.from), clean_id(&spec.to)),
            value: normalize_value(spec),
            render: spec.render.or(base.render).unwrap_or_default(),
            style: spec.style.clone().or_else(|| base.style.clone()).unwrap_or_default(),
            class_name: spec.class_name.clone().or_else(|| base.class_name.clone()),
            tooltip: None,
            offset_from: 0.0,
            offset_to: 0.0,
            path: String::new(),
        });
    }

    let mut nodes: Vec<SankeyNode> = Vec::with_capacity(ids.len());
    for (idx, id) in ids.into_iter().enumerate() {
        let node_config = config.node_config_for(&id);
        let incoming_total: f32 = incoming[idx].iter().map(|&f| flows[f].value).sum();
        let outgoing_total: f32 = outgoing[idx].iter().map(|&f| flows[f].value).sum();
        let size = incoming_total.max(outgoing_total);
        let summary = NodeSummary {
            id: id.clone(),
            size,
            incoming_total,
            outgoing_total,
        };
        let label = node_config.label.text.resolve(&summary, || id.clone());
        let tooltip = node_config.tooltip.resolve(&summary, || {
            format!("{} ({})", label.as_deref().unwrap_or(""), size)
        });
        nodes.push(SankeyNode {
            id_clean: clean_id(&id),
            id,
            label,
            tooltip,
            incoming: std::mem::take(&mut incoming[idx]),
            outgoing: std::mem::take(&mut outgoing[idx]),
            width: node_config.width.unwrap_or(DEFAULT_NODE_WIDTH).max(0.0),
            pinned_column: node_config.column,
            sorting: node_config.sorting.unwrap_or(0.0),
            padding_override: node_config.paddings,
            relative_to: node_config.relative_to,
            style: node_config.style.unwrap_or_default(),
            class_name: node_config.class_name,
            size,
            x: 0,
            y: 0.0,
            label_anchor: node_config.label.position,
            label_size: LabelSize::default(),
            pixel_x: 0.0,
            pixel_y: 0.0,
            pixel_size: 0.0,
        });
    }

    for (spec, flow) in specs.iter().zip(flows.iter_mut()) {
        let summary = FlowSummary {
            from: flow.from.clone(),
            to: flow.to.clone(),
            from_label: nodes[flow.from_idx].label.clone(),
            to_label: nodes[flow.to_idx].label.clone(),
            value: flow.value,
        };
        flow.tooltip = spec.tooltip.or(&base.tooltip).resolve(&summary, || {
            format!(
                "{} \u{2192} {}: {}",
                summary.from_label.as_deref().unwrap_or(""),
                summary.to_label.as_deref().unwrap_or(""),
                summary.value
            )
        });
    }

    SankeyGraph {
        nodes,
        flows,
        index,
    }
}
