use crate::ir::LabelAnchor;
use crate::text_metrics::TextMeasure;

use super::types::{LabelSize, LabelSpace, SankeyGraph, SankeyNode};

const PT_TO_PX: f32 = 4.0 / 3.0;
const LINE_HEIGHT_EM: f32 = 1.2;

pub(super) fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Box around a label's text: widest line by `lines * 1.2em`, plus
/// `label_padding` on every side. Unlabelled nodes get an empty box.
pub(super) fn measure_label(
    label: Option<&str>,
    measurer: &dyn TextMeasure,
    font_size_pt: f32,
    label_padding: f32,
) -> LabelSize {
    let Some(text) = label.filter(|text| !text.is_empty()) else {
        return LabelSize::default();
    };
    let font_px = font_size_pt * PT_TO_PX;
    let lines = split_lines(text);
    let text_width = lines
        .iter()
        .map(|line| measurer.text_width(line, font_px))
        .fold(0.0, f32::max);
    let text_height = lines.len() as f32 * font_px * LINE_HEIGHT_EM;
    LabelSize {
        width: text_width + 2.0 * label_padding,
        height: text_height + 2.0 * label_padding,
    }
}

pub(super) fn measure_labels(
    graph: &mut SankeyGraph,
    measurer: &dyn TextMeasure,
    font_size_pt: f32,
    label_padding: f32,
) {
    for node in &mut graph.nodes {
        node.label_size = measure_label(node.label.as_deref(), measurer, font_size_pt, label_padding);
    }
}

fn outward_space(node: &SankeyNode, anchor: LabelAnchor) -> f32 {
    match anchor {
        LabelAnchor::Center => node.label_size.width * 0.5 - node.width / 2.0,
        _ => node.label_size.width,
    }
}

/// Defaults every undeclared anchor (left in column 0, right in the last
/// column, centered elsewhere), records the widest node per column, and the
/// horizontal room the outer columns' labels need beyond their nodes.
pub(super) fn reserve_label_space(graph: &mut SankeyGraph, max_column: usize) -> LabelSpace {
    let mut space = LabelSpace {
        left: 0.0,
        right: 0.0,
        column_widths: vec![0.0; max_column + 1],
    };

    for node in &mut graph.nodes {
        let column = node.x;
        if let Some(width) = space.column_widths.get_mut(column) {
            *width = width.max(node.width);
        }

        let anchor = *node.label_anchor.get_or_insert(if column == 0 {
            LabelAnchor::Left
        } else if column == max_column {
            LabelAnchor::Right
        } else {
            LabelAnchor::Center
        });

        if column == 0 && anchor != LabelAnchor::Right {
            space.left = space.left.max(outward_space(node, anchor));
        } else if column == max_column && anchor != LabelAnchor::Left {
            space.right = space.right.max(outward_space(node, anchor));
        }
    }

    space
}
