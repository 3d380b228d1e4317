use crate::ir::RenderMode;
use crate::layout::{Layout, LayoutMetrics};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub id: String,
    pub width: f32,
    pub height: f32,
    pub metrics: LayoutMetrics,
    pub nodes: Vec<NodeDump>,
    pub flows: Vec<FlowDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub id_clean: String,
    pub label: Option<String>,
    pub column: usize,
    pub y: f32,
    pub size: f32,
    pub pixel_x: f32,
    pub pixel_y: f32,
    pub pixel_size: f32,
    pub width: f32,
    pub label_anchor: &'static str,
    pub label_width: f32,
    pub label_height: f32,
    pub label_x: f32,
    pub label_y: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDump {
    pub from: String,
    pub to: String,
    pub id_clean: String,
    pub value: f32,
    pub render: RenderMode,
    pub offset_from: f32,
    pub offset_to: f32,
    pub path: String,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes()
            .iter()
            .map(|node| {
                let (label_x, label_y) = layout.label_origin(node);
                NodeDump {
                    id: node.id.clone(),
                    id_clean: node.id_clean.clone(),
                    label: node.label.clone(),
                    column: node.x,
                    y: node.y,
                    size: node.size,
                    pixel_x: node.pixel_x,
                    pixel_y: node.pixel_y,
                    pixel_size: node.pixel_size,
                    width: node.width,
                    label_anchor: node.anchor().as_str(),
                    label_width: node.label_size.width,
                    label_height: node.label_size.height,
                    label_x,
                    label_y,
                }
            })
            .collect();

        let flows = layout
            .flows()
            .iter()
            .map(|flow| FlowDump {
                from: flow.from.clone(),
                to: flow.to.clone(),
                id_clean: flow.id_clean.clone(),
                value: flow.value,
                render: flow.render,
                offset_from: flow.offset_from,
                offset_to: flow.offset_to,
                path: flow.path.clone(),
            })
            .collect();

        LayoutDump {
            id: layout.id.clone(),
            width: layout.metrics.width,
            height: layout.metrics.height,
            metrics: layout.metrics.clone(),
            nodes,
            flows,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
