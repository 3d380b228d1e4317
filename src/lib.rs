#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Margin, SankeyConfig, load_config};
pub use ir::{FlowSpec, FlowValue, LabelAnchor, NodeConfig, RenderMode, TextSpec};
pub use layout::{Layout, SankeyError, compute_layout, compute_layout_with};
pub use parser::{SankeyDocument, parse_sankey};
pub use render::render_svg;
pub use theme::Theme;
