use crate::config::{SankeyConfig, load_config};
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_sankey;
use crate::render::{render_svg, write_output_svg};
use crate::theme::Theme;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "sankey", version, about = "Sankey diagram layout and SVG renderer")]
pub struct Args {
    /// Input file (.json, .json5, .mmd or .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON/JSON5 file; replaces any config carried by the input
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Color theme
    #[arg(short = 't', long = "theme", value_enum, default_value = "classic")]
    pub theme: ThemeChoice,

    /// Also write the resolved layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChoice {
    Classic,
    Modern,
}

impl ThemeChoice {
    fn theme(self) -> Theme {
        match self {
            ThemeChoice::Classic => Theme::classic(),
            ThemeChoice::Modern => Theme::modern(),
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let file_config = match args.config.as_deref() {
        Some(path) => Some(load_config(Some(path))?),
        None => None,
    };

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let diagrams = if is_markdown {
        extract_mermaid_blocks(&input)
    } else {
        vec![input]
    };

    if diagrams.is_empty() {
        return Err(anyhow::anyhow!("No sankey diagrams found in input"));
    }

    let outputs = if diagrams.len() == 1 {
        vec![args.output.clone()]
    } else {
        resolve_multi_outputs(args.output.as_deref(), args.output_format, diagrams.len())?
            .into_iter()
            .map(Some)
            .collect()
    };

    for (idx, diagram) in diagrams.iter().enumerate() {
        let doc = parse_sankey(diagram)?;
        let config = resolve_config(doc.config, file_config.as_ref(), &args);
        let theme = Theme {
            font_family: config.font_family.clone(),
            ..args.theme.theme()
        };
        debug!(flows = doc.flows.len(), width = config.width, height = config.height, "parsed diagram");

        let layout = compute_layout(&doc.flows, &config)?;
        if let Some(dump_path) = args.dump_layout.as_deref() {
            let dump_path = if diagrams.len() == 1 {
                dump_path.to_path_buf()
            } else {
                numbered_path(dump_path, idx, "json")
            };
            write_layout_dump(&dump_path, &layout)?;
        }

        let svg = render_svg(&layout, &theme);
        match args.output_format {
            OutputFormat::Svg => {
                write_output_svg(&svg, outputs[idx].as_deref())?;
            }
            OutputFormat::Png => {
                let output = ensure_output(&outputs[idx], "png")?;
                write_png(&svg, &output, &config, &theme)?;
            }
        }
        info!(diagram = idx + 1, nodes = layout.nodes().len(), "rendered");
    }

    Ok(())
}

/// Document config, replaced by the config file when one is given, with the
/// command-line dimensions applied last.
fn resolve_config(document: SankeyConfig, file: Option<&SankeyConfig>, args: &Args) -> SankeyConfig {
    let mut config = file.cloned().unwrap_or(document);
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    config
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &SankeyConfig, theme: &Theme) -> Result<()> {
    crate::render::write_output_png(svg, output, config.width, config.height, theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &SankeyConfig, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

/// Fenced ```` ```mermaid ```` / `~~~mermaid` blocks whose body is a sankey
/// diagram.
fn extract_mermaid_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_mermaid_fence(trimmed) {
                in_block = true;
                fence = start_fence;
            }
            continue;
        }
        if is_fence_end(trimmed, &fence) {
            in_block = false;
            let block = current.join("\n");
            if is_sankey_block(&block) {
                blocks.push(block);
            }
            current.clear();
            continue;
        }
        current.push(line.to_string());
    }

    blocks
}

fn is_sankey_block(block: &str) -> bool {
    block
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("%%"))
        .map(|line| line.to_ascii_lowercase().starts_with("sankey"))
        .unwrap_or(false)
}

fn detect_mermaid_fence(line: &str) -> Option<String> {
    for fence in ["```", "~~~"] {
        if line.starts_with(fence) {
            let rest = line.trim_start_matches(&fence[..1]).trim();
            if rest.starts_with("mermaid") {
                return Some(fence.to_string());
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn numbered_path(base: &Path, idx: usize, ext: &str) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("sankey");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}-{}.{}", stem, idx + 1, ext))
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = match format {
        OutputFormat::Svg => "svg",
        OutputFormat::Png => "png",
    };
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((0..count)
            .map(|idx| base.join(format!("sankey-{}.{}", idx + 1, ext)))
            .collect());
    }
    Ok((0..count).map(|idx| numbered_path(base, idx, ext)).collect())
}
