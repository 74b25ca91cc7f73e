//! SVG renderer for dagviolations plot artifacts.
//!
//! Artifacts come from `dv-viz` either as values or as JSON; styling comes
//! from a [`VizConfig`] built from a theme plus optional YAML overrides.

pub mod canvas;
pub mod color;
pub mod config;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use std::path::Path;

use config::VizConfig;
use dv_viz::BoxPlotArtifact;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render an artifact JSON to SVG string.
pub fn render_svg(artifact_json: &str, kind: &str, config: &VizConfig) -> Result<String> {
    match kind {
        "boxplot" | "box" => {
            let art: BoxPlotArtifact = serde_json::from_str(artifact_json)?;
            render_boxplot(&art, config)
        }
        other => Err(RenderError::UnknownKind(other.to_string())),
    }
}

/// Render a grouped box plot to SVG string.
pub fn render_boxplot(artifact: &BoxPlotArtifact, config: &VizConfig) -> Result<String> {
    plots::boxplot::render(artifact, config)
}

fn check_svg_path(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("svg") {
        "svg" => Ok(()),
        other => Err(RenderError::UnknownKind(format!("format: {other}"))),
    }
}

/// Render an artifact JSON to a file. Only `.svg` output is supported.
pub fn render_to_file(artifact_json: &str, kind: &str, path: &Path, config: &VizConfig) -> Result<()> {
    check_svg_path(path)?;
    let svg = render_svg(artifact_json, kind, config)?;
    output::svg::save_svg(&svg, path)
}

/// Render a box plot straight to an `.svg` file.
pub fn render_boxplot_to_file(artifact: &BoxPlotArtifact, path: &Path, config: &VizConfig) -> Result<()> {
    check_svg_path(path)?;
    let svg = render_boxplot(artifact, config)?;
    output::svg::save_svg(&svg, path)
}
