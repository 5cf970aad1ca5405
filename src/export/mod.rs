pub mod json_export;
pub mod overlay;
pub mod text_export;

use anyhow::Result;

use crate::core::model::DocumentReport;

pub use json_export::JsonExporter;
pub use overlay::{HtmlOverlay, NoopVisualizer, Visualizer};
pub use text_export::TextExporter;

pub trait Exporter {
    fn export(&self, report: &DocumentReport) -> Result<()>;
}
