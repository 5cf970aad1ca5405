use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{DocumentReport, DocumentSummary, EmptySpaceResult, PageOutcome};
use crate::export::Exporter;

const SEPARATOR_WIDTH: usize = 40;

/// Writes the plain-text report to `report.txt`.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for TextExporter {
    fn export(&self, report: &DocumentReport) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("report.txt");
        fs::write(path, format_report(report))?;
        Ok(())
    }
}

/// Text block for one analyzed page.
pub fn format_result(result: &EmptySpaceResult) -> String {
    if result.is_empty_page() {
        return format!(
            "Page {}: No content found.\n  - Top Empty Space: 100%\n  - Bottom Empty Space: 100%\n",
            result.page_number
        );
    }

    format!(
        "Page {}:\n  - Top Empty Space: {:.2}% of page height\n  - Bottom Empty Space: {:.2}% of page height\n{}\n",
        result.page_number,
        result.top_percent,
        result.bottom_percent,
        "-".repeat(SEPARATOR_WIDTH)
    )
}

pub fn format_outcome(outcome: &PageOutcome) -> String {
    match outcome {
        PageOutcome::Analyzed { result, .. } => format_result(result),
        PageOutcome::Failed {
            page_number,
            reason,
        } => format!("Page {page_number}: analysis failed: {reason}\n"),
    }
}

/// All page blocks in page order.
pub fn format_report(report: &DocumentReport) -> String {
    report.pages.iter().map(format_outcome).collect()
}

pub fn format_summary(summary: &DocumentSummary) -> String {
    let mut out = format!(
        "Summary: {} page(s) analyzed, {} empty, {} failed\n",
        summary.analyzed, summary.empty, summary.failed
    );
    if let (Some(top), Some(bottom)) = (summary.mean_top_percent, summary.mean_bottom_percent) {
        out.push_str(&format!(
            "  - Mean Top Empty Space: {top:.2}% of page height\n  - Mean Bottom Empty Space: {bottom:.2}% of page height\n"
        ));
    }
    out
}
