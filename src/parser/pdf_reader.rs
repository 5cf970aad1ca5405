use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::geometry::PageGeometry;

/// Thin wrapper over `pdfinfo` for document-level facts.
#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("not a file: {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> Result<usize> {
        let stdout = run_pdfinfo(&self.path, &[])?;
        parse_page_count(&stdout).with_context(|| {
            format!(
                "pdfinfo output did not contain a 'Pages:' line for {}",
                self.path.display()
            )
        })
    }

    /// Page sizes in points, indexed by page number - 1.
    pub fn page_sizes(&self) -> Result<Vec<PageGeometry>> {
        let count = self.page_count()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let last = count.to_string();
        let stdout = run_pdfinfo(&self.path, &["-f", "1", "-l", &last])?;
        Ok(parse_page_sizes(&stdout))
    }
}

fn run_pdfinfo(pdf_path: &Path, extra: &[&str]) -> Result<String> {
    let output = Command::new("pdfinfo")
        .args(extra)
        .arg(pdf_path)
        .output()
        .with_context(|| format!("failed to invoke pdfinfo on {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("pdfinfo failed with status {}: {}", output.status, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_page_count(stdout: &str) -> Result<usize> {
    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix("Pages:") {
            let num_str = rest.trim();
            let pages: usize = num_str.parse().with_context(|| {
                format!("failed to parse page count from 'Pages:' line: {num_str}")
            })?;
            return Ok(pages);
        }
    }
    anyhow::bail!("no 'Pages:' line")
}

/// Reads `Page    N size: W x H pts` lines emitted by `pdfinfo -f -l`.
fn parse_page_sizes(stdout: &str) -> Vec<PageGeometry> {
    stdout
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("Page")?;
            let (_, size) = rest.split_once("size:")?;
            let mut dims = size.split_whitespace();
            let width: f64 = dims.next()?.parse().ok()?;
            let _x = dims.next()?;
            let height: f64 = dims.next()?.parse().ok()?;
            Some(PageGeometry::new(width, height))
        })
        .collect()
}
