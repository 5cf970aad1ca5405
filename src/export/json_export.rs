use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::DocumentReport;
use crate::export::Exporter;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, report: &DocumentReport) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("report.json");
        let data = serde_json::to_string_pretty(report)?;
        fs::write(path, data)?;
        Ok(())
    }
}
