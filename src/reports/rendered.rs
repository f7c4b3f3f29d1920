use crate::Result;
use crate::metrics::YearlyReport;
use std::fs;
use std::path::{Path, PathBuf};

pub const JSON_FILE_NAME: &str = "metrics_report.json";
pub const CSV_FILE_NAME: &str = "metrics_report.csv";

/// Machine-readable renderings of a report, ready to be written out.
///
/// Rendering happens up front so a formatting failure never leaves a partial
/// set of files behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub json: String,
    pub csv: String,
}

impl RenderedReport {
    pub fn new(report: &YearlyReport) -> Result<Self> {
        Ok(Self {
            json: super::json::generate(report)?,
            csv: super::csv::generate(report)?,
        })
    }

    /// Write both files into `dir`, creating it if needed, and return their paths.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;

        let json_path = dir.join(JSON_FILE_NAME);
        fs::write(&json_path, &self.json)?;

        let csv_path = dir.join(CSV_FILE_NAME);
        fs::write(&csv_path, &self.csv)?;

        Ok(vec![json_path, csv_path])
    }
}
