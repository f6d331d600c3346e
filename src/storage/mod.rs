//! Dataset loading and report output
//!
//! Input files are dispatched on their extension to the spreadsheet reader
//! ([`xlsx`]) or the delimited text reader ([`csv`]). Results are written as
//! an xlsx export, a Markdown report ([`markdown`]) or JSON.

pub mod csv;
pub mod markdown;
pub mod xlsx;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

use crate::analytics::AnalysisReport;
use crate::error::{Error, Result};
use crate::models::Dataset;

pub use markdown::ReportWriter;
pub use xlsx::{
    export_workbook, list_sheets, read_all_sheets_bytes, read_workbook, read_workbook_bytes,
    save_workbook,
};

/// Supported input file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Spreadsheet,
    Delimited,
}

impl InputFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Spreadsheet),
            "csv" | "tsv" | "txt" => Ok(Self::Delimited),
            "" => Err(Error::UnsupportedFormat(path.display().to_string())),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Load a dataset from a spreadsheet or delimited text file
///
/// `sheet` selects a worksheet by name and is ignored for text files.
pub fn load_dataset(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    match InputFormat::from_path(path)? {
        InputFormat::Spreadsheet => read_workbook(path, sheet),
        InputFormat::Delimited => {
            if let Some(sheet) = sheet {
                debug!(sheet = %sheet, "Sheet name ignored for delimited input");
            }
            csv::read_csv(path)
        }
    }
}

/// Write the report as pretty-printed JSON
pub fn save_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    debug!(path = %path.display(), "Saved JSON report");
    Ok(())
}
