//! Unified error handling for the complaint-lens crate
//!
//! Every fallible operation in the library returns [`Result`], whose error
//! side is the single [`Error`] enum below. Errors are fatal for the current
//! invocation; per-record problems (unparsable dates) are not errors and are
//! reported as [`crate::analytics::DateParseWarning`] instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use complaint_lens::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Schema => eprintln!("Check the column names: {}", err.localized_desc()),
//!         _ => eprintln!("Fatal error: {err}"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Classification of errors for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Reading or decoding the input dataset
    Input,
    /// The dataset does not have the shape the caller asked for
    Schema,
    /// Configuration and category definition errors
    Config,
    /// Writing export artifacts and reports
    Output,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get localized description for the category
    pub fn localized_desc(&self) -> String {
        match self {
            Self::Input => crate::i18n::t!("errors.category.input").to_string(),
            Self::Schema => crate::i18n::t!("errors.category.schema").to_string(),
            Self::Config => crate::i18n::t!("errors.category.config").to_string(),
            Self::Output => crate::i18n::t!("errors.category.output").to_string(),
            Self::Other => crate::i18n::t!("errors.category.other").to_string(),
        }
    }
}

/// Unified error type for the complaint-lens crate
#[derive(Error, Debug)]
pub enum Error {
    /// A designated text or date column is missing from the dataset
    #[error("Column not found: '{column}' (available: {})", .available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// Category definition rejected at construction time
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// Input file type the loader cannot read
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// Workbook without any worksheet
    #[error("Workbook contains no worksheets")]
    EmptyWorkbook,

    /// Requested worksheet does not exist
    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    /// Spreadsheet reading errors
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Spreadsheet writing errors
    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Report template errors
    #[error("Template error: {0}")]
    Template(String),

    /// Keyword pattern compilation errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a column-not-found error from the missing name and the dataset schema
    pub fn column_not_found(column: impl Into<String>, available: &[String]) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
            available: available.to_vec(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ColumnNotFound { .. } | Self::SheetNotFound(_) | Self::EmptyWorkbook => {
                ErrorCategory::Schema
            }
            Self::UnsupportedFormat(_) | Self::Spreadsheet(_) | Self::Csv(_) => {
                ErrorCategory::Input
            }
            Self::InvalidCategory(_) | Self::Regex(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Xlsx(_) | Self::Json(_) | Self::Template(_) => ErrorCategory::Output,
            Self::Io(_) => ErrorCategory::Other,
        }
    }

    /// Get localized description for user-facing messages
    pub fn localized_desc(&self) -> String {
        match self {
            Self::ColumnNotFound { column, .. } => {
                crate::i18n::t!("errors.column_not_found", column = column).to_string()
            }
            Self::InvalidCategory(msg) => {
                crate::i18n::t!("errors.invalid_category", detail = msg).to_string()
            }
            Self::UnsupportedFormat(ext) => {
                crate::i18n::t!("errors.unsupported_format", format = ext).to_string()
            }
            Self::EmptyWorkbook => crate::i18n::t!("errors.empty_workbook").to_string(),
            Self::SheetNotFound(name) => {
                crate::i18n::t!("errors.sheet_not_found", sheet = name).to_string()
            }
            other => format!("{}: {other}", other.category().localized_desc()),
        }
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(err.to_string())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
