//! complaint-lens - Customer complaint classification and trend analysis
//!
//! Classifies free-text complaints from a spreadsheet into keyword-defined
//! categories, buckets them by month and produces KPI summaries, example
//! listings, monthly trend tables and per-category exports.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`] - Dataset, cell values and category definitions
//! - [`analytics`] - Keyword matching, classification, dates, trends and reports
//! - [`storage`] - Spreadsheet/CSV loading and xlsx, Markdown and JSON output
//! - [`config`] - Configuration management and built-in categories
//! - [`error`] - Unified error type
//! - [`i18n`] - English and Russian report labels
//!
//! # Example
//!
//! ```no_run
//! use complaint_lens::analytics::{AnalysisRequest, Classifier, Pipeline};
//! use complaint_lens::config::Config;
//! use complaint_lens::storage;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let categories = config.build_categories()?;
//!     let classifier = Classifier::new(&categories, config.analysis.match_mode)?;
//!
//!     let dataset = storage::load_dataset(Path::new("complaints.xlsx"), None)?;
//!     let request = AnalysisRequest::new("Текст обращения").with_date_column("Дата");
//!     let report = Pipeline::new(classifier).run(&dataset, &request)?;
//!
//!     storage::save_workbook(&report.exports, Path::new("filtered.xlsx"))?;
//!     Ok(())
//! }
//! ```

// Initialize rust-i18n at crate root level
rust_i18n::i18n!("locales", fallback = "en");

pub mod analytics;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{
        AnalysisReport, AnalysisRequest, Classifier, ExportOptions, KeywordMatcher, MatchMode,
        Pipeline,
    };
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{Category, CellValue, Dataset};
}
