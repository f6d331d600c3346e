//! End-to-end analysis of one dataset
//!
//! ```rust,ignore
//! use complaint_lens::analytics::{AnalysisRequest, Classifier, MatchMode, Pipeline};
//!
//! let classifier = Classifier::new(&categories, MatchMode::Word)?;
//! let pipeline = Pipeline::new(classifier);
//! let report = pipeline.run(&dataset, &AnalysisRequest::new("Текст обращения"))?;
//! ```

use std::time::Instant;
use tracing::{debug, info};

use super::classifier::Classifier;
use super::dates::DateNormalizer;
use super::monthly_trends::TrendAggregator;
use super::report::{AnalysisReport, ExportOptions, ReportAssembler};
use crate::error::Result;
use crate::models::{Category, Dataset};

/// Column designation and export options for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub text_column: String,
    pub date_column: Option<String>,
    pub export: ExportOptions,
}

impl AnalysisRequest {
    pub fn new(text_column: impl Into<String>) -> Self {
        Self {
            text_column: text_column.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_export(mut self, export: ExportOptions) -> Self {
        self.export = export;
        self
    }
}

/// Runs normalize, classify, aggregate and assemble over a dataset
///
/// Holds no per-run state, so one pipeline can serve any number of
/// independent runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    classifier: Classifier,
    categories: Vec<Category>,
}

impl Pipeline {
    pub fn new(classifier: Classifier) -> Self {
        let categories = classifier.categories().cloned().collect();
        Self {
            classifier,
            categories,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Analyze a dataset
    ///
    /// Both designated columns are checked before any work is done; a missing
    /// one fails with [`crate::error::Error::ColumnNotFound`].
    pub fn run(&self, dataset: &Dataset, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let started = Instant::now();
        debug!(
            records = dataset.len(),
            text_column = %request.text_column,
            date_column = ?request.date_column,
            "Starting analysis"
        );

        dataset.column_index(&request.text_column)?;
        if let Some(date_column) = &request.date_column {
            dataset.column_index(date_column)?;
        }

        let dates = DateNormalizer::normalize(dataset, request.date_column.as_deref())?;
        let classification = self.classifier.classify(dataset, &request.text_column)?;
        let trends = TrendAggregator::aggregate(&dates, &classification);

        let report = ReportAssembler::assemble(
            dataset,
            &classification,
            &dates,
            trends,
            &self.categories,
            &request.export,
        );

        info!(
            total = report.summary.total,
            categories = report.summary.per_category.len(),
            months = report.trends.as_ref().map_or(0, |t| t.rows.len()),
            date_warnings = report.warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(report)
    }
}
