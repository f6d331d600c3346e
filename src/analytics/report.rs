//! Report assembly
//!
//! Combines the classification, date normalization and trend results of one
//! run into an [`AnalysisReport`]: KPI summary, per-category example listings,
//! optional monthly trend table and per-category export tables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::classifier::{Classification, LabeledSubset};
use super::dates::{DateParseWarning, NormalizedDates};
use super::monthly_trends::{serialize_shares, CategoryShare, TrendTable};
use crate::models::{unique_headers, CellValue, Category, Dataset};

/// Maximum number of example records listed per category
pub const EXAMPLE_LIMIT: usize = 10;

/// Excel's limit on worksheet name length
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters Excel rejects in worksheet names
const FORBIDDEN_SHEET_CHARS: &[char] = &['/', '\\', '?', '*', ':', '[', ']'];

/// Names of the derived date columns appended to exports
const DERIVED_DATE_COLUMNS: [&str; 3] = ["date", "year", "month"];

/// Options controlling export tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Append the derived `date`, `year` and `month` columns
    #[serde(default)]
    pub include_derived_dates: bool,
}

/// Headline numbers: total records and per-category counts and shares
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total: usize,
    #[serde(serialize_with = "serialize_shares")]
    pub per_category: Vec<CategoryShare>,
}

impl KpiSummary {
    pub fn from_classification(classification: &Classification) -> Self {
        let total = classification.total();
        let per_category = classification
            .subsets()
            .iter()
            .map(|subset| CategoryShare::new(subset.category(), subset.len(), total))
            .collect();

        Self {
            total,
            per_category,
        }
    }

    pub fn share(&self, category: &str) -> Option<&CategoryShare> {
        self.per_category.iter().find(|s| s.category == category)
    }
}

/// One example complaint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleRecord {
    /// Zero-based source row
    pub row: usize,
    pub date: Option<NaiveDate>,
    /// Text as written in the source, not lower-cased
    pub text: String,
}

/// First matching records of a category, in source order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleListing {
    pub category: String,
    pub label: String,
    pub examples: Vec<ExampleRecord>,
}

/// Rows of one category prepared for spreadsheet export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub category: String,
    /// Worksheet name, already valid for Excel and unique in the workbook
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub text_column: String,
    pub date_column: Option<String>,
    pub summary: KpiSummary,
    pub examples: Vec<ExampleListing>,
    pub trends: Option<TrendTable>,
    pub warnings: Vec<DateParseWarning>,
    #[serde(skip)]
    pub exports: Vec<ExportTable>,
}

impl AnalysisReport {
    /// Example listing of a category by name
    pub fn examples_for(&self, category: &str) -> Option<&ExampleListing> {
        self.examples.iter().find(|l| l.category == category)
    }

    /// Export table of a category by name
    pub fn export_for(&self, category: &str) -> Option<&ExportTable> {
        self.exports.iter().find(|t| t.category == category)
    }

    /// Localized console summary, one line per figure
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.examples.len() + 2);
        lines.push(format!(
            "{}: {}",
            crate::i18n::t!("report.total"),
            self.summary.total
        ));

        for listing in &self.examples {
            if let Some(share) = self.summary.share(&listing.category) {
                lines.push(format!(
                    "{}: {} ({:.1}%)",
                    listing.label, share.count, share.pct
                ));
            }
        }

        if let Some(trends) = &self.trends {
            if trends.undated > 0 {
                lines.push(format!(
                    "{}: {}",
                    crate::i18n::t!("report.undated"),
                    trends.undated
                ));
            }
        }

        lines
    }
}

/// Builds an [`AnalysisReport`] from the results of one run
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn assemble(
        dataset: &Dataset,
        classification: &Classification,
        dates: &NormalizedDates,
        trends: Option<TrendTable>,
        categories: &[Category],
        options: &ExportOptions,
    ) -> AnalysisReport {
        let summary = KpiSummary::from_classification(classification);

        let mut used_sheet_names = HashSet::new();
        let mut examples = Vec::with_capacity(categories.len());
        let mut exports = Vec::with_capacity(categories.len());

        for category in categories {
            let Some(subset) = classification.subset(category.name()) else {
                continue;
            };

            examples.push(Self::examples(dataset, classification, dates, category, subset));

            let sheet_name = sanitize_sheet_name(category.sheet_name(), &mut used_sheet_names);
            exports.push(Self::export_table(dataset, dates, category, subset, sheet_name, options));
        }

        AnalysisReport {
            text_column: classification.texts().column().to_string(),
            date_column: dates.column().map(str::to_string),
            summary,
            examples,
            trends,
            warnings: dates.warnings().to_vec(),
            exports,
        }
    }

    fn examples(
        dataset: &Dataset,
        classification: &Classification,
        dates: &NormalizedDates,
        category: &Category,
        subset: &LabeledSubset,
    ) -> ExampleListing {
        let text_index = dataset
            .column_index(classification.texts().column())
            .ok();

        let examples = subset
            .rows(dataset)
            .take(EXAMPLE_LIMIT)
            .map(|(row, cells)| ExampleRecord {
                row,
                date: dates.get(row).date,
                text: text_index
                    .and_then(|i| cells.get(i))
                    .and_then(CellValue::as_text)
                    .map(|t| t.into_owned())
                    .unwrap_or_default(),
            })
            .collect();

        ExampleListing {
            category: category.name().to_string(),
            label: category.label().to_string(),
            examples,
        }
    }

    fn export_table(
        dataset: &Dataset,
        dates: &NormalizedDates,
        category: &Category,
        subset: &LabeledSubset,
        sheet_name: String,
        options: &ExportOptions,
    ) -> ExportTable {
        let derived = options.include_derived_dates;

        let columns = if derived {
            unique_headers(
                dataset
                    .columns()
                    .iter()
                    .cloned()
                    .chain(DERIVED_DATE_COLUMNS.iter().map(|c| c.to_string()))
                    .map(Some)
                    .collect(),
            )
        } else {
            dataset.columns().to_vec()
        };

        let rows = subset
            .rows(dataset)
            .map(|(row, cells)| {
                let mut out = cells.to_vec();
                if derived {
                    let date = dates.get(row);
                    out.push(
                        date.date
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                            .map(CellValue::DateTime)
                            .unwrap_or_default(),
                    );
                    out.push(date.year.map(|y| CellValue::Int(i64::from(y))).unwrap_or_default());
                    out.push(
                        date.bucket
                            .map(|b| CellValue::Text(b.to_string()))
                            .unwrap_or_default(),
                    );
                }
                out
            })
            .collect();

        ExportTable {
            category: category.name().to_string(),
            sheet_name,
            columns,
            rows,
        }
    }
}

/// Make a worksheet name Excel accepts and that is unique within `used`
///
/// Forbidden characters become `_`, surrounding whitespace and apostrophes are
/// trimmed and the result is cut to 31 characters. Collisions (compared
/// case-insensitively, as Excel does) get a numeric suffix.
pub fn sanitize_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let base = if cleaned.is_empty() { "Sheet" } else { cleaned };
    let base: String = base.chars().take(MAX_SHEET_NAME_LEN).collect();

    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!("_{n}");
        let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
        candidate = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }

    used.insert(candidate.to_lowercase());
    candidate
}
