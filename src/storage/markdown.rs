//! Markdown report rendering with Handlebars
//!
//! Headings come from the active locale; category labels, complaint texts and
//! numbers come from the [`AnalysisReport`].

use handlebars::{no_escape, Handlebars};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::analytics::{AnalysisReport, CategoryShare};
use crate::error::Result;
use crate::i18n::t;

/// Default report template
const DEFAULT_TEMPLATE: &str = include_str!("../../templates/report.hbs");

const TEMPLATE_NAME: &str = "report";

/// Localized headings
#[derive(Debug, Serialize)]
struct Headings {
    title: String,
    summary: String,
    total: String,
    categories: String,
    examples: String,
    no_examples: String,
    trends: String,
    month: String,
    no_trends: String,
    undated: String,
    no_date: String,
    warnings: String,
}

impl Headings {
    fn current() -> Self {
        Self {
            title: t!("report.title").to_string(),
            summary: t!("report.summary").to_string(),
            total: t!("report.total").to_string(),
            categories: t!("report.categories").to_string(),
            examples: t!("report.examples").to_string(),
            no_examples: t!("report.no_examples").to_string(),
            trends: t!("report.trends").to_string(),
            month: t!("report.month").to_string(),
            no_trends: t!("report.no_trends").to_string(),
            undated: t!("report.undated").to_string(),
            no_date: t!("report.no_date").to_string(),
            warnings: t!("report.warnings").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CategoryRow {
    label: String,
    count: usize,
    pct: String,
}

#[derive(Debug, Serialize)]
struct ExampleRow {
    row: usize,
    date: Option<String>,
    text: String,
}

#[derive(Debug, Serialize)]
struct ExampleSection {
    label: String,
    examples: Vec<ExampleRow>,
}

#[derive(Debug, Serialize)]
struct TrendSection {
    labels: Vec<String>,
    rows: Vec<TrendLine>,
    undated: usize,
}

#[derive(Debug, Serialize)]
struct TrendLine {
    bucket: String,
    total: usize,
    cells: Vec<String>,
}

/// Template data for rendering
#[derive(Debug, Serialize)]
struct ReportTemplateData {
    t: Headings,
    text_column: String,
    date_column: Option<String>,
    total: usize,
    categories: Vec<CategoryRow>,
    sections: Vec<ExampleSection>,
    trends: Option<TrendSection>,
    warnings: Vec<String>,
}

fn format_share(share: Option<&CategoryShare>) -> (usize, String) {
    share.map_or((0, "0.0".to_string()), |s| (s.count, format!("{:.1}", s.pct)))
}

impl From<&AnalysisReport> for ReportTemplateData {
    fn from(report: &AnalysisReport) -> Self {
        let categories = report
            .examples
            .iter()
            .map(|listing| {
                let (count, pct) = format_share(report.summary.share(&listing.category));
                CategoryRow {
                    label: listing.label.clone(),
                    count,
                    pct,
                }
            })
            .collect();

        let sections = report
            .examples
            .iter()
            .map(|listing| ExampleSection {
                label: listing.label.clone(),
                examples: listing
                    .examples
                    .iter()
                    .map(|e| ExampleRow {
                        row: e.row + 1,
                        date: e.date.map(|d| d.format("%Y-%m-%d").to_string()),
                        text: e.text.replace(['\r', '\n'], " "),
                    })
                    .collect(),
            })
            .collect();

        let trends = report.trends.as_ref().map(|table| TrendSection {
            labels: report.examples.iter().map(|l| l.label.clone()).collect(),
            rows: table
                .rows
                .iter()
                .map(|row| TrendLine {
                    bucket: row.bucket.to_string(),
                    total: row.total,
                    cells: report
                        .examples
                        .iter()
                        .map(|l| {
                            let (count, pct) = format_share(row.share(&l.category));
                            format!("{count} ({pct}%)")
                        })
                        .collect(),
                })
                .collect(),
            undated: table.undated,
        });

        Self {
            t: Headings::current(),
            text_column: report.text_column.clone(),
            date_column: report.date_column.clone(),
            total: report.summary.total,
            categories,
            sections,
            trends,
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Markdown writer with Handlebars template engine
pub struct ReportWriter<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> ReportWriter<'a> {
    /// Create a writer with the built-in template
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        handlebars.register_template_string(TEMPLATE_NAME, DEFAULT_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    /// Create a writer with a custom template file
    pub fn with_template(template_path: &Path) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        handlebars.register_template_file(TEMPLATE_NAME, template_path)?;
        Ok(Self { handlebars })
    }

    /// Render the report to a Markdown string
    pub fn render(&self, report: &AnalysisReport) -> Result<String> {
        let data = ReportTemplateData::from(report);
        Ok(self.handlebars.render(TEMPLATE_NAME, &data)?)
    }

    /// Render the report and write it to `path`
    pub fn save(&self, report: &AnalysisReport, path: &Path) -> Result<()> {
        let markdown = self.render(report)?;
        fs::write(path, markdown)?;
        tracing::debug!(path = %path.display(), "Saved Markdown report");
        Ok(())
    }
}
