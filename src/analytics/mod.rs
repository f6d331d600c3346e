//! Complaint analytics: keyword classification, date bucketing, monthly
//! trends and report assembly

pub mod classifier;
pub mod dates;
pub mod matcher;
pub mod monthly_trends;
pub mod pipeline;
pub mod report;

pub use classifier::{Classification, Classifier, LabeledSubset, NormalizedTexts};
pub use dates::{
    DateNormalizer, DateParseWarning, MonthBucket, NormalizedDate, NormalizedDates,
};
pub use matcher::{KeywordMatcher, MatchMode};
pub use monthly_trends::{
    monthly_counts, percentage_share, CategoryShare, MonthlyCount, MonthlySeries, TrendAggregator,
    TrendRow, TrendTable,
};
pub use pipeline::{AnalysisRequest, Pipeline};
pub use report::{
    sanitize_sheet_name, AnalysisReport, ExampleListing, ExampleRecord, ExportOptions,
    ExportTable, KpiSummary, ReportAssembler, EXAMPLE_LIMIT,
};
