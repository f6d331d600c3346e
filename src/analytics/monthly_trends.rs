//! Monthly trend aggregation
//!
//! This module provides functionality for:
//! - Counting records per year-month bucket ([`MonthlySeries`])
//! - Joining per-category series onto the full dataset's buckets with zero fill
//! - Computing each category's percentage share of a month's total
//!
//! Records without a bucket are left out of every monthly series. Every
//! [`TrendRow`] carries a count and share for every category, so rows are
//! dense over the same bucket set.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

use super::classifier::Classification;
use super::dates::{MonthBucket, NormalizedDates};

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Chronological (bucket, count) series over the given rows
///
/// Rows whose date is absent are left out.
pub fn monthly_counts<I>(rows: I, dates: &NormalizedDates) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = usize>,
{
    MonthlySeries::from_rows(rows, dates).points()
}

/// Share of `count` in `total` as a percentage with one decimal
///
/// Defined as 0 when `total` is 0. The result is clamped into [0, 100].
pub fn percentage_share(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// (bucket, count) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub bucket: MonthBucket,
    pub count: usize,
}

/// Per-month record counts, sorted chronologically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlySeries {
    counts: BTreeMap<MonthBucket, usize>,
}

impl MonthlySeries {
    /// Count the given rows per bucket; rows without a bucket are skipped
    pub fn from_rows<I>(rows: I, dates: &NormalizedDates) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut counts = BTreeMap::new();
        for row in rows {
            if let Some(bucket) = dates.bucket(row) {
                *counts.entry(bucket).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    /// Count zero for buckets the series never saw
    pub fn count(&self, bucket: MonthBucket) -> usize {
        self.counts.get(&bucket).copied().unwrap_or(0)
    }

    /// Buckets in chronological order
    pub fn buckets(&self) -> impl Iterator<Item = MonthBucket> + '_ {
        self.counts.keys().copied()
    }

    pub fn points(&self) -> Vec<MonthlyCount> {
        self.counts
            .iter()
            .map(|(&bucket, &count)| MonthlyCount { bucket, count })
            .collect()
    }

    /// Sum over all buckets
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Count and share of one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    #[serde(skip)]
    pub category: String,
    pub count: usize,
    pub pct: f64,
}

impl CategoryShare {
    pub fn new(category: impl Into<String>, count: usize, total: usize) -> Self {
        Self {
            category: category.into(),
            count,
            pct: percentage_share(count, total),
        }
    }
}

/// Serialize shares as `{name: {count, pct}}`, keeping category order
pub(crate) fn serialize_shares<S: Serializer>(
    shares: &[CategoryShare],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(shares.len()))?;
    for share in shares {
        map.serialize_entry(&share.category, share)?;
    }
    map.end()
}

/// One month of the trend table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRow {
    pub bucket: MonthBucket,
    pub total: usize,
    #[serde(serialize_with = "serialize_shares")]
    pub per_category: Vec<CategoryShare>,
}

impl TrendRow {
    pub fn share(&self, category: &str) -> Option<&CategoryShare> {
        self.per_category.iter().find(|s| s.category == category)
    }
}

/// Monthly trend of all categories against the full dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendTable {
    /// Date column the buckets were derived from
    pub date_column: String,
    /// Records left out because their date is absent
    pub undated: usize,
    pub rows: Vec<TrendRow>,
}

impl TrendTable {
    pub fn buckets(&self) -> impl Iterator<Item = MonthBucket> + '_ {
        self.rows.iter().map(|r| r.bucket)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds [`TrendTable`]s from classification results
pub struct TrendAggregator;

impl TrendAggregator {
    /// Aggregate monthly counts and shares
    ///
    /// Returns `None` when no date column was designated.
    pub fn aggregate(
        dates: &NormalizedDates,
        classification: &Classification,
    ) -> Option<TrendTable> {
        let date_column = dates.column()?;

        let total_series = MonthlySeries::from_rows(0..classification.total(), dates);
        let category_series: Vec<(&str, MonthlySeries)> = classification
            .subsets()
            .iter()
            .map(|subset| {
                (
                    subset.category(),
                    MonthlySeries::from_rows(subset.indices().iter().copied(), dates),
                )
            })
            .collect();

        let rows = Self::join(&total_series, &category_series);

        debug!(
            months = rows.len(),
            undated = dates.undated(),
            "Monthly trend aggregated"
        );

        Some(TrendTable {
            date_column: date_column.to_string(),
            undated: dates.undated(),
            rows,
        })
    }

    /// Join category series onto the buckets of the total series
    pub fn join(total: &MonthlySeries, categories: &[(&str, MonthlySeries)]) -> Vec<TrendRow> {
        total
            .buckets()
            .map(|bucket| {
                let month_total = total.count(bucket);
                let per_category = categories
                    .iter()
                    .map(|(name, series)| {
                        CategoryShare::new(*name, series.count(bucket), month_total)
                    })
                    .collect();

                TrendRow {
                    bucket,
                    total: month_total,
                    per_category,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::classifier::Classifier;
    use crate::analytics::dates::DateNormalizer;
    use crate::analytics::matcher::MatchMode;
    use crate::models::{Category, CellValue, Dataset};

    fn bucket(s: &str) -> MonthBucket {
        s.parse().unwrap()
    }

    #[test]
    fn test_percentage_share() {
        assert_eq!(percentage_share(1, 3), 33.3);
        assert_eq!(percentage_share(2, 3), 66.7);
        assert_eq!(percentage_share(3, 3), 100.0);
        assert_eq!(percentage_share(0, 5), 0.0);
    }

    #[test]
    fn test_percentage_share_zero_total() {
        assert_eq!(percentage_share(0, 0), 0.0);
        assert_eq!(percentage_share(4, 0), 0.0);
    }

    #[test]
    fn test_join_zero_fills_sparse_categories() {
        let mut total = MonthlySeries::default();
        total.counts.insert(bucket("2024-01"), 4);
        total.counts.insert(bucket("2024-02"), 2);
        total.counts.insert(bucket("2024-03"), 5);

        let mut sparse = MonthlySeries::default();
        sparse.counts.insert(bucket("2024-02"), 1);

        let rows = TrendAggregator::join(
            &total,
            &[("wait", sparse), ("admin", MonthlySeries::default())],
        );

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].share("wait").unwrap().count, 0);
        assert_eq!(rows[0].share("wait").unwrap().pct, 0.0);
        assert_eq!(rows[1].share("wait").unwrap().count, 1);
        assert_eq!(rows[1].share("wait").unwrap().pct, 50.0);
        assert!(rows.iter().all(|r| r.per_category.len() == 2));
        assert!(rows.iter().all(|r| r.share("admin").unwrap().count == 0));
    }

    #[test]
    fn test_join_with_zero_total_bucket() {
        let mut total = MonthlySeries::default();
        total.counts.insert(bucket("2024-05"), 0);
        let rows = TrendAggregator::join(&total, &[("admin", MonthlySeries::default())]);
        assert_eq!(rows[0].total, 0);
        assert_eq!(rows[0].share("admin").unwrap().pct, 0.0);
    }

    #[test]
    fn test_aggregate_end_to_end() {
        let ds = Dataset::new(
            vec!["date".into(), "text".into()],
            vec![
                vec!["2024-02-03".into(), "касса закрыта".into()],
                vec!["2024-01-15".into(), "долго ждали".into()],
                vec!["2024-01-20".into(), "все хорошо".into()],
                vec!["потом".into(), "касса".into()],
                vec!["2024-02-28".into(), "долго в регистратуре".into()],
            ],
        );
        let categories = vec![
            Category::new("admin", "Admin", ["регистрат", "касса"]).unwrap(),
            Category::new("wait", "Wait", ["ждал", "долго"]).unwrap(),
        ];
        let classification = Classifier::new(&categories, MatchMode::Word)
            .unwrap()
            .classify(&ds, "text")
            .unwrap();
        let dates = DateNormalizer::normalize(&ds, Some("date")).unwrap();

        let table = TrendAggregator::aggregate(&dates, &classification).unwrap();
        assert_eq!(table.date_column, "date");
        assert_eq!(table.undated, 1);

        let buckets: Vec<String> = table.buckets().map(|b| b.to_string()).collect();
        assert_eq!(buckets, vec!["2024-01", "2024-02"]);

        let jan = &table.rows[0];
        assert_eq!(jan.total, 2);
        assert_eq!(jan.share("admin").unwrap().count, 0);
        assert_eq!(jan.share("wait").unwrap().count, 1);
        assert_eq!(jan.share("wait").unwrap().pct, 50.0);

        let feb = &table.rows[1];
        assert_eq!(feb.total, 2);
        assert_eq!(feb.share("admin").unwrap().count, 2);
        assert_eq!(feb.share("admin").unwrap().pct, 100.0);
        assert_eq!(feb.share("wait").unwrap().count, 1);
    }

    #[test]
    fn test_monthly_counts_skip_undated_rows() {
        let ds = Dataset::new(
            vec!["date".into()],
            vec![
                vec!["2023-12-31".into()],
                vec![CellValue::Empty],
                vec!["2023-11-02".into()],
                vec!["2023-12-01".into()],
            ],
        );
        let dates = DateNormalizer::normalize(&ds, Some("date")).unwrap();
        let counts = monthly_counts(0..ds.len(), &dates);

        assert_eq!(
            counts,
            vec![
                MonthlyCount {
                    bucket: bucket("2023-11"),
                    count: 1
                },
                MonthlyCount {
                    bucket: bucket("2023-12"),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_aggregate_skipped_without_date_column() {
        let ds = Dataset::new(vec!["text".into()], vec![vec!["касса".into()]]);
        let categories = vec![Category::new("admin", "Admin", ["касса"]).unwrap()];
        let classification = Classifier::new(&categories, MatchMode::Word)
            .unwrap()
            .classify(&ds, "text")
            .unwrap();
        let dates = DateNormalizer::normalize(&ds, None).unwrap();

        assert!(TrendAggregator::aggregate(&dates, &classification).is_none());
    }

    #[test]
    fn test_trend_row_json_shape() {
        let row = TrendRow {
            bucket: bucket("2024-03"),
            total: 4,
            per_category: vec![
                CategoryShare::new("wait", 1, 4),
                CategoryShare::new("admin", 2, 4),
            ],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"bucket":"2024-03","total":4,"perCategory":{"wait":{"count":1,"pct":25.0},"admin":{"count":2,"pct":50.0}}}"#
        );
    }
}
