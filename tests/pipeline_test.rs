//! End-to-end pipeline runs

mod common;

use common::{scenario_dataset, scenario_pipeline, DATE_COLUMN, TEXT_COLUMN};
use complaint_lens::analytics::{AnalysisRequest, MatchMode};
use complaint_lens::error::{Error, ErrorCategory};
use complaint_lens::models::Dataset;

#[test]
fn test_no_date_column_still_reports_kpis() {
    let report = scenario_pipeline(MatchMode::Word)
        .run(&scenario_dataset(), &AnalysisRequest::new(TEXT_COLUMN))
        .unwrap();

    assert!(report.trends.is_none());
    assert_eq!(report.summary.total, 5);
    assert_eq!(report.summary.share("admin").unwrap().count, 2);
    assert_eq!(report.summary.share("admin").unwrap().pct, 40.0);
    assert_eq!(report.summary.share("wait").unwrap().count, 2);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_monthly_trend_is_dense() {
    let request = AnalysisRequest::new(TEXT_COLUMN).with_date_column(DATE_COLUMN);
    let report = scenario_pipeline(MatchMode::Word)
        .run(&scenario_dataset(), &request)
        .unwrap();

    let trends = report.trends.unwrap();
    let buckets: Vec<String> = trends.buckets().map(|b| b.to_string()).collect();
    assert_eq!(buckets, vec!["2024-01", "2024-02", "2024-03"]);
    assert_eq!(trends.undated, 0);

    for row in &trends.rows {
        assert_eq!(row.per_category.len(), 2);
        for share in &row.per_category {
            assert!(share.count <= row.total);
        }
    }

    // January: row 1 (both categories) and row 2 (none)
    let jan = &trends.rows[0];
    assert_eq!(jan.total, 2);
    assert_eq!(jan.share("admin").unwrap().pct, 50.0);
    assert_eq!(jan.share("wait").unwrap().pct, 50.0);

    // March: only the waiting complaint, admin is zero-filled
    let mar = &trends.rows[2];
    assert_eq!(mar.total, 1);
    assert_eq!(mar.share("admin").unwrap().count, 0);
    assert_eq!(mar.share("admin").unwrap().pct, 0.0);
    assert_eq!(mar.share("wait").unwrap().pct, 100.0);
}

#[test]
fn test_examples_carry_dates_and_original_text() {
    let request = AnalysisRequest::new(TEXT_COLUMN).with_date_column(DATE_COLUMN);
    let report = scenario_pipeline(MatchMode::Word)
        .run(&scenario_dataset(), &request)
        .unwrap();

    let admin = report.examples_for("admin").unwrap();
    let texts: Vec<&str> = admin.examples.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Долго ждали в регистратуре", "касса не работает"]);
    assert_eq!(
        admin.examples[1].date.map(|d| d.to_string()),
        Some("2024-02-03".to_string())
    );
}

#[test]
fn test_unparsable_dates_are_warnings() {
    let ds = Dataset::new(
        vec![DATE_COLUMN.into(), TEXT_COLUMN.into()],
        vec![
            vec!["15.01.2024".into(), "касса".into()],
            vec!["не помню".into(), "касса".into()],
            vec!["".into(), "долго".into()],
        ],
    );
    let request = AnalysisRequest::new(TEXT_COLUMN).with_date_column(DATE_COLUMN);
    let report = scenario_pipeline(MatchMode::Word).run(&ds, &request).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].row, 1);
    assert_eq!(report.warnings[0].value, "не помню");

    let trends = report.trends.unwrap();
    assert_eq!(trends.undated, 2);
    assert_eq!(trends.rows.len(), 1);
    assert_eq!(trends.rows[0].total, 1);
}

#[test]
fn test_missing_column_is_schema_error() {
    let request = AnalysisRequest::new(TEXT_COLUMN).with_date_column("Date");
    let err = scenario_pipeline(MatchMode::Word)
        .run(&scenario_dataset(), &request)
        .unwrap_err();

    assert!(matches!(err, Error::ColumnNotFound { ref column, .. } if column == "Date"));
    assert_eq!(err.category(), ErrorCategory::Schema);
}

#[test]
fn test_empty_dataset() {
    let ds = Dataset::new(vec![DATE_COLUMN.into(), TEXT_COLUMN.into()], vec![]);
    let request = AnalysisRequest::new(TEXT_COLUMN).with_date_column(DATE_COLUMN);
    let report = scenario_pipeline(MatchMode::Word).run(&ds, &request).unwrap();

    assert_eq!(report.summary.total, 0);
    assert!(report.summary.per_category.iter().all(|s| s.pct == 0.0));
    assert!(report.trends.unwrap().is_empty());
}

#[test]
fn test_json_output_shape() {
    let request = AnalysisRequest::new(TEXT_COLUMN).with_date_column(DATE_COLUMN);
    let report = scenario_pipeline(MatchMode::Word)
        .run(&scenario_dataset(), &request)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    complaint_lens::storage::save_json(&report, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["summary"]["total"], 5);
    assert_eq!(json["summary"]["perCategory"]["wait"]["count"], 2);
    assert_eq!(json["trends"]["rows"][1]["bucket"], "2024-02");
    assert_eq!(json["trends"]["rows"][1]["perCategory"]["admin"]["pct"], 50.0);
    assert_eq!(json["textColumn"], TEXT_COLUMN);
}
