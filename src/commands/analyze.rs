use anyhow::{Context, Result};
use std::path::PathBuf;

use complaint_lens::analytics::{AnalysisRequest, Classifier, MatchMode, Pipeline};
use complaint_lens::config::Config;
use complaint_lens::i18n::ConsoleLabel;
use complaint_lens::storage::{self, ReportWriter};

/// Arguments of the `analyze` command
pub struct AnalyzeArgs {
    pub input: PathBuf,
    pub sheet: Option<String>,
    pub text_column: String,
    pub date_column: Option<String>,
    pub match_mode: Option<MatchMode>,
    pub export: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

pub fn analyze(config: &Config, args: AnalyzeArgs) -> Result<()> {
    let categories = config
        .build_categories()
        .context("Failed to build categories")?;
    let mode = args.match_mode.unwrap_or(config.analysis.match_mode);

    let dataset = storage::load_dataset(&args.input, args.sheet.as_deref())
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    let classifier =
        Classifier::new(&categories, mode).context("Failed to compile keyword patterns")?;
    let pipeline = Pipeline::new(classifier);

    let mut request = AnalysisRequest::new(&args.text_column).with_export(config.export);
    if let Some(date_column) = &args.date_column {
        request = request.with_date_column(date_column);
    }

    let report = pipeline.run(&dataset, &request).map_err(|e| {
        let desc = e.category().localized_desc();
        anyhow::Error::new(e).context(desc)
    })?;

    println!("{}", args.input.display());
    println!("================================");
    for line in report.summary_lines() {
        println!("{line}");
    }

    if !report.warnings.is_empty() {
        println!();
        for warning in report.warnings.iter().take(5) {
            println!("  ! {warning}");
        }
        if report.warnings.len() > 5 {
            println!(
                "  ! ... {} {}",
                report.warnings.len() - 5,
                ConsoleLabel::More.localized()
            );
        }
    }

    if let Some(path) = &args.export {
        storage::save_workbook(&report.exports, path)
            .with_context(|| format!("Failed to write export {}", path.display()))?;
        println!("\n{}: {}", ConsoleLabel::Export.localized(), path.display());
    }

    if let Some(path) = &args.report {
        ReportWriter::new()?
            .save(&report, path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("{}: {}", ConsoleLabel::Report.localized(), path.display());
    }

    if let Some(path) = &args.json {
        storage::save_json(&report, path)
            .with_context(|| format!("Failed to write JSON {}", path.display()))?;
        println!("{}: {}", ConsoleLabel::Json.localized(), path.display());
    }

    Ok(())
}
