use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use complaint_lens::analytics::MatchMode;
use complaint_lens::config::Config;

mod commands;

use commands::AnalyzeArgs;

#[derive(Parser)]
#[command(
    name = "complaint-lens",
    version,
    about = "Keyword classification and monthly trends for customer complaint spreadsheets",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify complaints and build the report
    Analyze {
        /// Input spreadsheet or CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Worksheet name (first sheet when omitted)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Column holding the complaint text
        #[arg(short, long)]
        text_column: String,

        /// Column holding the complaint date
        #[arg(short, long)]
        date_column: Option<String>,

        /// Keyword match mode (word, substring)
        #[arg(short, long)]
        match_mode: Option<MatchMode>,

        /// Write matching records to an xlsx workbook, one sheet per category
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write a Markdown report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// List the columns of an input file
    Columns {
        /// Input spreadsheet or CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Worksheet name (first sheet when omitted)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Show the configured categories and keywords
    Categories,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    complaint_lens::i18n::init_from_env();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("complaint-lens starting");

    match cli.command {
        Commands::Analyze {
            input,
            sheet,
            text_column,
            date_column,
            match_mode,
            export,
            report,
            json,
        } => {
            tracing::info!(
                input = %input.display(),
                sheet = ?sheet,
                text_column = %text_column,
                date_column = ?date_column,
                match_mode = ?match_mode,
                "Starting analyze command"
            );
            commands::analyze(
                &config,
                AnalyzeArgs {
                    input,
                    sheet,
                    text_column,
                    date_column,
                    match_mode,
                    export,
                    report,
                    json,
                },
            )?;
        }

        Commands::Columns { input, sheet } => {
            tracing::info!(input = %input.display(), sheet = ?sheet, "Starting columns command");
            commands::columns(&input, sheet.as_deref())?;
        }

        Commands::Categories => {
            commands::categories(&config)?;
        }
    }

    tracing::info!("complaint-lens completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("complaint_lens=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("complaint_lens={level},warn"))
            .with_context(|| format!("Invalid log level: {level}"))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
