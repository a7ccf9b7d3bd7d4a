//! Report notifier - command line entry point.
//!
//! Usage:
//!   report-notifier                                   # default projects, today's reports
//!   report-notifier -p <ID> -p <ID> -d 2025-08-31     # chosen projects and start date
//!   report-notifier --single [-f report.json]         # single report
//!   report-notifier -f jest.json --format jest        # single report from a Jest run
//!   report-notifier --if-failing [--critical]         # single report, only when something failed
//!   report-notifier --sample [--single]               # built-in sample data

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use report_notifier_lib::config::Config;
use report_notifier_lib::models::{
    PipelineOutcome, ReportStats, SingleReportPayload, sample_report_stats,
};
use report_notifier_lib::services::report_source::{
    ReportFormat, load_report_file, parse_start_date,
};
use report_notifier_lib::services::NotificationPipeline;

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    single: bool,
    sample: bool,
    project_ids: Vec<String>,
    start_date: Option<NaiveDate>,
    report_file: Option<PathBuf>,
    format: Option<ReportFormat>,
    /// Only send when the run has failures (or is critical)
    if_failing: bool,
    critical: bool,
}

enum Command {
    Run(CliArgs),
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut parsed = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--project" | "-p" => {
                i += 1;
                let id = args.get(i).ok_or("--project requires a value")?;
                parsed.project_ids.push(id.clone());
            }
            "--start-date" | "-d" => {
                i += 1;
                let value = args.get(i).ok_or("--start-date requires a value")?;
                let date = parse_start_date(value)
                    .ok_or_else(|| format!("Invalid start date '{}', expected YYYY-MM-DD", value))?;
                parsed.start_date = Some(date);
            }
            "--report-file" | "-f" => {
                i += 1;
                let path = args.get(i).ok_or("--report-file requires a value")?;
                parsed.report_file = Some(PathBuf::from(path));
                parsed.single = true;
            }
            "--format" => {
                i += 1;
                let value = args.get(i).ok_or("--format requires a value")?;
                let format = ReportFormat::parse(value).ok_or_else(|| {
                    format!("Unknown report format '{}', expected stats, cypress or jest", value)
                })?;
                parsed.format = Some(format);
            }
            "--if-failing" => {
                parsed.if_failing = true;
                parsed.single = true;
            }
            "--critical" => parsed.critical = true,
            "--single" => parsed.single = true,
            "--sample" => parsed.sample = true,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    if parsed.single && (!parsed.project_ids.is_empty() || parsed.start_date.is_some()) {
        return Err("--project/--start-date only apply to the multi-project report".to_string());
    }
    if parsed.sample && (!parsed.project_ids.is_empty() || parsed.start_date.is_some()) {
        return Err("--sample cannot be combined with --project/--start-date".to_string());
    }
    if parsed.sample && parsed.report_file.is_some() {
        return Err("--sample cannot be combined with --report-file".to_string());
    }
    if parsed.format.is_some() && parsed.report_file.is_none() {
        return Err("--format only applies to --report-file".to_string());
    }
    if parsed.critical && !parsed.if_failing {
        return Err("--critical only applies to --if-failing".to_string());
    }

    Ok(Command::Run(parsed))
}

fn print_usage() {
    eprintln!("Usage: report-notifier [OPTIONS]");
    eprintln!();
    eprintln!("Sends the latest test reports of the configured projects by email.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --project <ID>          Project to report on (repeatable)");
    eprintln!("  -d, --start-date <DATE>     Only consider reports from DATE (YYYY-MM-DD, default: today)");
    eprintln!("      --single                Send a single report fetched from REPORT_URL");
    eprintln!("  -f, --report-file <PATH>    Send a single report read from a JSON file");
    eprintln!("      --format <FORMAT>       Report file layout: stats (default), cypress, jest");
    eprintln!("      --if-failing            Send the single report only if it has failures");
    eprintln!("      --critical              With --if-failing, send even when everything passed");
    eprintln!("      --sample                Use built-in sample data");
    eprintln!("  -h, --help                  Show this help");
}

fn print_outcome<T: Serialize>(outcome: &PipelineOutcome<T>) -> ExitCode {
    match serde_json::to_string_pretty(outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize outcome: {}", e),
    }

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let cli = match parse_args(&args) {
        Ok(Command::Run(cli)) => cli,
        Ok(Command::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    // Load environment variables from .env file
    if dotenvy::dotenv().is_err() {
        eprintln!(".env file not found, using environment variables from system");
    }

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Please check EMAIL_*, API_BASE_URL and REPORT_* environment variables");
            return ExitCode::FAILURE;
        }
    };

    info!("Report notifier (environment: {})", config.environment);
    if config.is_development() {
        warn!("Running in DEVELOPMENT mode with default SMTP and API settings");
    }

    let pipeline = match NotificationPipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Failed to initialize pipeline: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.single {
        let report: Option<ReportStats> = if cli.sample {
            Some(sample_report_stats())
        } else if let Some(ref path) = cli.report_file {
            match load_report_file(path, cli.format.unwrap_or_default()).await {
                Ok(report) => Some(report),
                Err(e) => {
                    error!("Failed to read report file: {}", e);
                    let outcome: PipelineOutcome<SingleReportPayload> =
                        PipelineOutcome::failure(e.to_string());
                    return print_outcome(&outcome);
                }
            }
        } else {
            None
        };

        if cli.if_failing {
            let outcome = pipeline.send_conditional_report(report, cli.critical).await;
            return print_outcome(&outcome);
        }
        let outcome = pipeline.send_report(report).await;
        return print_outcome(&outcome);
    }

    let outcome = if cli.sample {
        pipeline.send_sample_multi_project_report().await
    } else if cli.project_ids.is_empty() && cli.start_date.is_none() {
        pipeline.send_default_multi_project_report().await
    } else {
        let project_ids = if cli.project_ids.is_empty() {
            pipeline.settings().default_project_ids.clone()
        } else {
            cli.project_ids
        };
        let start_date = cli
            .start_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        pipeline
            .send_multi_project_report(&project_ids, start_date)
            .await
    };

    print_outcome(&outcome)
}
