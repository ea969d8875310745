mod cli;
mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use fetchq_core::{is_valid_url, FetchRequest};
use fetchq_engine::{
    ensure_output_dir, DirDocumentStore, DirQueueStore, ItemOutcome, ProcessingReport,
    QueueProcessor,
};
use fetchq_logging::{fetchq_error, LogDestination};

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            fetchq_error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let destination = match &config.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    fetchq_logging::initialize(destination, cli.level());

    ensure_output_dir(&config.output_dir)
        .with_context(|| format!("output dir {}", config.output_dir.display()))?;
    let processor = QueueProcessor::new(
        Arc::new(DirQueueStore::new(config.queue_dir.clone())),
        Arc::new(DirDocumentStore::new(config.output_dir.clone())),
        config.build_chain(),
    );

    // Items are processed strictly one after another.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match cli.command() {
        Command::Run => {
            let report = runtime.block_on(processor.run_once());
            print_report(&report);
            Ok(exit_code(!report.has_failures()))
        }
        Command::Fetch { url, note } => {
            let url = url.trim().to_string();
            if !is_valid_url(&url) {
                bail!("not an http(s) url: {url}");
            }
            let request = FetchRequest {
                url: url.clone(),
                note: note.map(|note| note.trim().to_string()).filter(|n| !n.is_empty()),
                tags: Vec::new(),
            };
            match runtime.block_on(processor.materialize(&request, &url)) {
                Ok(committed) => {
                    println!(
                        "written {} ({} strategy)",
                        committed.document_key, committed.strategy
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    println!("failed {url}: {err}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn print_report(report: &ProcessingReport) {
    if let Some(err) = &report.listing_error {
        println!("queue could not be listed: {err}");
        return;
    }
    if report.items.is_empty() {
        println!("no items in queue");
        return;
    }
    for item in &report.items {
        match &item.outcome {
            ItemOutcome::Committed {
                document_key,
                strategy,
                removal_error,
            } => {
                println!("committed {} -> {} ({} strategy)", item.id, document_key, strategy);
                if let Some(err) = removal_error {
                    println!("  warning: {err}");
                }
            }
            ItemOutcome::Skipped {
                stage,
                error,
                removal_error,
            } => {
                println!("skipped   {} at {}: {}", item.id, stage, error);
                if let Some(err) = removal_error {
                    println!("  warning: {err}");
                }
            }
            ItemOutcome::Retained { error } => {
                println!("retained  {}: {}", item.id, error);
            }
        }
    }
    println!(
        "--- {} committed, {} skipped, {} retained",
        report.committed(),
        report.skipped(),
        report.retained()
    );
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
