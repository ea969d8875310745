use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use crate::config::AppConfig;

/// Materialize queued URLs into markdown documents.
#[derive(Debug, Parser)]
#[command(name = "fetchq", version, about)]
pub struct Cli {
    /// RON config file (default: ./fetchq.ron when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub queue_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Reader service prefix the target URL is appended to.
    #[arg(long, global = true)]
    pub reader_endpoint: Option<String>,

    /// Rendering service used when the reader fails.
    #[arg(long, global = true)]
    pub render_endpoint: Option<String>,

    /// Also write the log to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Drain the queue directory once (the default).
    Run,
    /// Fetch a single URL into the output directory without touching the queue.
    Fetch {
        url: String,
        /// Stored as `source_note`.
        note: Option<String>,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.queue_dir {
            config.queue_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(endpoint) = &self.reader_endpoint {
            config.reader.endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &self.render_endpoint {
            config.render.endpoint = Some(endpoint.clone());
        }
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
    }
}
