use std::path::PathBuf;

use clap::{Args, Subcommand};
use dealflow_core::entities::FundAttr;
use dealflow_core::enums::{ProductLine, ProjectStatus};
use dealflow_filter::PipelineName;
use uuid::Uuid;

use crate::cli::subcommands::{FundCommands, InvestorCommands, ProjectCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Funds and their theses.
    Fund {
        #[command(subcommand)]
        action: FundCommands,
    },
    /// Investors and the funds they sign for.
    Investor {
        #[command(subcommand)]
        action: InvestorCommands,
    },
    /// Tracked companies.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Run one named pipeline on a company JSON file.
    Filter(FilterArgs),
    /// Admit one company against fund signals.
    Inject(InjectArgs),
    /// Run a JSONL file of admission jobs.
    Batch(BatchArgs),
    /// Show the events of one admission group.
    Events(EventsArgs),
    /// List published feed entries.
    Feed,
    /// Rebuild the events table from the JSONL trail.
    Replay(ReplayArgs),
}

/// Arguments for `dealflow filter`.
#[derive(Clone, Debug, Args)]
pub struct FilterArgs {
    /// Pipeline name, e.g. `filter_company` or `filter_signal`
    #[arg(value_parser = parse_pipeline)]
    pub pipeline: PipelineName,
    /// Company data as a JSON object
    pub file: PathBuf,
    /// Fund id, required by the signal pipelines
    #[arg(long)]
    pub fund: Option<i64>,
}

/// Arguments for `dealflow inject`.
#[derive(Clone, Debug, Args)]
pub struct InjectArgs {
    /// Company data as a JSON object
    pub file: PathBuf,
    /// Fund id to admit against (repeatable)
    #[arg(long = "fund")]
    pub funds: Vec<i64>,
    /// Product line: startup or b2b
    #[arg(long, default_value = "startup", value_parser = parse_line)]
    pub line: ProductLine,
    /// Signal source as a JSON object (LinkedIn company record and signal)
    #[arg(long)]
    pub source: Option<PathBuf>,
}

/// Arguments for `dealflow batch`.
#[derive(Clone, Debug, Args)]
pub struct BatchArgs {
    /// JSONL file, one admission job per line
    pub file: PathBuf,
    /// Attempts per job, overriding `worker.max_attempts`
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

/// Arguments for `dealflow events`.
#[derive(Clone, Debug, Args)]
pub struct EventsArgs {
    pub group_id: Uuid,
    /// Read the JSONL trail file instead of the events table
    #[arg(long)]
    pub trail: bool,
}

/// Arguments for `dealflow replay`.
#[derive(Clone, Debug, Args)]
pub struct ReplayArgs {
    /// Trail directory, overriding `events.trail_dir`
    #[arg(long)]
    pub trail_dir: Option<PathBuf>,
}

pub fn parse_pipeline(raw: &str) -> Result<PipelineName, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

pub fn parse_line(raw: &str) -> Result<ProductLine, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

pub fn parse_status(raw: &str) -> Result<ProjectStatus, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

pub fn parse_fund_attr(raw: &str) -> Result<FundAttr, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown fund attribute '{raw}'"))
}
