use clap::Subcommand;
use dealflow_core::enums::ProjectStatus;

use crate::cli::root_commands::parse_status;

/// Tracked company commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ProjectCommands {
    /// List live companies, newest first.
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<ProjectStatus>,
    },
    /// Get a company with its signal links and tags.
    Get { id: i64 },
    /// Set the curation status.
    Status {
        id: i64,
        #[arg(value_parser = parse_status)]
        status: ProjectStatus,
    },
    /// Publish to the feed.
    Publish { id: i64 },
    /// Soft-delete a company.
    Remove { id: i64 },
    /// All recorded events of a company.
    Events { id: i64 },
}
