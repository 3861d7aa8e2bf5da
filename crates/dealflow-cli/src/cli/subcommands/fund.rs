use clap::Subcommand;
use dealflow_core::entities::FundAttr;

use crate::cli::root_commands::parse_fund_attr;

/// Fund commands.
#[derive(Clone, Debug, Subcommand)]
pub enum FundCommands {
    /// Create a fund, or update the thesis of the fund with this name.
    Upsert {
        name: String,
        #[arg(long)]
        thesis: Option<String>,
    },
    /// List funds.
    List,
    /// Get a fund by name.
    Get { name: String },
    /// Set one fund attribute. The value is parsed as JSON, falling back to a string; `null` removes it.
    Set {
        name: String,
        #[arg(value_parser = parse_fund_attr)]
        attr: FundAttr,
        value: String,
    },
}
