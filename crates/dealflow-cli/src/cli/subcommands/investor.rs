use clap::Subcommand;

/// Investor commands.
#[derive(Clone, Debug, Subcommand)]
pub enum InvestorCommands {
    /// Create an investor, or rename the one with this LinkedIn URL.
    Upsert {
        name: String,
        #[arg(long)]
        linkedin: Option<String>,
        /// Fund id the investor signs for (repeatable)
        #[arg(long = "fund")]
        funds: Vec<i64>,
    },
    /// Get an investor by id.
    Get { id: i64 },
}
