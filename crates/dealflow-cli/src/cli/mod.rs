use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `dealflow` binary.
#[derive(Debug, Parser)]
#[command(name = "dealflow", version, about = "dealflow - signal admission and company screening")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max rows for list commands
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only, no progress bars)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database path, overriding `database.path` from the configuration
    #[arg(long, global = true)]
    pub database: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            database: self.database.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use dealflow_core::enums::ProductLine;
    use dealflow_filter::PipelineName;

    use super::subcommands::FundCommands;
    use super::{Cli, Commands, GlobalFlags, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "dealflow", "--format", "table", "--limit", "10", "--verbose", "fund", "list",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.limit, Some(10));
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Fund {
                action: FundCommands::List
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["dealflow", "replay", "--format", "raw", "--quiet"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Replay(_)));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["dealflow", "--format", "xml", "replay"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn filter_takes_pipeline_name() {
        let cli = Cli::try_parse_from([
            "dealflow", "filter", "filter_signal", "acme.json", "--fund", "3",
        ])
        .expect("cli should parse");

        let Commands::Filter(args) = cli.command else {
            panic!("expected filter command");
        };
        assert_eq!(args.pipeline, PipelineName::Signal);
        assert_eq!(args.fund, Some(3));
    }

    #[test]
    fn filter_rejects_unknown_pipeline() {
        let parsed = Cli::try_parse_from(["dealflow", "filter", "filter_everything", "acme.json"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn inject_defaults_to_startup_line() {
        let cli = Cli::try_parse_from([
            "dealflow", "inject", "acme.json", "--fund", "1", "--fund", "2",
        ])
        .expect("cli should parse");

        let Commands::Inject(args) = cli.command else {
            panic!("expected inject command");
        };
        assert_eq!(args.line, ProductLine::Startup);
        assert_eq!(args.funds, vec![1, 2]);
    }

    #[test]
    fn inject_accepts_b2b_line() {
        let cli = Cli::try_parse_from(["dealflow", "inject", "acme.json", "--line", "b2b"])
            .expect("cli should parse");

        let Commands::Inject(args) = cli.command else {
            panic!("expected inject command");
        };
        assert_eq!(args.line, ProductLine::B2b);
    }

    #[test]
    fn global_flags_extraction_copies_values() {
        let cli = Cli::try_parse_from(["dealflow", "--database", ":memory:", "replay"])
            .expect("cli should parse");
        let flags: GlobalFlags = cli.global_flags();
        assert_eq!(flags.database.as_deref(), Some(":memory:"));
        assert_eq!(flags.limit_or(25), 25);
    }
}
