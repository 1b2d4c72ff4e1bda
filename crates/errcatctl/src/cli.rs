//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use errcat_common::Strategy;
use std::path::PathBuf;

/// Errcat CLI
#[derive(Parser, Debug)]
#[command(name = "errcatctl")]
#[command(about = "Query error descriptor catalogs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (overrides $ERRCAT_CONFIG and default locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog file (overrides the configured source path)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Access strategy: cached or streaming
    #[arg(long, global = true, value_parser = parse_strategy)]
    pub strategy: Option<Strategy>,

    /// Output JSON only
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr (same as ERRCAT_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the descriptor with this id
    Show { id: String },

    /// List descriptors of a severity level (case-insensitive)
    Level { level: String },

    /// Check whether an id exists (exit code 2 when it does not)
    Exists { id: String },

    /// Count descriptors in the catalog
    Count,

    /// List distinct level values as written in the catalog
    Levels,

    /// Log the descriptor through the sink for its severity
    Report { id: String },

    /// Show catalog source, strategy and cache state
    Info,
}

fn parse_strategy(value: &str) -> Result<Strategy, String> {
    Strategy::parse(value).ok_or_else(|| {
        format!(
            "unknown strategy '{}' (expected 'cached' or 'streaming')",
            value
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show_with_globals() {
        let cli = Cli::try_parse_from([
            "errcatctl",
            "show",
            "E001",
            "--catalog",
            "ErrorLog.xml",
            "--strategy",
            "streaming",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.command, Commands::Show { id: "E001".to_string() });
        assert_eq!(cli.catalog, Some(PathBuf::from("ErrorLog.xml")));
        assert_eq!(cli.strategy, Some(Strategy::Streaming));
        assert!(cli.json);
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["errcatctl", "--strategy", "dom", "count"]).is_err());
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["errcatctl"]).is_err());
    }
}
