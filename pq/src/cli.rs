//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pacequeue - priority-ordered, rate-limited completion requests
#[derive(Parser)]
#[command(
    name = "pq",
    about = "Priority-ordered, rate-limited request coordinator for completion APIs",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one prompt through the queue and print the completion
    Submit {
        /// Prompt text
        prompt: String,

        /// Priority (higher runs first)
        #[arg(short, long, allow_negative_numbers = true)]
        priority: Option<i64>,

        /// Model identifier (defaults to the configured model)
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature between 0 and 1
        #[arg(short, long)]
        temperature: Option<f64>,

        /// Maximum tokens to generate
        #[arg(long)]
        max_tokens: Option<i64>,
    },

    /// Submit JSON lines of `{"payload": {...}, "priority": N}` and print results
    Batch {
        /// Input file, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show the validated configuration (credential redacted)
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_submit() {
        let cli = Cli::parse_from(["pq", "submit", "hello", "-p", "-2", "--max-tokens", "64"]);
        match cli.command {
            Command::Submit {
                prompt,
                priority,
                max_tokens,
                ..
            } => {
                assert_eq!(prompt, "hello");
                assert_eq!(priority, Some(-2));
                assert_eq!(max_tokens, Some(64));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from(["pq", "batch", "-", "--log-level", "debug", "-c", "pq.yml"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("pq.yml")));
        assert!(matches!(cli.command, Command::Batch { .. }));
    }
}
