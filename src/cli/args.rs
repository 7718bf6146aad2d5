//! CLI argument definitions using clap
//!
//! Commands:
//! - faultgate validate [--route <route>] [--file <path>]
//! - faultgate check --config <path>
//! - faultgate routes

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::processor::error_event::ROUTE;

/// faultgate - schema-enforced intake for error events
#[derive(Parser, Debug)]
#[command(name = "faultgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate and normalize one request body
    Validate {
        /// Intake route the body was sent to
        #[arg(long, default_value = ROUTE)]
        route: String,

        /// Request body file (reads stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Run the offline contract checks
    Check {
        /// Path to the contract file
        #[arg(long, default_value = "./contracts/error.json")]
        config: PathBuf,
    },

    /// List the intake routes
    Routes,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_defaults_to_error_route() {
        let cli = Cli::try_parse_from(["faultgate", "validate"]).unwrap();
        match cli.command {
            Command::Validate { route, file } => {
                assert_eq!(route, "/v1/errors");
                assert!(file.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_check_takes_config() {
        let cli = Cli::try_parse_from(["faultgate", "check", "--config", "c.json"]).unwrap();
        assert!(matches!(cli.command, Command::Check { config } if config == PathBuf::from("c.json")));
    }
}
