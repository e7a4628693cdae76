//! Command-line entry points
//!
//! - `serve`: run the HTTP server
//! - `migrate`: apply PostgreSQL schema migrations and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Membership intake service
#[derive(Parser)]
#[command(name = "member-intake")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Apply pending database migrations
    Migrate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["member-intake", "migrate"]).unwrap();
        assert_eq!(cli.command, Some(Command::Migrate));

        let cli = Cli::try_parse_from(["member-intake"]).unwrap();
        assert_eq!(cli.command, None);

        assert!(Cli::try_parse_from(["member-intake", "ui"]).is_err());
    }
}
