//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::{Parser, Subcommand};

/// Upper bound for `--refresh-hours`, one year
pub const MAX_REFRESH_HOURS: u64 = 24 * 365;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "mastermind-client")]
#[command(about = "A terminal client for the Mastermind code-breaking game")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Backend root URL
    #[arg(long, default_value = "http://localhost:8000", global = true)]
    pub base_url: String,

    /// File holding the stored identity (player, tokens, pause marker)
    #[arg(long, default_value = ".mastermind-session.json", global = true)]
    pub store: PathBuf,

    /// Hours between proactive token refreshes
    #[arg(long, default_value = "24", value_parser = clap::value_parser!(u64).range(1..=MAX_REFRESH_HOURS), global = true)]
    pub refresh_hours: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What the client should do
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an account and sign in with it
    Register {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out, leaving a pause marker for the running game
    Logout,
    /// Show the authentication state
    Status,
    /// Start a new game
    NewGame,
    /// Show the difficulty, or set it (4, 5 or 6) and start a new game
    Difficulty { level: Option<u8> },
    /// Submit a guess, digits 0 to 7
    Guess { digits: String },
    /// Show the rounds of the current game
    Rounds,
    /// Show wins and fastest time at the current difficulty
    Leaderboard,
    /// Follow the current game with a live timer until interrupted
    Play {
        /// Follow the game without the timer
        #[arg(long)]
        no_timer: bool,
    },
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Cadence of the proactive token refresh
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_hours * 60 * 60)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::token_refresh::DEFAULT_REFRESH_PERIOD;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let config = Config::try_parse_from([
            "mastermind-client",
            "guess",
            "1234",
            "--base-url",
            "http://game.test",
            "-v",
        ])
        .unwrap();

        assert_eq!(config.base_url, "http://game.test");
        assert_eq!(config.log_level(), "debug");
        assert!(matches!(config.command, Command::Guess { ref digits } if digits == "1234"));
    }

    #[test]
    fn refresh_period_defaults_to_a_day() {
        let config = Config::try_parse_from(["mastermind-client", "status"]).unwrap();
        assert_eq!(config.refresh_period(), DEFAULT_REFRESH_PERIOD);
        assert!(Config::try_parse_from(["mastermind-client", "--refresh-hours", "0", "status"]).is_err());
    }

    #[test]
    fn refresh_hours_are_capped_at_a_year() {
        let config = Config::try_parse_from(["mastermind-client", "--refresh-hours", "8760", "status"]).unwrap();
        assert_eq!(config.refresh_period(), Duration::from_secs(8760 * 3600));
        assert!(Config::try_parse_from(["mastermind-client", "--refresh-hours", "8761", "status"]).is_err());
        assert!(Config::try_parse_from(["mastermind-client", "--refresh-hours", "18446744073709551615", "status"]).is_err());
    }
}
