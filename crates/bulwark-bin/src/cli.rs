// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the server (default)
//! - `validate`: Validate configuration file and signing keys
//! - `version`: Show version information
//! - `grant-role`: Grant a role to an existing user

use std::path::PathBuf;

use bulwark_config::LoggingConfig;
use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// bulwark - token-based authentication server
///
/// Issues and verifies signed access tokens, manages refresh sessions and
/// guards routes by role.
#[derive(Parser, Debug)]
#[command(
    name = "bulwark",
    author = "Sylvex <contact@sylvex.io>",
    version = bulwark_api::VERSION,
    about = "Token-based authentication and session server",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "bulwark.yaml",
        env = "BULWARK_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, env = "BULWARK_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format (text, json, compact); overrides the config file
    #[arg(long, env = "BULWARK_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the authentication server
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses the configuration and loads the signing keys without starting
    /// the server.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,

    /// Grant a role to an existing user
    ///
    /// The role is created on first use. Granting a role twice is a no-op.
    #[command(name = "grant-role")]
    GrantRole(GrantRoleArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Skip schema bootstrap on startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `grant-role` command.
#[derive(Args, Debug, Clone)]
pub struct GrantRoleArgs {
    /// Username of the user to promote
    #[arg(short, long)]
    pub username: String,

    /// Role name to grant
    #[arg(short, long, default_value = "admin")]
    pub role: String,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<bulwark_config::LogFormat> for LogFormat {
    fn from(format: bulwark_config::LogFormat) -> Self {
        match format {
            bulwark_config::LogFormat::Text => LogFormat::Text,
            bulwark_config::LogFormat::Json => LogFormat::Json,
            bulwark_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Get the effective log level.
    ///
    /// `--quiet` and `--verbose` win over `--log-level`, which wins over the
    /// config file.
    pub fn effective_log_level(&self, logging: &LoggingConfig) -> String {
        if self.quiet {
            "warn".to_string()
        } else if self.verbose {
            "debug".to_string()
        } else {
            self.log_level
                .clone()
                .unwrap_or_else(|| logging.level.as_str().to_string())
        }
    }

    /// Get the effective log format.
    pub fn effective_log_format(&self, logging: &LoggingConfig) -> LogFormat {
        self.log_format.unwrap_or_else(|| logging.format.into())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use bulwark_config::LogLevel;

    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["bulwark"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["bulwark", "run", "--no-migrate"]);
        match cli.command {
            Some(Commands::Run(args)) => assert!(args.no_migrate),
            other => panic!("Expected Run command, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["bulwark", "validate", "--show-config", "-f", "json"]);
        match cli.command {
            Some(Commands::Validate(args)) => {
                assert!(args.show_config);
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("Expected Validate command, got {:?}", other),
        }
    }

    #[test]
    fn test_grant_role_command() {
        let cli = Cli::parse_from(["bulwark", "grant-role", "--username", "alice"]);
        match cli.command {
            Some(Commands::GrantRole(args)) => {
                assert_eq!(args.username, "alice");
                assert_eq!(args.role, "admin");
            }
            other => panic!("Expected GrantRole command, got {:?}", other),
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["bulwark", "-c", "/etc/bulwark/bulwark.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/bulwark/bulwark.yaml"));
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let logging = LoggingConfig {
            level: LogLevel::Error,
            format: bulwark_config::LogFormat::Json,
        };

        let cli = Cli::parse_from(["bulwark"]);
        assert_eq!(cli.effective_log_level(&logging), "error");
        assert_eq!(cli.effective_log_format(&logging), LogFormat::Json);

        let cli = Cli::parse_from(["bulwark", "-l", "trace", "--log-format", "compact"]);
        assert_eq!(cli.effective_log_level(&logging), "trace");
        assert_eq!(cli.effective_log_format(&logging), LogFormat::Compact);
    }

    #[test]
    fn test_quiet_and_verbose() {
        let logging = LoggingConfig::default();

        let cli = Cli::parse_from(["bulwark", "-q", "-l", "trace"]);
        assert_eq!(cli.effective_log_level(&logging), "warn");

        let cli = Cli::parse_from(["bulwark", "-v"]);
        assert_eq!(cli.effective_log_level(&logging), "debug");
    }
}
