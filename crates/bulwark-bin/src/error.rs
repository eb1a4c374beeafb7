// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Failures of the bulwark binary and their process exit codes.
//!
//! | Code | Failure |
//! |------|---------|
//! | 1 | configuration could not be loaded or is unacceptable |
//! | 2 | signing key material is missing or unusable |
//! | 3 | the database could not be opened or migrated |
//! | 4 | a store query failed after bootstrap |
//! | 5 | a command argument is invalid or names an unknown user |
//! | 6 | process setup (logging, signal handlers) failed |
//! | 7 | the HTTP server failed |

use bulwark_config::ConfigError;
use bulwark_core::StoreError;
use thiserror::Error;

/// Result type alias for bulwark-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Store bootstrap step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    /// Opening the connection pool.
    Connect,
    /// Creating the schema.
    Migrate,
}

impl std::fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => f.write_str("open"),
            Self::Migrate => f.write_str("migrate"),
        }
    }
}

/// Errors that can occur in the bulwark binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration loaded but cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signing or verification keys could not be loaded or parsed.
    #[error("Signing keys unusable: {0}")]
    KeyMaterial(String),

    /// The database could not be brought up.
    #[error("Failed to {step} database: {source}")]
    StoreBootstrap {
        step: BootstrapStep,
        #[source]
        source: StoreError,
    },

    /// A store query failed on an already open database.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// `grant-role` named a user that does not exist or was deleted.
    #[error("No such user: {0}")]
    UnknownUser(String),

    /// A command argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Logging or signal handling could not be set up.
    #[error("Startup failed: {0}")]
    Startup(String),

    /// The HTTP server failed to bind or stopped with an error.
    #[error("Server failed: {0}")]
    Server(#[from] bulwark_api::ApiError),

    /// The server task panicked or was cancelled.
    #[error("Server task failed: {0}")]
    ServerTask(String),
}

impl BinError {
    /// Creates an invalid configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a key material error.
    pub fn keys(msg: impl ToString) -> Self {
        Self::KeyMaterial(msg.to_string())
    }

    /// Returns a mapper that tags a store error with the bootstrap step.
    pub fn bootstrap(step: BootstrapStep) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::StoreBootstrap { step, source }
    }

    /// Creates a startup error.
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidConfig(_) => 1,
            Self::KeyMaterial(_) => 2,
            Self::StoreBootstrap { .. } => 3,
            Self::Store(_) => 4,
            Self::UnknownUser(_) | Self::InvalidArgument(_) => 5,
            Self::Startup(_) => 6,
            Self::Server(_) | Self::ServerTask(_) => 7,
        }
    }
}

impl From<tokio::task::JoinError> for BinError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::ServerTask(err.to_string())
    }
}

/// Prints the error and its causes to stderr, then exits with its code.
pub fn report_error_and_exit(error: BinError) -> ! {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }

    std::process::exit(error.exit_code())
}
