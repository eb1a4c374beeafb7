// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # bulwark-config
//!
//! Configuration management for bulwark.
//!
//! ## Features
//!
//! - **Schema Definition**: server, database, auth, jwt and logging sections
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `BULWARK_*` variables override file values
//! - **Key Resolution**: inline PEM first, PEM file second
//!
//! ## Quick Start
//!
//! ```no_run
//! use bulwark_config::loader::load_config;
//!
//! let config = load_config("bulwark.yaml").unwrap();
//! let keys = config.jwt.load_keys().unwrap();
//! ```
//!
//! Values in config files can reference environment variables:
//!
//! ```yaml
//! database:
//!   url: "${DATABASE_URL:sqlite://bulwark.db}"
//! ```
//!
//! The configuration is loaded once at startup and shared immutably for the
//! lifetime of the process. It is never reloaded.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, ConfigFormat, ConfigLoader};
pub use schema::{
    AuthConfig, BulwarkConfig, CorsConfig, DatabaseConfig, JwtAlgorithm, JwtConfig, KeyPair,
    LogFormat, LogLevel, LoggingConfig, PasswordHashConfig, SecretValue, ServerConfig,
};
