// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use bulwark_config::{BulwarkConfig, ConfigError};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::{create_hasher, create_signer};

/// Leeway above which clock skew tolerance is reported as suspicious.
const MAX_SANE_LEEWAY_SECS: u64 = 300;

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = bulwark_config::load_config(config_path)?;

    // Keys and hash parameters are only checked when used, so try them now.
    create_signer(&config.jwt)?;
    create_hasher(&config.auth.password_hash)?;

    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Listen:        {}", config.server.socket_addr());
            println!("  Database:      {}", config.database.url);
            println!("  Algorithm:     {}", config.jwt.algorithm);
            println!("  Auth TTL:      {}s", config.auth.auth_token_ttl_secs);
            println!("  Refresh TTL:   {}s", config.auth.refresh_token_ttl_secs);
            println!("  CORS:          {}", if config.server.cors.enabled { "enabled" } else { "disabled" });

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&config)
                        .unwrap_or_else(|_| "(serialization error)".to_string())
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "listen": config.server.socket_addr().to_string(),
                    "database_url": config.database.url,
                    "algorithm": config.jwt.algorithm.as_str(),
                    "auth_token_ttl_secs": config.auth.auth_token_ttl_secs,
                    "refresh_token_ttl_secs": config.auth.refresh_token_ttl_secs,
                    "cors_enabled": config.server.cors.enabled,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            let rendered = serde_json::to_string_pretty(&output)
                .map_err(|e| ConfigError::serialization(e.to_string()))?;
            println!("{}", rendered);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Returns non-fatal configuration issues.
fn collect_warnings(config: &BulwarkConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let cors = &config.server.cors;

    if cors.enabled && cors.allowed_origins.iter().any(|o| o == "*") {
        warnings.push("CORS accepts requests from any origin".to_string());
    }

    if config.jwt.leeway_secs > MAX_SANE_LEEWAY_SECS {
        warnings.push(format!(
            "JWT leeway of {}s exceeds {}s",
            config.jwt.leeway_secs, MAX_SANE_LEEWAY_SECS
        ));
    }

    if config.jwt.issuer.is_none() {
        warnings.push("No JWT issuer configured; the iss claim is not checked".to_string());
    }

    if config.database.url.contains(":memory:") {
        warnings.push("In-memory database: all users are lost on restart".to_string());
    }

    warnings
}
