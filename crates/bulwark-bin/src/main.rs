// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! bulwark - token-based authentication server
//!
//! Main binary entry point.

use bulwark_bin::{commands, error::report_error_and_exit, init_logging, Cli};
use bulwark_config::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Commands report unreadable config themselves; logging only needs a best effort.
    let logging = ConfigLoader::new()
        .load_or_default(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();

    if let Err(e) = init_logging(
        &cli.effective_log_level(&logging),
        cli.effective_log_format(&logging),
    ) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = commands::execute(cli).await {
        report_error_and_exit(e);
    }
}
