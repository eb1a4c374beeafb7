// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `run`: Start the server
//! - `validate`: Validate configuration file
//! - `version`: Show version information
//! - `grant-role`: Grant a role to an existing user

mod grant_role;
mod run;
mod validate;
mod version;

pub use grant_role::grant_role;
pub use run::run;
pub use validate::validate;
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => run::run(&cli, args).await,
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::Version => version::version(&cli),
        Commands::GrantRole(args) => grant_role::grant_role(&cli, args).await,
    }
}
