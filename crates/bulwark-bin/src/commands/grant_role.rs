// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `grant-role` command.

use bulwark_config::ConfigLoader;
use bulwark_core::{RoleRepository, UserRepository};
use bulwark_store::SqliteStore;
use tracing::info;

use crate::cli::{Cli, GrantRoleArgs};
use crate::error::{BinError, BinResult, BootstrapStep};
use crate::runtime::open_store;

/// Executes the `grant-role` command.
pub async fn grant_role(cli: &Cli, args: GrantRoleArgs) -> BinResult<()> {
    let config = ConfigLoader::new().load_or_default(&cli.config)?;

    let store = open_store(&config.database).await?;
    store
        .migrate()
        .await
        .map_err(BinError::bootstrap(BootstrapStep::Migrate))?;

    let result = grant(&store, &args.username, &args.role).await;
    store.close().await;

    let user_id = result?;
    println!(
        "Granted role '{}' to {} ({})",
        args.role.trim(),
        args.username,
        user_id
    );
    Ok(())
}

/// Grants `role` to the live user named `username` and returns their id.
pub(crate) async fn grant(
    store: &SqliteStore,
    username: &str,
    role: &str,
) -> BinResult<bulwark_core::UserId> {
    let role = role.trim();
    if role.is_empty() {
        return Err(BinError::invalid_argument("Role name must not be empty"));
    }

    let identity = store
        .find_by_username(username)
        .await?
        .filter(|identity| identity.is_live())
        .ok_or_else(|| BinError::UnknownUser(username.to_string()))?;

    store.grant_role(&identity.user_id, role).await?;
    info!(user_id = %identity.user_id, role = %role, "Role granted");

    Ok(identity.user_id)
}
