// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! Wires the configuration into the store, the password hasher, the token
//! signer and the API server, then runs until a shutdown signal arrives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bulwark_api::{ApiServer, AppState, TokenSettings, TokenSigner};
use bulwark_config::{BulwarkConfig, ConfigLoader, DatabaseConfig, JwtConfig, PasswordHashConfig};
use bulwark_core::Argon2Hasher;
use bulwark_store::{SqliteStore, StoreOptions};
use tracing::{info, warn};

use crate::error::{BinError, BinResult, BootstrapStep};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// ServerRuntime
// =============================================================================

/// The runtime that owns the configuration and the shutdown coordinator.
pub struct ServerRuntime {
    config: Arc<BulwarkConfig>,
    shutdown: ShutdownCoordinator,
    migrate: bool,
}

impl ServerRuntime {
    /// Creates a new runtime.
    pub fn new(config: BulwarkConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
            migrate: true,
        }
    }

    /// Enables or disables schema bootstrap on startup.
    pub fn with_migrate(mut self, enabled: bool) -> Self {
        self.migrate = enabled;
        self
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &BulwarkConfig {
        &self.config
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs the server until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!(version = bulwark_api::VERSION, "Starting bulwark");

        let signer = create_signer(&self.config.jwt)?;
        let store = open_store(&self.config.database).await?;
        if self.migrate {
            store
                .migrate()
                .await
                .map_err(BinError::bootstrap(BootstrapStep::Migrate))?;
        }

        let state = build_state(&self.config, signer, store.clone())?;
        let server = ApiServer::new(state);
        info!(addr = %server.addr(), "bulwark is ready");

        let mut server_task = tokio::spawn(server.run_with_shutdown(self.shutdown.shutdown_signal()));

        tokio::select! {
            // The server only stops on its own when it failed to start.
            joined = &mut server_task => {
                store.close().await;
                return joined?.map_err(BinError::from);
            }
            waited = self.shutdown.wait_for_shutdown() => waited?,
        }

        let grace = self.config.server.shutdown_timeout();
        info!(grace_secs = grace.as_secs(), "Draining in-flight requests");

        match tokio::time::timeout(grace, &mut server_task).await {
            Ok(joined) => joined??,
            Err(_) => {
                warn!("In-flight requests did not finish in time, aborting");
                server_task.abort();
            }
        }

        store.close().await;
        info!("bulwark shutdown complete");
        Ok(())
    }
}

// =============================================================================
// Component construction
// =============================================================================

/// Resolves the key pair and builds the signer.
pub fn create_signer(jwt: &JwtConfig) -> BinResult<Arc<TokenSigner>> {
    let keys = jwt.load_keys().map_err(BinError::keys)?;
    let signer = TokenSigner::new(jwt, &keys).map_err(BinError::keys)?;

    info!(algorithm = %jwt.algorithm, "Token signer ready");
    Ok(Arc::new(signer))
}

/// Builds the Argon2id hasher from the configured cost parameters.
pub fn create_hasher(params: &PasswordHashConfig) -> BinResult<Argon2Hasher> {
    Argon2Hasher::with_params(params.memory_kib, params.iterations, params.parallelism)
        .map_err(|e| BinError::config(e.to_string()))
}

/// Opens the connection pool.
pub async fn open_store(database: &DatabaseConfig) -> BinResult<Arc<SqliteStore>> {
    let options = StoreOptions::new(&database.url)
        .with_max_connections(database.max_connections)
        .with_busy_timeout(database.busy_timeout());

    let store = SqliteStore::connect(&options)
        .await
        .map_err(BinError::bootstrap(BootstrapStep::Connect))?;
    Ok(Arc::new(store))
}

/// Assembles the application state.
pub fn build_state(
    config: &BulwarkConfig,
    signer: Arc<TokenSigner>,
    store: Arc<SqliteStore>,
) -> BinResult<AppState> {
    let hasher = create_hasher(&config.auth.password_hash)?;

    let state = AppState::builder()
        .server(config.server.clone())
        .signer(signer)
        .token_settings(TokenSettings::from(&config.auth))
        .store(store)
        .hasher(Arc::new(hasher))
        .build()?;
    Ok(state)
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the server runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<BulwarkConfig>,
    no_migrate: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: BulwarkConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Skips schema bootstrap on startup.
    pub fn no_migrate(mut self, skip: bool) -> Self {
        self.no_migrate = skip;
        self
    }

    /// Builds the runtime.
    ///
    /// A missing config file falls back to defaults plus environment.
    pub fn build(self) -> BinResult<ServerRuntime> {
        let config = match self.config {
            Some(cfg) => cfg,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;

                ConfigLoader::new().load_or_default(&path)?
            }
        };

        Ok(ServerRuntime::new(config).with_migrate(!self.no_migrate))
    }
}

// =============================================================================
// Tests
// =============================================================================
