// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    handler::Handler,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use bulwark_config::CorsConfig;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::allow;
use crate::auth::Role;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{self, USER_ID_PARAM};
use crate::middleware::{AuthLayer, MeResolverLayer};
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let server = &self.state.server;

        // A bare `CorsLayer` grants nothing to cross-origin callers.
        let cors = if server.cors.enabled {
            create_cors_layer(&server.cors)
        } else {
            CorsLayer::new()
        };

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                server.request_timeout(),
            ))
            .layer(cors)
            .layer(AuthLayer::new(self.state.signer.clone()));

        // `me` must be resolved after routing and before the role check.
        let users = Router::new()
            .route(
                "/users/{userId}",
                get(handlers::get_user.layer(allow![Role::Authenticated])).patch(
                    handlers::update_user.layer(allow![Role::Admin, Role::owner(USER_ID_PARAM)]),
                ),
            )
            .route_layer(MeResolverLayer::new());

        Router::new()
            // Health (public)
            .route("/health", get(handlers::health))
            // Auth endpoints (public)
            .route("/auth/sign-up", post(handlers::sign_up))
            .route("/auth/sign-in", post(handlers::sign_in))
            .route("/auth/sign-out", post(handlers::sign_out))
            .route("/auth/refresh", post(handlers::refresh))
            // Users
            .merge(users)
            // Apply middleware and state
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server until `shutdown_signal` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        info!(addr = %addr, "API server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.state.server.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
fn create_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new().max_age(Duration::from_secs(cors.max_age_secs));

    // Origins
    if cors.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer = layer.allow_origin(AllowOrigin::list(origins));
    }

    // Methods
    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    // Headers
    if cors.allowed_headers.iter().any(|h| h == "*") {
        layer = layer.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = cors
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer = layer.allow_headers(AllowHeaders::list(headers));
    }

    // Credentials
    if cors.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    layer
}

// =============================================================================
// Tests
// =============================================================================
