// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role resolver middleware.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{FromRequestParts, Path},
    http::{request::Parts, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{allows_any, Caller, Role, RouteParams};
use crate::error::ApiError;

// =============================================================================
// RoleLayer
// =============================================================================

/// Layer granting access when any of its roles holds.
///
/// Reads the [`Caller`] left by the guard and the [`RouteParams`] left by the
/// `me` resolver (falling back to the raw path parameters). A denial is a
/// `403` that does not reveal which roles were tried.
#[derive(Debug, Clone)]
pub struct RoleLayer {
    roles: Arc<Vec<Role>>,
}

impl RoleLayer {
    /// Creates a layer allowing any of `roles`, evaluated in order.
    pub fn allow(roles: Vec<Role>) -> Self {
        Self {
            roles: Arc::new(roles),
        }
    }

    /// Returns the configured roles.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl<S> Layer<S> for RoleLayer {
    type Service = RoleMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RoleMiddleware {
            inner,
            roles: self.roles.clone(),
        }
    }
}

// =============================================================================
// RoleMiddleware
// =============================================================================

/// Middleware enforcing a [`RoleLayer`].
#[derive(Debug, Clone)]
pub struct RoleMiddleware<S> {
    inner: S,
    roles: Arc<Vec<Role>>,
}

impl<S> Service<Request<Body>> for RoleMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let roles = self.roles.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let params = route_params(&mut parts).await;
            let caller = parts.extensions.get::<Caller>().cloned().unwrap_or_default();

            if !allows_any(&roles, caller.identity(), &params) {
                let granted: Vec<String> = roles.iter().map(ToString::to_string).collect();
                tracing::debug!(
                    path = %parts.uri.path(),
                    user_id = ?caller.identity().map(|c| c.user_id),
                    "Access denied"
                );
                return Ok(ApiError::forbidden(granted.join(", ")).into_response());
            }

            inner.call(Request::from_parts(parts, body)).await
        })
    }
}

async fn route_params(parts: &mut Parts) -> RouteParams {
    if let Some(params) = parts.extensions.get::<RouteParams>() {
        return params.clone();
    }
    Path::<HashMap<String, String>>::from_request_parts(parts, &())
        .await
        .map(|Path(map)| RouteParams::from(map))
        .unwrap_or_default()
}

// =============================================================================
// Convenience Macro
// =============================================================================

/// Creates a [`RoleLayer`] from a list of roles.
///
/// # Example
///
/// ```rust,ignore
/// use bulwark_api::allow;
/// use bulwark_api::auth::Role;
///
/// let layer = allow![Role::Admin, Role::owner("userId")];
/// ```
#[macro_export]
macro_rules! allow {
    ($($role:expr),+ $(,)?) => {
        $crate::middleware::RoleLayer::allow(vec![$($role),+])
    };
}

// =============================================================================
// Tests
// =============================================================================
