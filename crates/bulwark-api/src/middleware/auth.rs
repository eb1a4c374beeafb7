// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication guard.
//!
//! Resolves the caller from the `Authorization: Bearer` header and stores a
//! [`Caller`] in request extensions. The guard never rejects; a missing or
//! unusable token yields an anonymous caller and the role layer decides.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use tower::{Layer, Service};

use crate::auth::{AuthContext, Caller, TokenSigner};

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer installing the authentication guard.
#[derive(Clone)]
pub struct AuthLayer {
    signer: Arc<TokenSigner>,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            signer: self.signer.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware resolving the caller identity.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    signer: Arc<TokenSigner>,
}

impl<S> AuthMiddleware<S> {
    fn resolve<B>(&self, req: &Request<B>) -> Caller {
        let Some(token) = extract_bearer_token(req) else {
            return Caller::anonymous();
        };

        match self.signer.verify(token) {
            Ok(claims) => match AuthContext::from_claims(&claims) {
                Some(ctx) => Caller::from(ctx),
                None => {
                    tracing::debug!(token_type = %claims.tt, "Token is not an access token");
                    Caller::anonymous()
                }
            },
            Err(reason) => {
                tracing::debug!(reason = %reason, "Token validation failed");
                Caller::anonymous()
            }
        }
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let caller = self.resolve(&req);
        req.extensions_mut().insert(caller);

        // Call the instance that was polled ready; keep the fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
