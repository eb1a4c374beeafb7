// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Resolution of the `me` route parameter.
//!
//! Must run after route matching (`route_layer`) and after the guard. Every
//! route parameter whose value is the literal `me` is replaced by the
//! caller's id and the result is stored as [`RouteParams`] for the role
//! layer and the handler.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{FromRequestParts, Path},
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{Caller, RouteParams};
use crate::error::ApiError;

/// Sentinel value standing for the caller's own id.
pub const ME: &str = "me";

/// Layer resolving `me` route parameters.
#[derive(Debug, Clone, Default)]
pub struct MeResolverLayer;

impl MeResolverLayer {
    /// Creates a new layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for MeResolverLayer {
    type Service = MeResolver<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MeResolver { inner }
    }
}

/// Middleware resolving `me` route parameters.
#[derive(Debug, Clone)]
pub struct MeResolver<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for MeResolver<S>
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
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            let raw = match parts.extensions.get::<RouteParams>() {
                Some(params) => params.clone(),
                None => Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
                    .await
                    .map(|Path(map)| RouteParams::from(map))
                    .unwrap_or_default(),
            };

            let caller = parts.extensions.get::<Caller>().cloned().unwrap_or_default();
            let params = match resolve_me(raw, &caller) {
                Ok(params) => params,
                Err(e) => return Ok(e.into_response()),
            };

            parts.extensions.insert(params);
            inner.call(Request::from_parts(parts, body)).await
        })
    }
}

/// Replaces every `me` value with the caller's id.
fn resolve_me(params: RouteParams, caller: &Caller) -> Result<RouteParams, ApiError> {
    let names: Vec<String> = params
        .iter()
        .filter(|(_, value)| *value == ME)
        .map(|(name, _)| name.to_string())
        .collect();

    if names.is_empty() {
        return Ok(params);
    }

    let Some(identity) = caller.identity() else {
        tracing::debug!("Cannot resolve 'me' without an identity");
        return Err(ApiError::unauthorized(
            "Authentication required to resolve 'me'",
        ));
    };

    let mut params = params;
    let id = identity.user_id.to_string();
    for name in names {
        params.insert(name, id.clone());
    }
    Ok(params)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use axum::http::StatusCode;
    use bulwark_core::UserId;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::AuthContext;
    use crate::testing::ReadyGate;

    fn caller() -> Caller {
        Caller::from(AuthContext::new(UserId::new(), "alice", vec![]))
    }

    #[test]
    fn test_resolve_me_rewrites() {
        let caller = caller();
        let id = caller.identity().unwrap().user_id.to_string();

        let params = RouteParams::new().with("userId", "me").with("postId", "42");
        let resolved = resolve_me(params, &caller).unwrap();

        assert_eq!(resolved.get("userId"), Some(id.as_str()));
        assert_eq!(resolved.get("postId"), Some("42"));
    }

    #[test]
    fn test_resolve_me_requires_identity() {
        let params = RouteParams::new().with("userId", "me");
        let err = resolve_me(params, &Caller::anonymous()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_no_me_passes_through_anonymous() {
        let params = RouteParams::new().with("userId", "abc");
        let resolved = resolve_me(params.clone(), &Caller::anonymous()).unwrap();
        assert_eq!(resolved, params);
    }

    #[tokio::test]
    async fn test_middleware_inserts_params() {
        let caller = caller();
        let id = caller.identity().unwrap().user_id.to_string();

        let mut service = MeResolverLayer::new().layer(tower::service_fn(
            |req: Request<Body>| async move {
                let params = req.extensions().get::<RouteParams>().cloned().unwrap();
                let body = params.get("userId").unwrap_or_default().to_string();
                Ok::<_, Infallible>(Response::new(Body::from(body)))
            },
        ));

        let mut req = Request::builder().uri("/users/me").body(Body::empty()).unwrap();
        req.extensions_mut().insert(caller);
        req.extensions_mut()
            .insert(RouteParams::new().with("userId", "me"));

        let response = service.ready().await.unwrap().call(req).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes, id.as_bytes());
    }

    #[tokio::test]
    async fn test_calls_the_ready_inner_service() {
        let mut service = MeResolverLayer::new().layer(ReadyGate::default());

        for _ in 0..2 {
            let mut req = Request::builder().uri("/users/me").body(Body::empty()).unwrap();
            req.extensions_mut().insert(caller());
            req.extensions_mut()
                .insert(RouteParams::new().with("userId", "me"));

            let response = service.ready().await.unwrap().call(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_middleware_rejects_anonymous_me() {
        let mut service = MeResolverLayer::new().layer(tower::service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(Response::new(Body::empty()))
        }));

        let mut req = Request::builder().uri("/users/me").body(Body::empty()).unwrap();
        req.extensions_mut().insert(Caller::anonymous());
        req.extensions_mut()
            .insert(RouteParams::new().with("userId", "me"));

        let response = service.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
