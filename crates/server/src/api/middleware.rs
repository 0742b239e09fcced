//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use phonelist_core::{AuthError, AuthRequest, Identity, Session};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use super::error::ApiError;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Records request duration, count and in-flight gauge.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Lowercased header map for the authenticator.
pub fn auth_request(headers: &HeaderMap) -> AuthRequest {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();
    AuthRequest { headers }
}

/// Resolves the caller's identity and stores it in request extensions.
///
/// Requests without credentials continue as guests (no `Identity`
/// extension); presented but rejected credentials get a 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_request = auth_request(request.headers());

    match state.authenticator().authenticate(&auth_request).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(AuthError::NotAuthenticated) => Ok(next.run(request).await),
        Err(AuthError::InvalidCredentials(_)) => {
            AUTH_FAILURES_TOTAL
                .with_label_values(&["invalid_credentials"])
                .inc();
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Authentication failed");
            AUTH_FAILURES_TOTAL.with_label_values(&["internal_error"]).inc();
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Extractor for a signed-in caller. Guests are rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }

    /// Session holding this identity, for core components.
    pub fn session(&self) -> Session {
        Session::signed_in(self.0.clone())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts.extensions.get::<Identity>().cloned();
        std::future::ready(identity.map(AuthUser).ok_or_else(ApiError::unauthorized))
    }
}

/// Extractor for any caller: `None` for guests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

impl MaybeUser {
    pub fn session(&self) -> Session {
        match &self.0 {
            Some(identity) => Session::signed_in(identity.clone()),
            None => Session::signed_out(),
        }
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        std::future::ready(Ok(MaybeUser(parts.extensions.get::<Identity>().cloned())))
    }
}
