//! API Middleware
//!
//! Bearer token authentication for Axum. `AuthLayer` puts the shared
//! `AppState` into request extensions; the extractors read it from there.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::auth::token_verifier::{extract_bearer_token, TokenVerifier};
use crate::auth::user_context::UserContext;
use crate::shared::error::ServiceError;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub token_verifier: Arc<TokenVerifier>,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .map(String::from)
}

/// Authenticated principal extractor.
/// Rejects with 401 unless a valid bearer token is present.
pub struct Authenticated(pub UserContext);

impl std::ops::Deref for Authenticated {
    type Target = UserContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts
            .extensions
            .get::<AppState>()
            .ok_or_else(|| ServiceError::internal("Auth service not configured"))?;

        let token = bearer_token(parts)
            .ok_or_else(|| ServiceError::unauthorized("Missing authentication token"))?;

        let context = app_state.token_verifier.verify(&token)?;
        Ok(Authenticated(context))
    }
}

/// Raw bearer token, if the request carries one. Never rejects.
pub struct OptionalBearer(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalBearer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalBearer(bearer_token(parts)))
    }
}

/// Middleware layer that injects AppState into request extensions
#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());

        let future = self.inner.call(req);
        Box::pin(future)
    }
}
