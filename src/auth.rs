use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Resolves a bearer credential to a user id
///
/// Identity is owned by an external auth service; this trait is the seam
/// between it and the handlers, so tests can substitute a canned mapping.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the caller behind a bearer token
    ///
    /// Any failure to resolve, including transport errors from the auth
    /// service, surfaces as `Unauthorized`.
    async fn resolve_user(&self, bearer_token: &str) -> AppResult<Uuid>;
}

/// Extracts the bearer token from an Authorization header
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}

/// HTTP client for the external identity service
#[derive(Clone)]
pub struct AuthApiClient {
    http_client: HttpClient,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
}

impl AuthApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for AuthApiClient {
    async fn resolve_user(&self, bearer_token: &str) -> AppResult<Uuid> {
        let url = format!("{}/user", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Identity service unreachable");
                AppError::Unauthorized
            })?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized);
        }

        let user: AuthUser = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Identity service returned malformed user");
            AppError::Unauthorized
        })?;

        Ok(user.id)
    }
}

/// Fixed token-to-user mapping for tests and local development
#[derive(Clone, Default)]
pub struct StaticIdentity {
    users: HashMap<String, Uuid>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token and returns the user id it resolves to
    pub fn register(&mut self, token: impl Into<String>) -> Uuid {
        let user_id = Uuid::new_v4();
        self.users.insert(token.into(), user_id);
        user_id
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve_user(&self, bearer_token: &str) -> AppResult<Uuid> {
        self.users
            .get(bearer_token)
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}
