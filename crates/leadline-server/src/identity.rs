//! Who is calling. The transport hands each request's bearer token to an
//! `IdentityProvider`; an unresolved token means the request proceeds
//! anonymously and the action layer decides what that is allowed to do.

use async_trait::async_trait;
use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use leadline_service::Actor;

/// A resolved user. `name` is what audit history displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
}

impl UserIdentity {
    pub fn into_actor(self) -> Actor {
        Actor { id: self.id, name: self.name }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to a user, or `None` for anonymous.
    async fn resolve(&self, bearer_token: Option<&str>) -> Option<UserIdentity>;
}

/// Single shared-token auth: the token from the environment maps to one
/// configured user. Wrong or missing tokens resolve to anonymous.
pub struct StaticTokenProvider {
    token: SecretString,
    user: UserIdentity,
}

impl StaticTokenProvider {
    pub fn new(token: SecretString, user: UserIdentity) -> Self {
        Self { token, user }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn resolve(&self, bearer_token: Option<&str>) -> Option<UserIdentity> {
        match bearer_token {
            Some(t) if t == self.token.expose_secret() => Some(self.user.clone()),
            _ => None,
        }
    }
}

/// Demo-mode auth: every request, token or not, is the configured user.
pub struct OpenAccessProvider {
    user: UserIdentity,
}

impl OpenAccessProvider {
    pub fn new(user: UserIdentity) -> Self {
        Self { user }
    }
}

#[async_trait]
impl IdentityProvider for OpenAccessProvider {
    async fn resolve(&self, _bearer_token: Option<&str>) -> Option<UserIdentity> {
        Some(self.user.clone())
    }
}

/// The token from an `Authorization: Bearer ...` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
