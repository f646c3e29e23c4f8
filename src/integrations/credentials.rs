// src/integrations/credentials.rs
//
// Credential provider boundary. OAuth/PKCE mechanics and secure storage
// live in the host application; the sync engine only asks for a bearer
// token that is valid right now.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::SyncResult;

/// Tokens are refreshed once they expire within this window.
pub fn refresh_threshold() -> Duration {
    Duration::minutes(5)
}

/// A bearer token with its expiry instant.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// True when the token is expired or expires within the refresh window.
    pub fn needs_refresh(&self) -> bool {
        self.expires_at - Utc::now() <= refresh_threshold()
    }
}

/// Yields a valid bearer token on demand, refreshing transparently.
///
/// Implementations fail with `SyncError::Unauthorized` when a refresh
/// fails; callers must surface that to the host's auth flow instead of
/// retrying.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn valid_access_token(&self) -> SyncResult<String>;
}

/// Fixed token, for tests and short-lived tooling.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn valid_access_token(&self) -> SyncResult<String> {
        Ok(self.token.clone())
    }
}
