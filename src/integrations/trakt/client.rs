// src/integrations/trakt/client.rs
//
// HTTP client for the media-tracking REST API.
//
// This is infrastructure, not domain: it returns wire DTOs and never
// creates or mutates entities. Every call ensures a valid bearer token
// first; the credential provider refreshes transparently. A 429 is
// retried once after a fixed backoff, then surfaced as RateLimited —
// the orchestrator's bounded concurrency is the primary mitigation.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::{SyncError, SyncResult};
use crate::integrations::credentials::CredentialProvider;
use crate::integrations::trakt::dto::{
    EpisodeDto, ProgressDto, SearchResultDto, SeasonDto, ShowDto, WatchedMovieDto, WatchedShowDto,
};
use crate::integrations::RemoteClient;

const DEFAULT_BASE_URL: &str = "https://api.trakt.tv";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(250);
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);

/// Rate limiter state
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - Duration::from_secs(60),
            min_interval,
        }
    }
}

pub struct TraktClient {
    base_url: String,
    http_client: Client,
    client_id: String,
    credentials: Arc<dyn CredentialProvider>,
    rate_limiter: Mutex<RateLimiter>,
}

impl TraktClient {
    pub fn new(
        client_id: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> SyncResult<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client,
            client_id: client_id.into(),
            credentials,
            rate_limiter: Mutex::new(RateLimiter::new(MIN_REQUEST_INTERVAL)),
        })
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enforce the minimum spacing between requests. Holding the lock
    /// across the sleep intentionally serializes outbound calls.
    async fn wait_if_needed(&self) {
        let mut limiter = self.rate_limiter.lock().await;
        let elapsed = limiter.last_request.elapsed();
        if elapsed < limiter.min_interval {
            tokio::time::sleep(limiter.min_interval - elapsed).await;
        }
        limiter.last_request = Instant::now();
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> SyncResult<T>
    where
        T: DeserializeOwned,
    {
        match self.execute(path, query).await {
            Err(SyncError::RateLimited) => {
                warn!(
                    "Rate limited on {}; retrying once after {:?}",
                    path, RATE_LIMIT_BACKOFF
                );
                tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                self.execute(path, query).await
            }
            other => other,
        }
    }

    async fn execute<T>(&self, path: &str, query: &[(&str, String)]) -> SyncResult<T>
    where
        T: DeserializeOwned,
    {
        self.wait_if_needed().await;

        let token = self.credentials.valid_access_token().await?;

        debug!("GET {}{}", self.base_url, path);

        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .header(header::CONTENT_TYPE, "application/json")
            .header("trakt-api-version", "2")
            .header("trakt-api-key", &self.client_id)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("Request to {} failed: {}", path, e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(SyncError::Unauthorized(format!(
                    "Remote rejected credentials for {}",
                    path
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(SyncError::RateLimited),
            status if !status.is_success() => return Err(SyncError::Http(status.as_u16())),
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::Decoding(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl RemoteClient for TraktClient {
    async fn search_shows(&self, query: &str, limit: u32) -> SyncResult<Vec<ShowDto>> {
        let results: Vec<SearchResultDto> = self
            .get_json(
                "/search/show",
                &[
                    ("query", query.to_string()),
                    ("limit", limit.to_string()),
                    ("extended", "full".to_string()),
                ],
            )
            .await?;

        Ok(results.into_iter().filter_map(|r| r.show).collect())
    }

    async fn get_show(&self, trakt_id: i64) -> SyncResult<ShowDto> {
        self.get_json(
            &format!("/shows/{}", trakt_id),
            &[("extended", "full,images".to_string())],
        )
        .await
    }

    async fn get_seasons(&self, trakt_id: i64) -> SyncResult<Vec<SeasonDto>> {
        self.get_json(
            &format!("/shows/{}/seasons", trakt_id),
            &[("extended", "full".to_string())],
        )
        .await
    }

    async fn get_episodes(&self, trakt_id: i64, season: u32) -> SyncResult<Vec<EpisodeDto>> {
        self.get_json(
            &format!("/shows/{}/seasons/{}", trakt_id, season),
            &[("extended", "full".to_string())],
        )
        .await
    }

    async fn get_watched_progress(&self, trakt_id: i64) -> SyncResult<ProgressDto> {
        self.get_json(&format!("/shows/{}/progress/watched", trakt_id), &[])
            .await
    }

    async fn get_all_watched_shows(&self) -> SyncResult<Vec<WatchedShowDto>> {
        self.get_json("/sync/watched/shows", &[]).await
    }

    async fn get_watched_movies(&self) -> SyncResult<Vec<WatchedMovieDto>> {
        self.get_json("/sync/watched/movies", &[]).await
    }
}
