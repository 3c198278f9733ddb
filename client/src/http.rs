//! HTTP ledger gateway client.
//!
//! Read-only: round snapshots, player records, the per-round roster, and the
//! recent raw event window. Reads are idempotent GETs and retried under a
//! capped-exponential [`RetryPolicy`]; a missing resource is `Ok(None)`, not
//! an error.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use lastkey_types::{Address, PlayerRecord, RawEventRecord, RoundSnapshot};

use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Retry policy for idempotent ledger reads.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Client for a ledger read gateway.
#[derive(Clone)]
pub struct HttpLedger {
    client: reqwest::Client,
    pub(crate) base_url: Url,
    retry: RetryPolicy,
}

impl HttpLedger {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidScheme(scheme.to_string())),
        }
        // relative joins drop the last path segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The current round's snapshot, or `None` before initialization.
    pub async fn current_round(&self) -> Result<Option<RoundSnapshot>> {
        self.get_json("v0/round/current").await
    }

    /// A player's record, or `None` if the address never registered.
    pub async fn player(&self, address: &Address) -> Result<Option<PlayerRecord>> {
        self.get_json(&format!("v0/player/{address}")).await
    }

    /// All player records for a round.
    pub async fn players(&self, round: u64) -> Result<Vec<PlayerRecord>> {
        Ok(self
            .get_json(&format!("v0/round/{round}/players"))
            .await?
            .unwrap_or_default())
    }

    /// The most recent raw event records, newest last.
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<RawEventRecord>> {
        Ok(self
            .get_json(&format!("v0/events?limit={limit}"))
            .await?
            .unwrap_or_default())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.base_url.join(path)?;
        let mut attempt = 0u32;
        let mut backoff = self.retry.initial_backoff;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send().await {
                Ok(response) if response.status() == StatusCode::NOT_FOUND => return Ok(None),
                Ok(response) if response.status().is_success() => {
                    return Ok(Some(response.json().await?));
                }
                Ok(response) => {
                    let status = response.status();
                    let retryable = status.is_server_error()
                        || status == StatusCode::TOO_MANY_REQUESTS;
                    if !retryable || attempt >= self.retry.max_attempts {
                        return Err(Error::Failed(status));
                    }
                }
                Err(err) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(err.into());
                    }
                }
            }
            debug!(%url, attempt, "retrying ledger read");
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2).min(self.retry.max_backoff);
        }
    }
}
