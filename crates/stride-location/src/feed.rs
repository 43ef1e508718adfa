//! Location-history service client.

use crate::batch::{compute_progress, PointBatch, ProgressSummary};
use crate::error::LocationError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Format of the `from` query parameter (local time, no offset).
const SINCE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Default timeout for point queries.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the health probe.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of recorded location points.
///
/// Implementations perform a single request per call; retrying is left to
/// the caller.
#[async_trait]
pub trait LocationFeed: Send + Sync {
    /// Returns every point recorded since `since`, in service order.
    async fn points_since(&self, since: NaiveDateTime) -> Result<PointBatch, LocationError>;
}

/// Fetches points since `since` and aggregates them.
///
/// `Ok(None)` means the service answered but there was not enough data.
pub async fn progress_since<F>(
    feed: &F,
    since: NaiveDateTime,
) -> Result<Option<ProgressSummary>, LocationError>
where
    F: LocationFeed + ?Sized,
{
    let batch = feed.points_since(since).await?;
    Ok(compute_progress(&batch))
}

/// Connection settings for [`DawarichClient`].
#[derive(Clone)]
pub struct DawarichConfig {
    pub api_base: String,
    pub api_key: String,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl fmt::Debug for DawarichConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DawarichConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .field("health_timeout", &self.health_timeout)
            .finish()
    }
}

impl DawarichConfig {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }
}

/// Result of probing the service's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// HTTP status code, or `None` when the request never completed.
    pub status: Option<u16>,
    /// Response body, or the transport error message.
    pub body: String,
}

/// HTTP client for a Dawarich-compatible location-history API.
#[derive(Clone)]
pub struct DawarichClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    health_timeout: Duration,
}

impl fmt::Debug for DawarichClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DawarichClient")
            .field("api_base", &self.api_base)
            .field("health_timeout", &self.health_timeout)
            .finish_non_exhaustive()
    }
}

impl DawarichClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::MissingApiKey`] if the key is blank.
    pub fn new(config: DawarichConfig) -> Result<Self, LocationError> {
        if config.api_key.trim().is_empty() {
            return Err(LocationError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            health_timeout: config.health_timeout,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Probes `GET {base}/health`.
    ///
    /// Never fails: transport errors are reported in the returned body.
    pub async fn health(&self) -> HealthStatus {
        let url = format!("{}/health", self.api_base);
        let result = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.health_timeout)
            .send()
            .await;

        match result {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                HealthStatus {
                    status: Some(status),
                    body,
                }
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "location service health check failed");
                HealthStatus {
                    status: None,
                    body: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl LocationFeed for DawarichClient {
    async fn points_since(&self, since: NaiveDateTime) -> Result<PointBatch, LocationError> {
        let url = format!("{}/points", self.api_base);
        let from = since.format(SINCE_FORMAT).to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[("from", from.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LocationError::FetchFailed(format!(
                "GET {} returned {}",
                url,
                resp.status()
            )));
        }

        let payload: Value = resp.json().await?;
        match payload {
            Value::Array(records) => {
                tracing::debug!(count = records.len(), from = %from, "fetched location points");
                Ok(PointBatch::new(records))
            }
            other => Err(LocationError::Decode(format!(
                "expected a JSON array of points, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
