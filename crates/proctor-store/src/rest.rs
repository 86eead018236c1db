//! REST client for the reporting backend
//!
//! Talks to the session/event service under `{base_url}/api`. The backend
//! owns the schema, integrity scoring and report summaries; this client only
//! moves records across the wire.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::StorageError;
use crate::schema::{
    EventSubmission, NewSession, SessionEndReceipt, SessionId, SessionRecord, SessionReport,
    ViolationEvent,
};
use crate::storage_traits::{EventStore, SessionStore, StorageResult};

const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend, without the `/api` prefix
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl BackendConfig {
    /// Read `PROCTOR_BACKEND_URL` and `PROCTOR_BACKEND_TIMEOUT_MS`, falling
    /// back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let base_url = std::env::var("PROCTOR_BACKEND_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let timeout_ms = std::env::var("PROCTOR_BACKEND_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        BackendConfig {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        BackendConfig {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path such as `sessions/abc`.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// `SessionStore` + `EventStore` over HTTP.
#[derive(Debug, Clone)]
pub struct RestBackend {
    config: BackendConfig,
    http: reqwest::Client,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("proctor/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Unreachable(format!("failed to build HTTP client: {e}")))?;
        Ok(RestBackend { config, http })
    }

    pub fn from_env() -> StorageResult<Self> {
        Self::new(BackendConfig::from_env())
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Fetch the backend-computed report for a session.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn get_report(&self, session_id: &SessionId) -> StorageResult<SessionReport> {
        let url = self.config.api_url(&format!("reports/{session_id}"));
        let response = self.http.get(&url).send().await?;
        decode(response, Some(session_id)).await
    }
}

/// Map the response status and decode the JSON body.
///
/// A 404 on a session-scoped request becomes `SessionNotFound`.
async fn decode<T: DeserializeOwned>(
    response: Response,
    session_id: Option<&SessionId>,
) -> StorageResult<T> {
    let status = response.status();
    let url = response.url().to_string();
    debug!(%status, %url, "backend response");

    if let Some(err) = status_error(status, &url, session_id) {
        return Err(err);
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| StorageError::InvalidResponse(e.to_string()))
}

/// The error a non-success status maps to, or `None` for 2xx.
fn status_error(
    status: StatusCode,
    url: &str,
    session_id: Option<&SessionId>,
) -> Option<StorageError> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = session_id {
            return Some(StorageError::SessionNotFound {
                session_id: id.to_string(),
            });
        }
    }
    if status.is_server_error() {
        return Some(StorageError::Unreachable(format!("{url} returned {status}")));
    }
    Some(StorageError::UnexpectedStatus {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

#[async_trait]
impl SessionStore for RestBackend {
    #[instrument(skip(self, new))]
    async fn create_session(&self, new: NewSession) -> StorageResult<SessionRecord> {
        let url = self.config.api_url("sessions");
        let response = self.http.post(&url).json(&new).send().await?;
        decode(response, None).await
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn get_session(&self, id: &SessionId) -> StorageResult<SessionRecord> {
        let url = self.config.api_url(&format!("sessions/{id}"));
        let response = self.http.get(&url).send().await?;
        decode(response, Some(id)).await
    }

    #[instrument(skip(self))]
    async fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>> {
        let url = self.config.api_url("sessions");
        let response = self.http.get(&url).send().await?;
        decode(response, None).await
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn end_session(&self, id: &SessionId) -> StorageResult<SessionEndReceipt> {
        let url = self.config.api_url(&format!("sessions/{id}/end"));
        let response = self.http.put(&url).send().await?;
        decode(response, Some(id)).await
    }
}

#[async_trait]
impl EventStore for RestBackend {
    #[instrument(skip(self, event), fields(session_id = %event.session_id, event_type = %event.event_type))]
    async fn append_event(&self, event: &ViolationEvent) -> StorageResult<ViolationEvent> {
        let url = self.config.api_url("events");
        let body = EventSubmission::from(event);
        let response = self.http.post(&url).json(&body).send().await?;
        decode(response, None).await
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn list_events(&self, session_id: &SessionId) -> StorageResult<Vec<ViolationEvent>> {
        let url = self.config.api_url(&format!("events/{session_id}"));
        let response = self.http.get(&url).send().await?;
        decode(response, Some(session_id)).await
    }
}
