//! Authenticated HTTP client for the EduConnect data API
//!
//! Wraps reqwest::Client with project-key injection and automatic session
//! refresh.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::SessionStore;
use crate::config::Config;

use super::{Backend, BackendError, BackendResult, Operation, Request};

/// Authenticated client executing typed requests over the backend's REST
/// interface.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl BackendClient {
    /// Load config and build the client. Attempts a session refresh if the
    /// stored access token is expired.
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        let (base_url, anon_key) = config.require_backend()?;

        if let Some(token) = config.get_access_token() {
            if token.is_expired() {
                if config.get_refresh_token().is_some() {
                    tracing::info!("Session expired, refreshing...");
                    match crate::auth::service::refresh().await {
                        Ok(true) => tracing::info!("Session refreshed"),
                        Ok(false) => {
                            bail!("No refresh token available. Run 'educonnect login'.");
                        }
                        Err(e) => {
                            bail!("Session refresh failed: {:#}. Run 'educonnect login'.", e);
                        }
                    }
                } else {
                    bail!("Session expired and no refresh token. Run 'educonnect login'.");
                }
            }
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            anon_key,
        })
    }

    /// Bearer credential for a request. The stored session rotates on
    /// sign-in and refresh, so it is read per request rather than pinned
    /// at construction; without a session the project key itself is the
    /// bearer.
    fn bearer(&self) -> String {
        Config::load()
            .ok()
            .and_then(|config| config.get_access_token())
            .filter(|token| !token.is_expired())
            .map(|token| token.token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn execute(&self, request: Request) -> BackendResult<Vec<Value>> {
        let url = self.table_url(&request.table);
        let pairs = request.query_pairs();

        let builder = match &request.op {
            Operation::Select => {
                tracing::debug!("GET {}", url);
                self.http.get(&url)
            }
            Operation::Insert { values } => {
                tracing::debug!("POST {}", url);
                // The API accepts a row array; single inserts ship as [row].
                self.http
                    .post(&url)
                    .header("Prefer", "return=representation")
                    .json(&vec![values.clone()])
            }
            Operation::Update { changes } => {
                tracing::debug!("PATCH {}", url);
                self.http
                    .patch(&url)
                    .header("Prefer", "return=representation")
                    .json(changes)
            }
        };

        let resp = builder
            .query(&pairs)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .send()
            .await?;

        let resp = check_response(resp, &url).await?;
        let body: Value = resp.json().await.map_err(BackendError::Network)?;

        match body {
            Value::Array(rows) => Ok(rows),
            other => Ok(vec![other]),
        }
    }
}

/// Error body shape produced by the data API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
}

/// Check HTTP response status and map failures onto the error taxonomy.
async fn check_response(resp: reqwest::Response, url: &str) -> BackendResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.clone());
    let code = parsed.and_then(|e| e.code).unwrap_or_default();

    tracing::debug!("HTTP {} for {}: {}", status.as_u16(), url, message);

    // Postgres class-23 codes cover duplicate keys and bad foreign keys.
    if status == reqwest::StatusCode::CONFLICT || code.starts_with("23") {
        return Err(BackendError::Constraint { code, message });
    }

    match status {
        reqwest::StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized(format!(
            "{} -- run 'educonnect login'",
            message
        ))),
        reqwest::StatusCode::FORBIDDEN => Err(BackendError::Forbidden(message)),
        _ => Err(BackendError::Api {
            status: status.as_u16(),
            message,
        }),
    }
}
