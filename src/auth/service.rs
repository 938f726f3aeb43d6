//! Password-grant authentication against the EduConnect auth service
//!
//! Sign-in, sign-up, token refresh and logout. Successful calls persist
//! the session into the config file and broadcast an `AuthEvent` so live
//! session bridges can react.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::backend::{BackendError, BackendResult};
use crate::config::Config;

use super::SessionStore;

/// Authenticated session as issued by the auth service.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

/// Session-change notification.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    TokenRefreshed(AuthSession),
    SignedOut,
}

/// Credential operations plus session-change notifications. The bridge
/// only depends on this seam.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Session restored from storage, refreshed if necessary.
    async fn current_session(&self) -> BackendResult<Option<AuthSession>>;
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession>;
    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthSession>;
    async fn sign_out(&self) -> BackendResult<()>;
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, fallback_email: &str) -> AuthSession {
        AuthSession {
            user_id: self.user.id,
            email: self.user.email.unwrap_or_else(|| fallback_email.to_string()),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
        }
    }
}

/// Auth service client for one configured backend.
pub struct AuthService {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthService {
    pub fn from_config(config: &Config) -> Result<Self> {
        let (base_url, anon_key) = config.require_backend()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            anon_key,
            events,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post(&self, url: &str, body: Value) -> BackendResult<Value> {
        tracing::debug!("Auth POST {}", url);
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&body)
            .send()
            .await?;
        check_auth_response(resp, url).await
    }

    fn persist(&self, session: &AuthSession) -> BackendResult<()> {
        let mut config = Config::load().map_err(internal)?;
        config.set_access_token(session.access_token.clone(), session.expires_in);
        if let Some(ref refresh) = session.refresh_token {
            config.set_refresh_token(refresh.clone());
        }
        config.set_user(session.user_id.clone(), session.email.clone());
        config.save().map_err(internal)?;
        Ok(())
    }

    fn publish(&self, event: AuthEvent) {
        // No receivers is fine; one-shot CLI commands rarely subscribe.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AuthApi for AuthService {
    async fn current_session(&self) -> BackendResult<Option<AuthSession>> {
        let config = Config::load().map_err(internal)?;
        let Some(token) = config.get_access_token() else {
            return Ok(None);
        };

        if token.is_expired() {
            if config.get_refresh_token().is_none() {
                return Ok(None);
            }
            let refreshed = refresh().await.map_err(internal)?;
            if !refreshed {
                return Ok(None);
            }
            let config = Config::load().map_err(internal)?;
            return Ok(stored_session(&config));
        }

        Ok(stored_session(&config))
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let url = self.auth_url("token?grant_type=password");
        let body = self
            .post(&url, json!({ "email": email, "password": password }))
            .await?;
        let token: TokenResponse = serde_json::from_value(body)?;
        let session = token.into_session(email);
        self.persist(&session)?;
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let url = self.auth_url("signup");
        let body = self
            .post(&url, json!({ "email": email, "password": password }))
            .await?;

        if body.get("access_token").is_none() {
            // Account created but no session issued (confirmation pending).
            return Err(BackendError::unauthorized(
                "sign-up accepted but no session was issued; confirm the email address, then run 'educonnect login'",
            ));
        }

        let token: TokenResponse = serde_json::from_value(body)?;
        let session = token.into_session(email);
        self.persist(&session)?;
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let mut config = Config::load().map_err(internal)?;
        if let Some(token) = config.get_access_token() {
            let url = self.auth_url("logout");
            tracing::debug!("Auth POST {}", url);
            // Best effort: the local session is cleared even if revocation
            // fails.
            let result = self
                .http
                .post(&url)
                .header("apikey", &self.anon_key)
                .bearer_auth(&token.token)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!("Token revocation failed: {:#}", e);
            }
        }

        config.clear_session();
        config.save().map_err(internal)?;
        self.publish(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

fn stored_session(config: &Config) -> Option<AuthSession> {
    let token = config.get_access_token()?;
    Some(AuthSession {
        user_id: config.get_user_id()?,
        email: config.get_user_email().unwrap_or_default(),
        access_token: token.token,
        refresh_token: config.get_refresh_token(),
        expires_in: None,
    })
}

fn internal(e: anyhow::Error) -> BackendError {
    BackendError::Storage(format!("{:#}", e))
}

/// Refresh the stored session using the refresh token. Returns Ok(true)
/// if a new session was stored, Ok(false) when no refresh token exists.
pub async fn refresh() -> Result<bool> {
    let mut config = Config::load()?;
    let Some(refresh_token) = config.get_refresh_token() else {
        return Ok(false);
    };
    let (base_url, anon_key) = config.require_backend()?;

    tracing::info!("Refreshing session...");

    let url = format!(
        "{}/auth/v1/token?grant_type=refresh_token",
        base_url.trim_end_matches('/')
    );
    let resp = reqwest::Client::new()
        .post(&url)
        .header("apikey", &anon_key)
        .bearer_auth(&anon_key)
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .context("Session refresh request failed")?;

    let body = check_auth_response(resp, &url).await?;
    let token: TokenResponse = serde_json::from_value(body).context("Unexpected refresh response")?;

    config.set_access_token(token.access_token.clone(), token.expires_in);
    if let Some(refresh) = token.refresh_token {
        config.set_refresh_token(refresh);
    }
    let email = token.user.email.clone().or_else(|| config.get_user_email());
    config.set_user(token.user.id, email.unwrap_or_default());
    config.save()?;

    Ok(true)
}

/// Error body shapes produced by the auth service.
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    error: Option<String>,
    msg: Option<String>,
}

async fn check_auth_response(resp: reqwest::Response, url: &str) -> BackendResult<Value> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let body = resp.text().await.unwrap_or_default();
    let parsed: Option<AuthErrorBody> = serde_json::from_str(&body).ok();
    let message = parsed
        .and_then(|e| e.error_description.or(e.msg).or(e.error))
        .unwrap_or_else(|| body.clone());

    tracing::debug!("Auth HTTP {} for {}: {}", status.as_u16(), url, message);

    match status.as_u16() {
        400 | 401 => Err(BackendError::Unauthorized(message)),
        403 => Err(BackendError::Forbidden(message)),
        _ => Err(BackendError::Api {
            status: status.as_u16(),
            message,
        }),
    }
}
