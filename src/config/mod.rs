//! Configuration and credential storage

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::auth::{SessionStore, StoredToken};

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend project URL (data and auth services share it)
    pub base_url: Option<String>,
    /// Project key sent with every request
    pub anon_key: Option<String>,
    /// Stored access token for the signed-in session
    pub access_token: Option<StoredToken>,
    /// Stored refresh token
    pub refresh_token: Option<String>,
    /// Signed-in user's id (from last login)
    pub user_id: Option<String>,
    /// Signed-in user's email
    pub user_email: Option<String>,
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "educonnect", "educonnect-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains tokens)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Backend endpoint and project key, required by every remote call.
    pub fn require_backend(&self) -> Result<(String, String)> {
        match (&self.base_url, &self.anon_key) {
            (Some(url), Some(key)) => Ok((url.clone(), key.clone())),
            _ => bail!(
                "Backend not configured. Run 'educonnect configure --url <url> --key <key>'."
            ),
        }
    }

    pub fn set_backend(&mut self, url: String, key: String) {
        self.base_url = Some(url);
        self.anon_key = Some(key);
    }
}

impl SessionStore for Config {
    fn get_access_token(&self) -> Option<StoredToken> {
        self.access_token.clone()
    }

    fn set_access_token(&mut self, token: String, expires_in: Option<u64>) {
        self.access_token = Some(StoredToken::new(token, expires_in));
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.refresh_token.clone()
    }

    fn set_refresh_token(&mut self, token: String) {
        self.refresh_token = Some(token);
    }

    fn get_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn get_user_email(&self) -> Option<String> {
        self.user_email.clone()
    }

    fn set_user(&mut self, id: String, email: String) {
        self.user_id = Some(id);
        self.user_email = Some(email);
    }

    fn clear_session(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.user_id = None;
        self.user_email = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearing_the_session_keeps_the_backend_settings() {
        let mut config = Config::default();
        config.set_backend("https://campus.example.com".into(), "key".into());
        config.set_access_token("token".into(), Some(3600));
        config.set_refresh_token("refresh".into());
        config.set_user("u1".into(), "a@b.com".into());

        config.clear_session();
        assert!(config.get_access_token().is_none());
        assert!(config.get_refresh_token().is_none());
        assert!(config.get_user_id().is_none());
        assert!(config.require_backend().is_ok());
    }

    #[test]
    fn unconfigured_backend_is_an_error() {
        let config = Config::default();
        assert!(config.require_backend().is_err());
    }

    #[test]
    fn session_round_trips_through_toml() {
        let mut config = Config::default();
        config.set_backend("https://campus.example.com".into(), "key".into());
        config.set_access_token("token".into(), Some(3600));
        config.set_user("u1".into(), "a@b.com".into());

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.get_access_token().unwrap().token, "token");
        assert_eq!(parsed.get_user_id().as_deref(), Some("u1"));
        assert_eq!(parsed.get_user_email().as_deref(), Some("a@b.com"));
    }
}
