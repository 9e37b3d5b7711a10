// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SCOPES: &str = "openid email profile https://www.googleapis.com/auth/drive.file";
const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_CONSENT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Google identity ---
    /// OAuth client ID (public)
    pub google_client_id: String,
    /// OAuth client secret; only desktop-type clients have one
    pub google_client_secret: Option<String>,
    /// Space-separated OAuth scopes
    pub google_scopes: String,
    /// Port for the loopback redirect listener (0 picks a free port)
    pub oauth_redirect_port: u16,
    /// How long to wait for the user to finish the consent screen
    pub consent_timeout: Duration,

    // --- Customer service ---
    /// Base URL of the customer API
    pub customer_api_url: String,
    /// Per-request timeout for customer API calls
    pub customer_api_timeout: Duration,

    // --- Session ---
    /// Override for the directory holding the persisted session
    pub session_dir: Option<PathBuf>,

    // --- App info ---
    pub app_name: String,
    pub app_version: String,
    pub app_env: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let consent_timeout_secs = match env::var("CONSENT_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("CONSENT_TIMEOUT_SECS", v))?,
            Err(_) => DEFAULT_CONSENT_TIMEOUT_SECS,
        };

        let api_timeout_secs = match env::var("CUSTOMER_API_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("CUSTOMER_API_TIMEOUT_SECS", v))?,
            Err(_) => DEFAULT_API_TIMEOUT_SECS,
        };

        let oauth_redirect_port = match env::var("OAUTH_REDIRECT_PORT") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("OAUTH_REDIRECT_PORT", v))?,
            Err(_) => 0,
        };

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_client_secret: non_empty_var("GOOGLE_CLIENT_SECRET"),
            google_scopes: env::var("GOOGLE_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_string()),
            oauth_redirect_port,
            consent_timeout: Duration::from_secs(consent_timeout_secs),
            customer_api_url: env::var("CUSTOMER_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            customer_api_timeout: Duration::from_secs(api_timeout_secs),
            session_dir: non_empty_var("SESSION_DIR").map(PathBuf::from),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Showroom CRM".to_string()),
            app_version: env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            google_client_secret: Some("test_secret".to_string()),
            google_scopes: DEFAULT_SCOPES.to_string(),
            oauth_redirect_port: 0,
            consent_timeout: Duration::from_secs(5),
            customer_api_url: DEFAULT_API_URL.to_string(),
            customer_api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            session_dir: None,
            app_name: "Showroom CRM".to_string(),
            app_version: "test".to_string(),
            app_env: "test".to_string(),
        }
    }

    /// Check the loaded values and describe every problem found.
    ///
    /// An empty list means the configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.google_client_id.is_empty() {
            errors.push("GOOGLE_CLIENT_ID is not set".to_string());
        } else if !self.google_client_id.ends_with(".apps.googleusercontent.com") {
            errors.push(format!(
                "GOOGLE_CLIENT_ID does not look like a Google OAuth client ID: {}",
                self.google_client_id
            ));
        }

        if self.scopes().is_empty() {
            errors.push("GOOGLE_SCOPES must contain at least one scope".to_string());
        }

        if !(self.customer_api_url.starts_with("http://")
            || self.customer_api_url.starts_with("https://"))
        {
            errors.push(format!(
                "CUSTOMER_API_URL must be an http(s) URL: {}",
                self.customer_api_url
            ));
        }

        if self.consent_timeout.is_zero() {
            errors.push("CONSENT_TIMEOUT_SECS must be greater than zero".to_string());
        }

        if self.customer_api_timeout.is_zero() {
            errors.push("CUSTOMER_API_TIMEOUT_SECS must be greater than zero".to_string());
        }

        errors
    }

    /// OAuth scopes as individual entries.
    pub fn scopes(&self) -> Vec<&str> {
        self.google_scopes.split_whitespace().collect()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
