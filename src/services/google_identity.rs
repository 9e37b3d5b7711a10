// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Identity client: token acquisition, profile lookup and revocation.
//!
//! Loading the identity client fetches Google's OpenID discovery document;
//! the resulting [`TokenClient`] runs the consent flow and hands back an
//! access token as an ordinary future, one request per call.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Consultant;
use crate::services::consent::{
    authorization_code, ConsentPresenter, LoopbackListener, Pkce, StateSigner, StderrPresenter,
};

const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Consent prompt behaviour requested from the authorization server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Always show the consent screen.
    Consent,
}

impl Prompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prompt::Consent => "consent",
        }
    }
}

/// Successful token response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Obtains access tokens interactively.
#[async_trait]
pub trait TokenClient: Send + Sync {
    async fn request_access_token(&self, prompt: Prompt) -> Result<TokenResponse>;
}

/// The identity platform as seen by the session adapter.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Load the identity client and construct a token client.
    async fn load_token_client(&self) -> Result<Arc<dyn TokenClient>>;

    /// Look up the profile that owns `access_token`.
    async fn fetch_profile(&self, access_token: &str) -> Result<Consultant>;

    /// Revoke `access_token` remotely.
    async fn revoke_token(&self, access_token: &str) -> Result<()>;
}

/// Endpoint URLs, overridable for tests.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub discovery: String,
    pub userinfo: String,
    pub revoke: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            discovery: DISCOVERY_URL.to_string(),
            userinfo: USERINFO_URL.to_string(),
            revoke: REVOKE_URL.to_string(),
        }
    }
}

/// Google Identity Services client.
pub struct GoogleIdentity {
    http: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    scopes: String,
    redirect_port: u16,
    consent_timeout: Duration,
    endpoints: GoogleEndpoints,
    presenter: Arc<dyn ConsentPresenter>,
}

impl GoogleIdentity {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_endpoints(config, GoogleEndpoints::default(), Arc::new(StderrPresenter))
    }

    pub fn with_endpoints(
        config: &Config,
        endpoints: GoogleEndpoints,
        presenter: Arc<dyn ConsentPresenter>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building identity HTTP client")?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            scopes: config.scopes().join(" "),
            redirect_port: config.oauth_redirect_port,
            consent_timeout: config.consent_timeout,
            endpoints,
            presenter,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    authorization_endpoint: String,
    token_endpoint: String,
}

/// Profile as returned by the v2 userinfo endpoint.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    async fn load_token_client(&self) -> Result<Arc<dyn TokenClient>> {
        let response = self
            .http
            .get(&self.endpoints.discovery)
            .send()
            .await
            .map_err(|e| AppError::IdentityLoad(format!("discovery request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::IdentityLoad(format!(
                "discovery returned HTTP {}",
                response.status()
            )));
        }

        let discovery: DiscoveryDocument = response
            .json()
            .await
            .map_err(|e| AppError::IdentityLoad(format!("invalid discovery document: {}", e)))?;

        if self.client_id.is_empty() {
            return Err(AppError::IdentityLoad(
                "cannot construct token client without a client ID".to_string(),
            ));
        }

        tracing::debug!(
            authorization_endpoint = %discovery.authorization_endpoint,
            token_endpoint = %discovery.token_endpoint,
            "Loaded Google OpenID configuration"
        );

        Ok(Arc::new(GoogleTokenClient {
            http: self.http.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scopes: self.scopes.clone(),
            authorization_endpoint: discovery.authorization_endpoint,
            token_endpoint: discovery.token_endpoint,
            redirect_port: self.redirect_port,
            consent_timeout: self.consent_timeout,
            presenter: self.presenter.clone(),
        }))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Consultant> {
        let response = self
            .http
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::SignIn(format!("Failed to fetch user info: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::SignIn(format!(
                "Failed to fetch user info: HTTP {}",
                response.status()
            )));
        }

        let info: GoogleUserInfo = response
            .json()
            .await
            .map_err(|e| AppError::SignIn(format!("Failed to fetch user info: {}", e)))?;

        Ok(Consultant {
            name: info.name.unwrap_or_else(|| info.email.clone()),
            id: info.id,
            email: info.email,
            picture: info.picture.unwrap_or_default(),
        })
    }

    async fn revoke_token(&self, access_token: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoints.revoke)
            .query(&[("token", access_token)])
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .send()
            .await
            .context("token revoke request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(anyhow::anyhow!(
                "token revoke returned HTTP {}: {}",
                status,
                body
            )));
        }

        Ok(())
    }
}

/// Token client produced by [`GoogleIdentity::load_token_client`].
pub struct GoogleTokenClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    scopes: String,
    authorization_endpoint: String,
    token_endpoint: String,
    redirect_port: u16,
    consent_timeout: Duration,
    presenter: Arc<dyn ConsentPresenter>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl GoogleTokenClient {
    fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        pkce: &Pkce,
        prompt: Prompt,
    ) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}&\
             code_challenge={}&\
             code_challenge_method=S256&\
             prompt={}",
            self.authorization_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scopes),
            state,
            pkce.challenge,
            prompt.as_str()
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        pkce: &Pkce,
    ) -> Result<TokenResponse> {
        let mut form = vec![
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
            ("code_verifier", pkce.verifier.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::SignIn(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {}", e.error, desc),
                    None => e.error,
                })
                .unwrap_or_else(|_| format!("HTTP {}", status));
            tracing::error!(error = %message, "OAuth token exchange failed");
            return Err(AppError::SignIn(message));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::SignIn(format!("Invalid token response: {}", e)))
    }
}

#[async_trait]
impl TokenClient for GoogleTokenClient {
    async fn request_access_token(&self, prompt: Prompt) -> Result<TokenResponse> {
        let listener = LoopbackListener::bind(self.redirect_port).await?;
        let redirect_uri = listener.redirect_uri();

        let signer = Arc::new(StateSigner::generate()?);
        let state = signer.issue()?;
        let pkce = Pkce::generate()?;

        let url = self.authorization_url(&redirect_uri, &state, &pkce, prompt);
        tracing::info!(redirect_uri = %redirect_uri, "Waiting for Google consent");
        self.presenter.present(&url);

        let params = listener.wait(self.consent_timeout, signer.clone()).await?;
        let code = authorization_code(params, &signer)?;

        tracing::info!("Exchanging authorization code for tokens");
        self.exchange_code(&code, &redirect_uri, &pkce).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_client() -> GoogleTokenClient {
        GoogleTokenClient {
            http: reqwest::Client::new(),
            client_id: "cid.apps.googleusercontent.com".to_string(),
            client_secret: None,
            scopes: "openid email".to_string(),
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            redirect_port: 0,
            consent_timeout: Duration::from_secs(1),
            presenter: Arc::new(StderrPresenter),
        }
    }

    #[test]
    fn test_authorization_url_parameters() {
        let client = token_client();
        let pkce = Pkce::generate().unwrap();
        let url = client.authorization_url(
            "http://127.0.0.1:5555/callback",
            "STATE",
            &pkce,
            Prompt::Consent,
        );

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A5555%2Fcallback"));
        assert!(url.contains("scope=openid%20email"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("code_challenge={}", pkce.challenge)));
        assert!(url.contains("state=STATE"));
    }
}
