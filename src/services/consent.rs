// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interactive OAuth consent over a loopback redirect.
//!
//! The consent screen runs in the user's browser. Google redirects back to a
//! short-lived listener on 127.0.0.1 carrying the authorization code and the
//! `state` we issued. State is HMAC-signed with a per-request key and the code
//! is bound to the request with PKCE (S256).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const CALLBACK_PATH: &str = "/callback";

/// Signed state older than this is rejected even if the signature matches.
const MAX_STATE_AGE: Duration = Duration::from_secs(15 * 60);

/// Shows the authorization URL to the user.
pub trait ConsentPresenter: Send + Sync {
    fn present(&self, authorization_url: &str);
}

/// Prints the authorization URL on stderr.
pub struct StderrPresenter;

impl ConsentPresenter for StderrPresenter {
    fn present(&self, authorization_url: &str) {
        eprintln!("Open this URL in your browser to sign in:\n\n  {authorization_url}\n");
    }
}

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Issues and verifies the OAuth `state` parameter.
pub struct StateSigner {
    key: [u8; 32],
}

impl StateSigner {
    /// Signer with a fresh random key.
    pub fn generate() -> Result<Self> {
        Ok(Self {
            key: random_bytes::<32>()?,
        })
    }

    /// Signed state: base64url("nonce_hex|timestamp_hex|signature_hex").
    pub fn issue(&self) -> Result<String> {
        let nonce = hex::encode(random_bytes::<16>()?);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_millis();

        let payload = format!("{}|{:x}", nonce, timestamp);
        let signature = hex::encode(self.sign(&payload)?);
        Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
    }

    /// Check the signature in constant time, then the age.
    pub fn verify(&self, state: &str) -> bool {
        let Some((payload, signature)) = decode_state(state) else {
            return false;
        };

        let Ok(expected) = self.sign(&payload) else {
            return false;
        };
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };

        if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            tracing::error!("OAuth state signature mismatch! Potential tampering.");
            return false;
        }

        let issued_ms = payload
            .rsplit('|')
            .next()
            .and_then(|ts| u128::from_str_radix(ts, 16).ok());
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        match issued_ms {
            Some(issued) => now_ms.saturating_sub(issued) <= MAX_STATE_AGE.as_millis(),
            None => false,
        }
    }

    fn sign(&self, payload: &str) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Split a decoded state into (payload, signature_hex).
fn decode_state(state: &str) -> Option<(String, String)> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    Some((format!("{}|{}", parts[0], parts[1]), parts[2].to_string()))
}

/// PKCE verifier/challenge pair.
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Result<Self> {
        let verifier = URL_SAFE_NO_PAD.encode(random_bytes::<32>()?);
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Ok(Self {
            verifier,
            challenge,
        })
    }
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("OS randomness unavailable: {}", e)))?;
    Ok(buf)
}

#[derive(Clone)]
struct CallbackState {
    slot: Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>,
    signer: Arc<StateSigner>,
}

/// Router serving the redirect endpoint. The first callback whose `state`
/// verifies against `signer` is forwarded to `sender`. Callbacks with a bad
/// state are answered with 400 and leave the flow waiting.
pub fn callback_router(
    sender: oneshot::Sender<CallbackParams>,
    signer: Arc<StateSigner>,
) -> Router {
    let state = CallbackState {
        slot: Arc::new(Mutex::new(Some(sender))),
        signer,
    };
    Router::new()
        .route(CALLBACK_PATH, get(handle_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    if !params.state.as_deref().is_some_and(|s| state.signer.verify(s)) {
        tracing::warn!("Ignoring redirect with invalid OAuth state");
        return (
            StatusCode::BAD_REQUEST,
            Html("<h1>Invalid sign-in request</h1><p>Start again from the terminal.</p>"),
        );
    }

    let cancelled = params.error.is_some();
    if let Some(sender) = state.slot.lock().take() {
        // Receiver gone means the flow already timed out
        let _ = sender.send(params);
    }

    let page = if cancelled {
        "<h1>Sign in cancelled</h1><p>You can close this window.</p>"
    } else {
        "<h1>Signed in</h1><p>You can close this window and return to the terminal.</p>"
    };
    (StatusCode::OK, Html(page))
}

/// A bound loopback listener waiting for one redirect.
pub struct LoopbackListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackListener {
    /// Bind on 127.0.0.1. Port 0 picks a free port.
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .await
            .map_err(|e| AppError::SignIn(format!("Failed to bind redirect listener: {}", e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AppError::SignIn(format!("Failed to read listener address: {}", e)))?;

        Ok(Self { listener, addr })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://{}{}", self.addr, CALLBACK_PATH)
    }

    /// Serve until a callback carrying state issued by `signer` arrives or
    /// `timeout` elapses.
    pub async fn wait(
        self,
        timeout: Duration,
        signer: Arc<StateSigner>,
    ) -> Result<CallbackParams> {
        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = callback_router(tx, signer);
        let server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let outcome = tokio::time::timeout(timeout, rx).await;

        let _ = shutdown_tx.send(());
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Redirect listener failed"),
            Err(e) => tracing::warn!(error = %e, "Redirect listener task failed"),
        }

        match outcome {
            Ok(Ok(params)) => Ok(params),
            Ok(Err(_)) => Err(AppError::SignIn("Redirect listener closed".to_string())),
            Err(_) => Err(AppError::SignIn(
                "Timed out waiting for the consent screen".to_string(),
            )),
        }
    }
}

/// Turn a redirect into an authorization code. State is checked before the
/// error so a forged redirect cannot cancel the flow.
pub fn authorization_code(params: CallbackParams, signer: &StateSigner) -> Result<String> {
    let state_ok = params.state.as_deref().is_some_and(|s| signer.verify(s));
    if !state_ok {
        return Err(AppError::SignIn("Invalid OAuth state".to_string()));
    }

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Err(if error == "access_denied" {
            AppError::SignInCancelled
        } else {
            AppError::SignIn(error)
        });
    }

    params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::SignIn("Missing authorization code".to_string()))
}
