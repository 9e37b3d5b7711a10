// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session adapter over the identity platform.
//!
//! Holds the access token and consultant profile in memory and mirrors both
//! into [`SessionStorage`] so a restarted client picks the session back up.
//!
//! Lifecycle: `Uninitialized -> Initializing -> SignedOut | SignedIn`.
//! `init` is idempotent. Only one `sign_in` may be pending at a time; a second
//! concurrent call is rejected with [`AppError::SignInInProgress`].

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, OnceCell};

use crate::error::{AppError, Result};
use crate::models::Consultant;
use crate::services::google_identity::{IdentityProvider, Prompt, TokenClient};
use crate::session::storage::{SessionStorage, ACCESS_TOKEN_KEY, CONSULTANT_KEY};

/// Observable adapter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    SignedOut,
    SignedIn,
}

#[derive(Debug, Default)]
struct SessionData {
    access_token: Option<String>,
    consultant: Option<Consultant>,
}

/// Sign-in/sign-out surface used by the rest of the application.
pub struct SessionAdapter {
    identity: Arc<dyn IdentityProvider>,
    storage: Arc<dyn SessionStorage>,
    token_client: OnceCell<Arc<dyn TokenClient>>,
    initializing: RwLock<bool>,
    data: RwLock<SessionData>,
    sign_in_lock: Mutex<()>,
    signed_in_tx: watch::Sender<bool>,
}

impl SessionAdapter {
    pub fn new(identity: Arc<dyn IdentityProvider>, storage: Arc<dyn SessionStorage>) -> Self {
        let (signed_in_tx, _) = watch::channel(false);
        Self {
            identity,
            storage,
            token_client: OnceCell::new(),
            initializing: RwLock::new(false),
            data: RwLock::new(SessionData::default()),
            sign_in_lock: Mutex::new(()),
            signed_in_tx,
        }
    }

    /// Load the identity client and restore any persisted session.
    ///
    /// A second call after success is a no-op. A failed call leaves the
    /// adapter uninitialized so it can be retried.
    pub async fn init(&self) -> Result<()> {
        if self.token_client.initialized() {
            return Ok(());
        }

        self.token_client
            .get_or_try_init(|| async {
                *self.initializing.write() = true;
                let loaded = self.identity.load_token_client().await;
                *self.initializing.write() = false;

                match loaded {
                    Ok(client) => {
                        self.restore();
                        tracing::info!("Google Identity Services initialized");
                        Ok(client)
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Failed to initialize Google Identity Services"
                        );
                        Err(e)
                    }
                }
            })
            .await?;

        self.publish();
        Ok(())
    }

    /// Pick up a persisted profile+token pair, if both are present.
    fn restore(&self) {
        let token = self.read_storage(ACCESS_TOKEN_KEY);
        let stored = self.read_storage(CONSULTANT_KEY);

        let (Some(token), Some(stored)) = (token, stored) else {
            return;
        };

        match serde_json::from_str::<Consultant>(&stored) {
            Ok(consultant) => {
                tracing::debug!(email = %consultant.email, "Restored persisted session");
                let mut data = self.data.write();
                data.access_token = Some(token);
                data.consultant = Some(consultant);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring corrupt persisted profile");
            }
        }
    }

    /// Run the interactive consent flow and establish a session.
    ///
    /// Nothing is stored unless both the token and the profile were obtained.
    pub async fn sign_in(&self) -> Result<Consultant> {
        let token_client = self
            .token_client
            .get()
            .cloned()
            .ok_or(AppError::NotInitialized)?;

        let _guard = self
            .sign_in_lock
            .try_lock()
            .map_err(|_| AppError::SignInInProgress)?;

        let token = token_client
            .request_access_token(Prompt::Consent)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "OAuth error"))?;

        let consultant = self
            .identity
            .fetch_profile(&token.access_token)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch user info"))?;

        let serialized = serde_json::to_string(&consultant)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("serializing profile: {}", e)))?;
        self.storage.set_item(ACCESS_TOKEN_KEY, &token.access_token)?;
        if let Err(e) = self.storage.set_item(CONSULTANT_KEY, &serialized) {
            self.clear_storage();
            return Err(e);
        }

        {
            let mut data = self.data.write();
            data.access_token = Some(token.access_token);
            data.consultant = Some(consultant.clone());
        }

        tracing::info!(email = %consultant.email, "Signed in");
        self.publish();
        Ok(consultant)
    }

    /// Revoke the token (best effort) and clear the session.
    ///
    /// Local state is always cleared, even when the revoke call fails.
    pub async fn sign_out(&self) {
        let token = self.access_token();

        if let Some(token) = token {
            if let Err(e) = self.identity.revoke_token(&token).await {
                tracing::warn!(error = %e, "Token revoke failed, clearing local session anyway");
            }
        }

        *self.data.write() = SessionData::default();
        self.clear_storage();

        tracing::info!("Signed out");
        self.publish();
    }

    fn clear_storage(&self) {
        for key in [CONSULTANT_KEY, ACCESS_TOKEN_KEY] {
            if let Err(e) = self.storage.remove_item(key) {
                tracing::warn!(key, error = %e, "Failed to clear persisted session");
            }
        }
    }

    /// Whether both a profile and a token are held in memory.
    pub fn is_signed_in(&self) -> bool {
        let data = self.data.read();
        data.consultant.is_some() && data.access_token.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.token_client.initialized()
    }

    pub fn state(&self) -> SessionState {
        if self.is_initialized() {
            if self.is_signed_in() {
                SessionState::SignedIn
            } else {
                SessionState::SignedOut
            }
        } else if *self.initializing.read() {
            SessionState::Initializing
        } else {
            SessionState::Uninitialized
        }
    }

    /// Current profile, falling back to persisted storage.
    pub fn current_consultant(&self) -> Option<Consultant> {
        if let Some(consultant) = self.data.read().consultant.clone() {
            return Some(consultant);
        }

        let stored = self.read_storage(CONSULTANT_KEY)?;
        let consultant: Consultant = serde_json::from_str(&stored).ok()?;
        self.data.write().consultant = Some(consultant.clone());
        Some(consultant)
    }

    /// Current access token, falling back to persisted storage.
    pub fn access_token(&self) -> Option<String> {
        if let Some(token) = self.data.read().access_token.clone() {
            return Some(token);
        }

        let stored = self.read_storage(ACCESS_TOKEN_KEY)?;
        self.data.write().access_token = Some(stored.clone());
        Some(stored)
    }

    /// Receiver that always holds the latest signed-in flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signed_in_tx.subscribe()
    }

    fn publish(&self) {
        self.signed_in_tx.send_replace(self.is_signed_in());
    }

    fn read_storage(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read persisted session");
                None
            }
        }
    }
}
