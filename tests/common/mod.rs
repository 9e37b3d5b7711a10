// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use showroom_crm::error::{AppError, Result};
use showroom_crm::models::{Checklist, Consultant, Customer};
use showroom_crm::services::{IdentityProvider, Prompt, TokenClient, TokenResponse};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Scripted stand-in for the Google identity platform.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeIdentity {
    pub fail_load: AtomicBool,
    pub fail_token: AtomicBool,
    pub cancel_token: AtomicBool,
    pub fail_profile: AtomicBool,
    pub fail_revoke: AtomicBool,
    pub load_calls: AtomicUsize,
    pub token_calls: Arc<AtomicUsize>,
    pub revoke_calls: AtomicUsize,
    /// When set, token requests wait until notified.
    pub token_gate: Option<Arc<Notify>>,
}

#[allow(dead_code)]
impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            token_gate: Some(gate),
            ..Self::default()
        }
    }
}

struct FakeTokenClient {
    fail: bool,
    cancel: bool,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl TokenClient for FakeTokenClient {
    async fn request_access_token(&self, prompt: Prompt) -> Result<TokenResponse> {
        assert_eq!(prompt, Prompt::Consent);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.cancel {
            return Err(AppError::SignInCancelled);
        }
        if self.fail {
            return Err(AppError::SignIn("invalid_client".to_string()));
        }
        Ok(TokenResponse {
            access_token: "ya29.fake-token".to_string(),
            expires_in: Some(3599),
            scope: None,
            token_type: Some("Bearer".to_string()),
        })
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn load_token_client(&self) -> Result<Arc<dyn TokenClient>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(AppError::IdentityLoad("script failed to load".to_string()));
        }
        Ok(Arc::new(FakeTokenClient {
            fail: self.fail_token.load(Ordering::SeqCst),
            cancel: self.cancel_token.load(Ordering::SeqCst),
            calls: self.token_calls.clone(),
            gate: self.token_gate.clone(),
        }))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Consultant> {
        assert_eq!(access_token, "ya29.fake-token");
        if self.fail_profile.load(Ordering::SeqCst) {
            return Err(AppError::SignIn("Failed to fetch user info".to_string()));
        }
        Ok(sample_consultant())
    }

    async fn revoke_token(&self, _access_token: &str) -> Result<()> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("network unreachable")));
        }
        Ok(())
    }
}

#[allow(dead_code)]
pub fn sample_consultant() -> Consultant {
    Consultant {
        id: "1234567890".to_string(),
        email: "sam.lim@example.com".to_string(),
        name: "Sam Lim".to_string(),
        picture: "https://example.com/sam.png".to_string(),
    }
}

/// Customer with sensible defaults; `created` orders records.
#[allow(dead_code)]
pub fn customer(id: &str, name: &str, created: DateTime<Utc>) -> Customer {
    Customer {
        id: id.to_string(),
        name: name.to_string(),
        phone: "91234567".to_string(),
        email: None,
        nric: "S1234567A".to_string(),
        dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        occupation: None,
        address: "1 Orchard Road".to_string(),
        address_continue: None,
        sales_consultant: "Sam Lim".to_string(),
        vsa_no: None,
        deal_closed: false,
        checklist: Checklist::default(),
        notes: None,
        drive_folder_link: None,
        created_at: created,
        updated_at: created,
    }
}

#[allow(dead_code)]
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, d, 9, 0, 0).unwrap()
}
