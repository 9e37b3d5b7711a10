// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Showroom CRM: customer records for vehicle sales consultants
//!
//! Consultants sign in with Google, then list, search, create, edit and
//! delete customer records held by the customer API, tracking a per-record
//! checklist and a linked Google Drive folder.

pub mod config;
pub mod error;
pub mod models;
pub mod queries;
pub mod services;
pub mod session;
pub mod time_utils;
pub mod views;

use std::sync::Arc;

use config::Config;
use error::Result;
use queries::CustomerQueries;
use services::{CustomerService, HttpCustomerService, IdentityProvider};
use session::{SessionAdapter, SessionStorage};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionAdapter>,
    pub queries: CustomerQueries,
}

impl AppState {
    /// Wire the session to the HTTP customer API.
    pub fn new(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self> {
        let session = Arc::new(SessionAdapter::new(identity, storage));
        let service = HttpCustomerService::with_timeout(
            &config.customer_api_url,
            session.clone(),
            config.customer_api_timeout,
        )?;
        Ok(Self::with_service(config, session, Arc::new(service)))
    }

    /// Use an explicit customer backend.
    pub fn with_service(
        config: Config,
        session: Arc<SessionAdapter>,
        service: Arc<dyn CustomerService>,
    ) -> Self {
        Self {
            config,
            session,
            queries: CustomerQueries::new(service),
        }
    }
}
