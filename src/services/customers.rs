// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Customer API client.
//!
//! Every call is authorized with the session's Google access token. Requests
//! without a session fail with [`AppError::Unauthorized`] before hitting the
//! network.

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{
    ChecklistKey, CreateCustomerInput, Customer, CustomerStats, UpdateCustomerInput,
};
use crate::session::SessionAdapter;

/// Read/write contract of the external customer service.
#[async_trait]
pub trait CustomerService: Send + Sync {
    /// All customers belonging to the signed-in consultant.
    async fn get_all(&self) -> Result<Vec<Customer>>;
    async fn get_by_id(&self, customer_id: &str) -> Result<Customer>;
    async fn search(&self, query: &str) -> Result<Vec<Customer>>;
    async fn get_stats(&self) -> Result<CustomerStats>;
    async fn create(&self, input: &CreateCustomerInput) -> Result<Customer>;
    async fn update(&self, customer_id: &str, input: &UpdateCustomerInput) -> Result<Customer>;
    async fn delete(&self, customer_id: &str) -> Result<()>;
    /// Set a single checklist flag.
    async fn update_checklist_item(
        &self,
        customer_id: &str,
        key: ChecklistKey,
        value: bool,
    ) -> Result<Customer>;
}

#[derive(Serialize)]
struct ChecklistItemUpdate {
    key: ChecklistKey,
    value: bool,
}

/// HTTP implementation of [`CustomerService`].
#[derive(Clone)]
pub struct HttpCustomerService {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionAdapter>,
}

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpCustomerService {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionAdapter>) -> Result<Self> {
        Self::with_timeout(base_url, session, DEFAULT_HTTP_TIMEOUT)
    }

    /// Client whose requests fail with [`AppError::CustomerApi`] after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        session: Arc<SessionAdapter>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building customer API HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/customers{}", self.base_url, path)
    }

    fn token(&self) -> Result<String> {
        self.session.access_token().ok_or(AppError::Unauthorized)
    }

    fn customer_path(customer_id: &str) -> Result<String> {
        if customer_id.trim().is_empty() {
            return Err(AppError::BadRequest("customer id is required".to_string()));
        }
        Ok(format!("/{}", urlencoding::encode(customer_id)))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.bearer_auth(self.token()?).send().await?;
        check_response_json(response).await
    }
}

#[async_trait]
impl CustomerService for HttpCustomerService {
    async fn get_all(&self) -> Result<Vec<Customer>> {
        self.send_json(self.http.get(self.url(""))).await
    }

    async fn get_by_id(&self, customer_id: &str) -> Result<Customer> {
        let path = Self::customer_path(customer_id)?;
        self.send_json(self.http.get(self.url(&path))).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>> {
        self.send_json(self.http.get(self.url("/search")).query(&[("q", query)]))
            .await
    }

    async fn get_stats(&self) -> Result<CustomerStats> {
        self.send_json(self.http.get(self.url("/stats"))).await
    }

    async fn create(&self, input: &CreateCustomerInput) -> Result<Customer> {
        input.validate()?;
        let customer: Customer = self
            .send_json(self.http.post(self.url("")).json(input))
            .await?;
        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    async fn update(&self, customer_id: &str, input: &UpdateCustomerInput) -> Result<Customer> {
        input.validate()?;
        let path = Self::customer_path(customer_id)?;
        self.send_json(self.http.patch(self.url(&path)).json(input))
            .await
    }

    async fn delete(&self, customer_id: &str) -> Result<()> {
        let path = Self::customer_path(customer_id)?;
        let response = self
            .http
            .delete(self.url(&path))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        check_response(response).await?;
        tracing::info!(customer_id, "Customer deleted");
        Ok(())
    }

    async fn update_checklist_item(
        &self,
        customer_id: &str,
        key: ChecklistKey,
        value: bool,
    ) -> Result<Customer> {
        let path = format!("{}/checklist", Self::customer_path(customer_id)?);
        self.send_json(
            self.http
                .patch(self.url(&path))
                .json(&ChecklistItemUpdate { key, value }),
        )
        .await
    }
}

/// Map a non-success status to an error.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => AppError::Unauthorized,
        404 => AppError::NotFound(if body.is_empty() {
            "customer".to_string()
        } else {
            body
        }),
        400 | 422 => AppError::BadRequest(body),
        429 => {
            tracing::warn!("Customer API rate limit hit (429)");
            AppError::RateLimited
        }
        _ => AppError::CustomerApi(format!("HTTP {}: {}", status, body)),
    })
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    check_response(response)
        .await?
        .json()
        .await
        .map_err(|e| AppError::CustomerApi(format!("JSON parse error: {}", e)))
}
