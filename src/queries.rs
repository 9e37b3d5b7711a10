// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached reads and invalidating writes over a [`CustomerService`].
//!
//! Reads are served from cache while fresh (5 minutes by default) and retried
//! with exponential backoff on transient failures. Every mutation marks the
//! dependent queries stale. Invalidation matches by key prefix, so
//! invalidating `["customers"]` covers every customer query.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::models::{
    ChecklistKey, CreateCustomerInput, Customer, CustomerStats, UpdateCustomerInput,
};
use crate::services::CustomerService;

const ROOT: &str = "customers";

/// Identifies a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Customers,
    Customer(String),
    Stats,
    Search(String),
}

impl QueryKey {
    /// Path segments, e.g. `["customers", "search", "tan"]`.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            QueryKey::Customers => vec![ROOT],
            QueryKey::Customer(id) => vec![ROOT, id],
            QueryKey::Stats => vec![ROOT, "stats"],
            QueryKey::Search(q) => vec![ROOT, "search", q],
        }
    }

    /// Whether `self` falls under `prefix`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        let own = self.segments();
        let prefix = prefix.segments();
        own.len() >= prefix.len() && own.iter().zip(&prefix).all(|(a, b)| a == b)
    }
}

/// Retry and freshness policy.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub stale_time: Duration,
    /// Retries after the first failed attempt.
    pub retry: u32,
    pub retry_base_delay: Duration,
    pub max_retry_delay: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            retry: 3,
            retry_base_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
        }
    }
}

impl QueryOptions {
    /// Delay before retry number `attempt` (0-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_base_delay
            .saturating_mul(factor)
            .min(self.max_retry_delay)
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    List(Vec<Customer>),
    One(Customer),
    Stats(CustomerStats),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    fetched_at: Instant,
    invalidated: bool,
}

/// Query result cache.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: DashMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    fn fresh(&self, key: &QueryKey, stale_time: Duration) -> Option<CachedValue> {
        let entry = self.entries.get(key)?;
        if entry.invalidated || entry.fetched_at.elapsed() >= stale_time {
            return None;
        }
        Some(entry.value.clone())
    }

    fn store(&self, key: QueryKey, value: CachedValue) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Mark every entry under `prefix` stale. Returns how many were marked.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut marked = 0;
        for mut entry in self.entries.iter_mut() {
            if entry.key().starts_with(prefix) {
                entry.invalidated = true;
                marked += 1;
            }
        }
        marked
    }

    /// Whether `key` has a fresh, valid entry.
    pub fn is_fresh(&self, key: &QueryKey, stale_time: Duration) -> bool {
        self.fresh(key, stale_time).is_some()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }
}

/// Customer data access layer used by the views.
#[derive(Clone)]
pub struct CustomerQueries {
    service: Arc<dyn CustomerService>,
    cache: Arc<QueryCache>,
    options: QueryOptions,
}

impl CustomerQueries {
    pub fn new(service: Arc<dyn CustomerService>) -> Self {
        Self::with_options(service, QueryOptions::default())
    }

    pub fn with_options(service: Arc<dyn CustomerService>, options: QueryOptions) -> Self {
        Self {
            service,
            cache: Arc::new(QueryCache::default()),
            options,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run `fetch`, retrying retryable failures per the options.
    async fn with_retry<T, F, Fut>(&self, key: &QueryKey, mut fetch: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.options.retry && e.is_retryable() => {
                    let delay = self.options.retry_delay(attempt);
                    tracing::warn!(
                        query = ?key.segments(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Query failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// All customers.
    pub async fn customers(&self) -> Result<Vec<Customer>> {
        let key = QueryKey::Customers;
        if let Some(CachedValue::List(list)) = self.cache.fresh(&key, self.options.stale_time) {
            return Ok(list);
        }

        let list = self.with_retry(&key, || self.service.get_all()).await?;
        self.cache.store(key, CachedValue::List(list.clone()));
        Ok(list)
    }

    /// One customer. An empty id disables the query and yields `None`.
    pub async fn customer(&self, customer_id: &str) -> Result<Option<Customer>> {
        if customer_id.is_empty() {
            return Ok(None);
        }

        let key = QueryKey::Customer(customer_id.to_string());
        if let Some(CachedValue::One(c)) = self.cache.fresh(&key, self.options.stale_time) {
            return Ok(Some(c));
        }

        let customer = self
            .with_retry(&key, || self.service.get_by_id(customer_id))
            .await?;
        self.cache.store(key, CachedValue::One(customer.clone()));
        Ok(Some(customer))
    }

    /// Server-side search. An empty query disables the query and yields `None`.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<Customer>>> {
        if query.is_empty() {
            return Ok(None);
        }

        let key = QueryKey::Search(query.to_string());
        if let Some(CachedValue::List(list)) = self.cache.fresh(&key, self.options.stale_time) {
            return Ok(Some(list));
        }

        let list = self.with_retry(&key, || self.service.search(query)).await?;
        self.cache.store(key, CachedValue::List(list.clone()));
        Ok(Some(list))
    }

    pub async fn stats(&self) -> Result<CustomerStats> {
        let key = QueryKey::Stats;
        if let Some(CachedValue::Stats(stats)) = self.cache.fresh(&key, self.options.stale_time) {
            return Ok(stats);
        }

        let stats = self.with_retry(&key, || self.service.get_stats()).await?;
        self.cache.store(key, CachedValue::Stats(stats.clone()));
        Ok(stats)
    }

    pub async fn create_customer(&self, input: &CreateCustomerInput) -> Result<Customer> {
        let customer = self.service.create(input).await?;
        self.invalidate(&[QueryKey::Customers, QueryKey::Stats]);
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        customer_id: &str,
        input: &UpdateCustomerInput,
    ) -> Result<Customer> {
        let customer = self.service.update(customer_id, input).await?;
        self.invalidate(&[
            QueryKey::Customers,
            QueryKey::Customer(customer_id.to_string()),
            QueryKey::Stats,
        ]);
        Ok(customer)
    }

    pub async fn delete_customer(&self, customer_id: &str) -> Result<()> {
        self.service.delete(customer_id).await?;
        self.invalidate(&[QueryKey::Customers, QueryKey::Stats]);
        Ok(())
    }

    pub async fn update_checklist_item(
        &self,
        customer_id: &str,
        key: ChecklistKey,
        value: bool,
    ) -> Result<Customer> {
        let customer = self
            .service
            .update_checklist_item(customer_id, key, value)
            .await?;
        self.invalidate(&[
            QueryKey::Customers,
            QueryKey::Customer(customer_id.to_string()),
        ]);
        Ok(customer)
    }

    fn invalidate(&self, keys: &[QueryKey]) {
        for key in keys {
            let marked = self.cache.invalidate(key);
            tracing::debug!(query = ?key.segments(), marked, "Invalidated queries");
        }
    }
}
