// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Query caching, invalidation and retry behavior.

use async_trait::async_trait;
use chrono::NaiveDate;
use showroom_crm::error::{AppError, Result};
use showroom_crm::models::{
    Checklist, ChecklistKey, CreateCustomerInput, Customer, CustomerStats, UpdateCustomerInput,
};
use showroom_crm::queries::{CustomerQueries, QueryKey, QueryOptions};
use showroom_crm::services::{CustomerService, InMemoryCustomerService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{customer, day};

/// Wraps the in-memory backend, counting reads and failing the first few.
struct CountingService {
    inner: InMemoryCustomerService,
    reads: AtomicUsize,
    failures_left: AtomicUsize,
    failure: fn() -> AppError,
}

impl CountingService {
    fn new(customers: Vec<Customer>) -> Self {
        Self {
            inner: InMemoryCustomerService::with_customers(customers),
            reads: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            failure: || AppError::CustomerApi("HTTP 503 Service Unavailable".to_string()),
        }
    }

    fn failing(mut self, times: usize, failure: fn() -> AppError) -> Self {
        self.failures_left = AtomicUsize::new(times);
        self.failure = failure;
        self
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err((self.failure)());
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerService for CountingService {
    async fn get_all(&self) -> Result<Vec<Customer>> {
        self.read()?;
        self.inner.get_all().await
    }

    async fn get_by_id(&self, customer_id: &str) -> Result<Customer> {
        self.read()?;
        self.inner.get_by_id(customer_id).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>> {
        self.read()?;
        self.inner.search(query).await
    }

    async fn get_stats(&self) -> Result<CustomerStats> {
        self.read()?;
        self.inner.get_stats().await
    }

    async fn create(&self, input: &CreateCustomerInput) -> Result<Customer> {
        self.inner.create(input).await
    }

    async fn update(&self, customer_id: &str, input: &UpdateCustomerInput) -> Result<Customer> {
        self.inner.update(customer_id, input).await
    }

    async fn delete(&self, customer_id: &str) -> Result<()> {
        self.inner.delete(customer_id).await
    }

    async fn update_checklist_item(
        &self,
        customer_id: &str,
        key: ChecklistKey,
        value: bool,
    ) -> Result<Customer> {
        self.inner.update_checklist_item(customer_id, key, value).await
    }
}

fn fast_options() -> QueryOptions {
    QueryOptions {
        retry_base_delay: Duration::from_millis(1),
        max_retry_delay: Duration::from_millis(4),
        ..QueryOptions::default()
    }
}

fn setup(service: CountingService) -> (Arc<CountingService>, CustomerQueries) {
    let service = Arc::new(service);
    let queries = CustomerQueries::with_options(service.clone(), fast_options());
    (service, queries)
}

fn two_customers() -> Vec<Customer> {
    vec![
        customer("c1", "Alice Tan", day(1)),
        customer("c2", "Bob Lee", day(2)),
    ]
}

fn new_customer_input() -> CreateCustomerInput {
    CreateCustomerInput {
        name: "Dana Ong".to_string(),
        phone: "98765432".to_string(),
        email: None,
        nric: "S7654321D".to_string(),
        dob: NaiveDate::from_ymd_opt(1985, 7, 14).unwrap(),
        occupation: Some("Engineer".to_string()),
        address: "2 Marina Way".to_string(),
        address_continue: None,
        sales_consultant: "Sam Lim".to_string(),
        vsa_no: None,
        deal_closed: false,
        notes: None,
        drive_folder_link: None,
        checklist: Checklist::default(),
    }
}

#[tokio::test]
async fn test_fresh_reads_served_from_cache() {
    let (service, queries) = setup(CountingService::new(two_customers()));

    assert_eq!(queries.customers().await.unwrap().len(), 2);
    assert_eq!(queries.customers().await.unwrap().len(), 2);
    assert_eq!(service.reads(), 1);

    queries.customer("c1").await.unwrap();
    queries.customer("c1").await.unwrap();
    assert_eq!(service.reads(), 2);
    assert!(queries
        .cache()
        .is_fresh(&QueryKey::Customer("c1".to_string()), Duration::from_secs(60)));
}

#[tokio::test]
async fn test_stale_entries_refetch() {
    let service = Arc::new(CountingService::new(two_customers()));
    let queries = CustomerQueries::with_options(
        service.clone(),
        QueryOptions {
            stale_time: Duration::ZERO,
            ..fast_options()
        },
    );

    queries.stats().await.unwrap();
    queries.stats().await.unwrap();
    assert_eq!(service.reads(), 2);
}

#[tokio::test]
async fn test_create_invalidates_list_and_stats() {
    let (service, queries) = setup(CountingService::new(two_customers()));

    assert_eq!(queries.stats().await.unwrap().total, 2);
    assert_eq!(queries.customers().await.unwrap().len(), 2);

    let created = queries.create_customer(&new_customer_input()).await.unwrap();
    assert!(!created.id.is_empty());

    assert!(!queries
        .cache()
        .is_fresh(&QueryKey::Customers, Duration::from_secs(60)));
    assert_eq!(queries.customers().await.unwrap().len(), 3);
    assert_eq!(queries.stats().await.unwrap().total, 3);
    assert_eq!(service.reads(), 4);
}

#[tokio::test]
async fn test_update_invalidates_the_edited_customer() {
    let (_service, queries) = setup(CountingService::new(two_customers()));

    queries.customer("c1").await.unwrap();
    queries.customer("c2").await.unwrap();

    let update = UpdateCustomerInput {
        deal_closed: Some(true),
        ..Default::default()
    };
    queries.update_customer("c1", &update).await.unwrap();

    let c1 = queries.customer("c1").await.unwrap().unwrap();
    assert!(c1.deal_closed);
    assert_eq!(queries.stats().await.unwrap().deals_closed, 1);
}

#[tokio::test]
async fn test_delete_invalidates_list() {
    let (_service, queries) = setup(CountingService::new(two_customers()));

    assert_eq!(queries.customers().await.unwrap().len(), 2);
    queries.delete_customer("c2").await.unwrap();
    assert_eq!(queries.customers().await.unwrap().len(), 1);

    let err = queries.delete_customer("c2").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_invalidation_covers_search_results() {
    let (service, queries) = setup(CountingService::new(two_customers()));

    assert_eq!(queries.search("alice").await.unwrap().unwrap().len(), 1);
    assert_eq!(queries.cache().invalidate(&QueryKey::Customers), 1);

    queries.search("alice").await.unwrap();
    assert_eq!(service.reads(), 2);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let (service, queries) = setup(CountingService::new(two_customers()).failing(2, || {
        AppError::CustomerApi("HTTP 503 Service Unavailable".to_string())
    }));

    assert_eq!(queries.customers().await.unwrap().len(), 2);
    assert_eq!(service.reads(), 3);
}

#[tokio::test]
async fn test_retries_give_up_after_three() {
    let (service, queries) =
        setup(CountingService::new(two_customers()).failing(10, || AppError::RateLimited));

    let err = queries.customers().await.unwrap_err();
    assert!(matches!(err, AppError::RateLimited));
    // One attempt plus three retries
    assert_eq!(service.reads(), 4);
    assert!(!queries.cache().contains(&QueryKey::Customers));
}

#[tokio::test]
async fn test_permanent_failures_are_not_retried() {
    let (service, queries) =
        setup(CountingService::new(two_customers()).failing(10, || AppError::Unauthorized));
    assert!(matches!(
        queries.stats().await.unwrap_err(),
        AppError::Unauthorized
    ));
    assert_eq!(service.reads(), 1);

    let (service, queries) = setup(CountingService::new(two_customers()));
    let err = queries.customer("nope").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(service.reads(), 1);
}

#[tokio::test]
async fn test_empty_id_and_query_disable_the_read() {
    let (service, queries) = setup(CountingService::new(two_customers()));

    assert!(queries.customer("").await.unwrap().is_none());
    assert!(queries.search("").await.unwrap().is_none());
    assert_eq!(service.reads(), 0);
}
