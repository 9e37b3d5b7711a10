// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process customer backend used by tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{
    ChecklistKey, CreateCustomerInput, Customer, CustomerStats, UpdateCustomerInput,
};
use crate::services::customers::CustomerService;

/// [`CustomerService`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryCustomerService {
    customers: DashMap<String, Customer>,
}

impl InMemoryCustomerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records.
    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let service = Self::new();
        for customer in customers {
            service.customers.insert(customer.id.clone(), customer);
        }
        service
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    fn not_found(customer_id: &str) -> AppError {
        AppError::NotFound(format!("customer {}", customer_id))
    }
}

#[async_trait]
impl CustomerService for InMemoryCustomerService {
    async fn get_all(&self) -> Result<Vec<Customer>> {
        Ok(self.customers.iter().map(|c| c.value().clone()).collect())
    }

    async fn get_by_id(&self, customer_id: &str) -> Result<Customer> {
        self.customers
            .get(customer_id)
            .map(|c| c.value().clone())
            .ok_or_else(|| Self::not_found(customer_id))
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>> {
        let query = query.trim().to_lowercase();
        Ok(self
            .customers
            .iter()
            .filter(|c| c.matches_search(&query))
            .map(|c| c.value().clone())
            .collect())
    }

    async fn get_stats(&self) -> Result<CustomerStats> {
        let customers: Vec<Customer> = self.get_all().await?;
        Ok(CustomerStats::from_customers(&customers))
    }

    async fn create(&self, input: &CreateCustomerInput) -> Result<Customer> {
        input.validate()?;
        let id = uuid::Uuid::new_v4().to_string();
        let customer = Customer::from_input(id.clone(), input.clone(), Utc::now());
        self.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn update(&self, customer_id: &str, input: &UpdateCustomerInput) -> Result<Customer> {
        input.validate()?;
        let mut entry = self
            .customers
            .get_mut(customer_id)
            .ok_or_else(|| Self::not_found(customer_id))?;
        entry.apply_update(input, Utc::now());
        Ok(entry.clone())
    }

    async fn delete(&self, customer_id: &str) -> Result<()> {
        self.customers
            .remove(customer_id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(customer_id))
    }

    async fn update_checklist_item(
        &self,
        customer_id: &str,
        key: ChecklistKey,
        value: bool,
    ) -> Result<Customer> {
        let mut entry = self
            .customers
            .get_mut(customer_id)
            .ok_or_else(|| Self::not_found(customer_id))?;
        entry.checklist.set(key, value);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
