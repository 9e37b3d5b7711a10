// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Customer form submission.

use async_trait::async_trait;
use showroom_crm::error::{AppError, Result};
use showroom_crm::models::{
    ChecklistKey, CreateCustomerInput, Customer, CustomerStats, UpdateCustomerInput,
};
use showroom_crm::queries::CustomerQueries;
use showroom_crm::services::{CustomerService, InMemoryCustomerService};
use showroom_crm::views::form::{SUBMIT_ERROR_KEY, SUBMIT_ERROR_MESSAGE};
use showroom_crm::views::CustomerForm;
use std::sync::Arc;

mod common;
use common::{customer, day};

/// Backend whose writes always fail.
struct ReadOnlyService(InMemoryCustomerService);

#[async_trait]
impl CustomerService for ReadOnlyService {
    async fn get_all(&self) -> Result<Vec<Customer>> {
        self.0.get_all().await
    }

    async fn get_by_id(&self, customer_id: &str) -> Result<Customer> {
        self.0.get_by_id(customer_id).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>> {
        self.0.search(query).await
    }

    async fn get_stats(&self) -> Result<CustomerStats> {
        self.0.get_stats().await
    }

    async fn create(&self, _input: &CreateCustomerInput) -> Result<Customer> {
        Err(AppError::CustomerApi("HTTP 500: boom".to_string()))
    }

    async fn update(&self, _id: &str, _input: &UpdateCustomerInput) -> Result<Customer> {
        Err(AppError::CustomerApi("HTTP 500: boom".to_string()))
    }

    async fn delete(&self, _id: &str) -> Result<()> {
        Err(AppError::CustomerApi("HTTP 500: boom".to_string()))
    }

    async fn update_checklist_item(
        &self,
        _id: &str,
        _key: ChecklistKey,
        _value: bool,
    ) -> Result<Customer> {
        Err(AppError::CustomerApi("HTTP 500: boom".to_string()))
    }
}

fn filled_create_form() -> CustomerForm {
    let mut form = CustomerForm::create();
    for (field, value) in [
        ("name", "Dana Ong"),
        ("phone", "9876 5432"),
        ("email", "dana@example.com"),
        ("nric", "s7654321d"),
        ("dob", "14/07/1985"),
        ("address", "2 Marina Way"),
        ("salesConsultant", "Sam Lim"),
    ] {
        form.set_field(field, value).unwrap();
    }
    form
}

#[tokio::test]
async fn test_create_submits_checklist() {
    let service = Arc::new(InMemoryCustomerService::new());
    let queries = CustomerQueries::new(service.clone());

    let mut form = filled_create_form();
    form.set_checklist(ChecklistKey::NricCollected, true);
    let created = form.submit(&queries).await.unwrap();

    assert_eq!(created.nric, "S7654321D");
    assert!(created.checklist.nric_collected);
    assert_eq!(created.checklist.completed(), 1);
    assert!(form.errors.is_empty());
    assert!(!form.submitting);
    assert_eq!(service.len(), 1);
}

#[tokio::test]
async fn test_invalid_fields_block_submission() {
    let service = Arc::new(InMemoryCustomerService::new());
    let queries = CustomerQueries::new(service.clone());

    let mut form = filled_create_form();
    form.set_field("email", "not-an-email").unwrap();
    form.set_field("phone", "12").unwrap();

    let err = form.submit(&queries).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(form.error("email"), Some("Invalid email address"));
    assert_eq!(form.error("phone"), Some("Invalid phone number"));
    assert!(form.error(SUBMIT_ERROR_KEY).is_none());
    assert!(service.is_empty());

    // Fixing a field clears just that error
    form.set_field("email", "dana@example.com").unwrap();
    assert!(form.error("email").is_none());
    assert!(form.error("phone").is_some());
}

#[tokio::test]
async fn test_failed_save_sets_submit_error() {
    let queries = CustomerQueries::new(Arc::new(ReadOnlyService(InMemoryCustomerService::new())));

    let mut form = filled_create_form();
    let err = form.submit(&queries).await.unwrap_err();

    assert!(matches!(err, AppError::CustomerApi(_)));
    assert_eq!(form.error(SUBMIT_ERROR_KEY), Some(SUBMIT_ERROR_MESSAGE));
    assert!(!form.submitting);
    assert!(form.render().contains(SUBMIT_ERROR_MESSAGE));

    // A new attempt starts from a clean slate
    let queries = CustomerQueries::new(Arc::new(InMemoryCustomerService::new()));
    form.submit(&queries).await.unwrap();
    assert!(form.error(SUBMIT_ERROR_KEY).is_none());
}

#[tokio::test]
async fn test_edit_keeps_stored_checklist() {
    let mut existing = customer("c1", "Alice Tan", day(1));
    existing.checklist.vsa_signed = true;
    existing.email = Some("alice@example.com".to_string());
    let service = Arc::new(InMemoryCustomerService::with_customers([existing.clone()]));
    let queries = CustomerQueries::new(service);

    let mut form = CustomerForm::edit(&existing);
    assert_eq!(form.data.dob, "1990-01-01");
    assert_eq!(form.submit_label(), "Save Changes");

    form.set_checklist(ChecklistKey::VsaSigned, false);
    form.set_field("email", "").unwrap();
    form.set_field("occupation", "Teacher").unwrap();
    form.set_deal_closed(true);

    let saved = form.submit(&queries).await.unwrap();
    assert!(saved.checklist.vsa_signed, "edit never sends the checklist");
    assert_eq!(saved.email, None);
    assert_eq!(saved.occupation.as_deref(), Some("Teacher"));
    assert!(saved.deal_closed);
    assert_eq!(saved.created_at, existing.created_at);
}

#[test]
fn test_render_shows_field_errors_and_checklist() {
    let mut form = CustomerForm::create();
    form.errors
        .insert("nric".to_string(), "NRIC must look like S1234567A".to_string());

    let rendered = form.render();
    assert!(rendered.contains("NRIC must look like S1234567A"));
    assert!(!rendered.contains("Format: S1234567A"), "error replaces helper");
    assert!(rendered.contains("Checklist (Show)"));
    assert!(rendered.contains("[ Create Customer ]"));

    form.toggle_checklist_section();
    let rendered = form.render();
    assert!(rendered.contains("Checklist (Hide)"));
    assert!(rendered.contains("[ ] Trade-In Documents Received"));
}
