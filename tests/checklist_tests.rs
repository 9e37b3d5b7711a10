// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checklist toggling through the details view.

use showroom_crm::error::AppError;
use showroom_crm::models::{Checklist, ChecklistKey, CustomerStats};
use showroom_crm::queries::CustomerQueries;
use showroom_crm::services::InMemoryCustomerService;
use showroom_crm::views::details::sections;
use showroom_crm::views::CustomerDetailsView;
use std::sync::Arc;

mod common;
use common::{customer, day};

fn queries_with_checklist(checklist: Checklist) -> CustomerQueries {
    let mut c = customer("c1", "Alice Tan", day(1));
    c.checklist = checklist;
    CustomerQueries::new(Arc::new(InMemoryCustomerService::with_customers([c])))
}

#[tokio::test]
async fn test_toggle_changes_only_one_flag() {
    let before = Checklist {
        nric_collected: true,
        test_drive_completed: false,
        vsa_signed: true,
        trade_in_documents: false,
        payment_received: false,
    };

    for key in ChecklistKey::ALL {
        let queries = queries_with_checklist(before);
        let view = CustomerDetailsView::new("c1");
        let value = !before.get(key);

        let updated = view.toggle_checklist(&queries, key, value).await.unwrap();

        assert_eq!(updated.checklist, before.with(key, value), "toggling {key}");
        for other in ChecklistKey::ALL.into_iter().filter(|k| *k != key) {
            assert_eq!(updated.checklist.get(other), before.get(other));
        }
    }
}

#[tokio::test]
async fn test_toggle_is_visible_on_next_read() {
    let queries = queries_with_checklist(Checklist::default());
    let view = CustomerDetailsView::new("c1");

    // Warm the cache so the next read has to notice the invalidation
    assert!(!queries.customer("c1").await.unwrap().unwrap().checklist.vsa_signed);

    view.toggle_checklist(&queries, ChecklistKey::VsaSigned, true)
        .await
        .unwrap();

    let reread = queries.customer("c1").await.unwrap().unwrap();
    assert!(reread.checklist.vsa_signed);
    assert_eq!(reread.checklist.completed(), 1);
}

#[tokio::test]
async fn test_toggle_unknown_customer_fails() {
    let queries = queries_with_checklist(Checklist::default());
    let view = CustomerDetailsView::new("missing");

    let err = view
        .toggle_checklist(&queries, ChecklistKey::PaymentReceived, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_complete_checklist_counted_in_stats() {
    let all_done = ChecklistKey::ALL
        .into_iter()
        .fold(Checklist::default(), |c, k| c.with(k, true));
    let queries = queries_with_checklist(all_done.with(ChecklistKey::PaymentReceived, false));
    let view = CustomerDetailsView::new("c1");

    assert_eq!(queries.stats().await.unwrap().checklist_complete, 0);

    view.toggle_checklist(&queries, ChecklistKey::PaymentReceived, true)
        .await
        .unwrap();

    // Stats sit under the customers prefix, so they refetch as well
    assert_eq!(queries.stats().await.unwrap().checklist_complete, 1);
    let local = CustomerStats::from_customers(&queries.customers().await.unwrap());
    assert_eq!(local.checklist_complete, 1);
}

#[test]
fn test_checklist_section_lists_all_five() {
    let c = customer("c1", "Alice Tan", day(1));
    let checklist = sections(&c)
        .into_iter()
        .find(|s| s.title == "Checklist")
        .unwrap();

    let labels: Vec<&str> = checklist.fields.iter().map(|(label, _)| *label).collect();
    assert_eq!(
        labels,
        [
            "NRIC Collected",
            "Test Drive Completed",
            "VSA Signed",
            "Trade-In Documents Received",
            "Payment Received"
        ]
    );
    assert!(checklist.fields.iter().all(|(_, v)| v == "[ ]"));
}
