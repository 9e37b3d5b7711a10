// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Customer details: sectioned display, checklist toggling and deletion.

use std::fmt::Write as _;

use crate::error::Result;
use crate::models::{ChecklistKey, Customer};
use crate::queries::CustomerQueries;
use crate::time_utils::{format_date, format_local_datetime};
use crate::views::components::{Card, LoadingSpinner, SpinnerSize};

/// Badge text for the deal status.
pub fn deal_badge(customer: &Customer) -> &'static str {
    if customer.deal_closed {
        "Deal Closed"
    } else {
        "Deal Open"
    }
}

/// One titled block of label/value rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSection {
    pub title: &'static str,
    pub fields: Vec<(&'static str, String)>,
}

/// Sections in display order. Optional values that are absent are omitted,
/// as are whole sections with nothing to show.
pub fn sections(customer: &Customer) -> Vec<DetailSection> {
    let mut personal = vec![("Phone", customer.phone.clone())];
    if let Some(email) = &customer.email {
        personal.push(("Email", email.clone()));
    }
    personal.push(("NRIC", customer.nric.clone()));
    personal.push(("Date of Birth", format_date(customer.dob)));
    if let Some(occupation) = &customer.occupation {
        personal.push(("Occupation", occupation.clone()));
    }

    let mut address = vec![("Address", customer.address.clone())];
    if let Some(cont) = &customer.address_continue {
        address.push(("", cont.clone()));
    }

    let mut sales = vec![("Sales Consultant", customer.sales_consultant.clone())];
    if let Some(vsa) = &customer.vsa_no {
        sales.push(("VSA Number", vsa.clone()));
    }

    let checklist = customer
        .checklist
        .iter()
        .map(|(key, done)| (key.label(), if done { "[x]" } else { "[ ]" }.to_string()))
        .collect();

    let mut out = vec![
        DetailSection {
            title: "Personal Information",
            fields: personal,
        },
        DetailSection {
            title: "Address",
            fields: address,
        },
        DetailSection {
            title: "Sales Information",
            fields: sales,
        },
        DetailSection {
            title: "Checklist",
            fields: checklist,
        },
    ];

    if let Some(notes) = &customer.notes {
        out.push(DetailSection {
            title: "Notes",
            fields: vec![("", notes.clone())],
        });
    }

    if let Some(link) = &customer.drive_folder_link {
        out.push(DetailSection {
            title: "Google Drive",
            fields: vec![("Folder", link.clone())],
        });
    }

    out.push(DetailSection {
        title: "Record Information",
        fields: vec![
            ("Created", format_local_datetime(customer.created_at)),
            ("Last Updated", format_local_datetime(customer.updated_at)),
        ],
    });

    out
}

/// Details view state for one customer.
#[derive(Debug, Clone)]
pub struct CustomerDetailsView {
    pub customer_id: String,
    pub show_delete_modal: bool,
}

impl CustomerDetailsView {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            show_delete_modal: false,
        }
    }

    pub fn request_delete(&mut self) {
        self.show_delete_modal = true;
    }

    pub fn cancel_delete(&mut self) {
        self.show_delete_modal = false;
    }

    /// Delete after confirmation. The modal stays open if deletion fails.
    pub async fn confirm_delete(&mut self, queries: &CustomerQueries) -> Result<()> {
        match queries.delete_customer(&self.customer_id).await {
            Ok(()) => {
                self.show_delete_modal = false;
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    customer_id = %self.customer_id,
                    error = %e,
                    "Failed to delete customer"
                );
                Err(e)
            }
        }
    }

    /// Set one checklist flag; the other four are left untouched.
    pub async fn toggle_checklist(
        &self,
        queries: &CustomerQueries,
        key: ChecklistKey,
        value: bool,
    ) -> Result<Customer> {
        queries
            .update_checklist_item(&self.customer_id, key, value)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    customer_id = %self.customer_id,
                    key = %key,
                    error = %e,
                    "Failed to update checklist"
                )
            })
    }

    pub fn render(&self, customer: &Customer) -> String {
        let mut body = String::new();
        for section in sections(customer) {
            let _ = writeln!(body, "{}", section.title);
            for (label, value) in &section.fields {
                if label.is_empty() {
                    let _ = writeln!(body, "  {}", value);
                } else {
                    let _ = writeln!(body, "  {:<18} {}", label, value);
                }
            }
            body.push('\n');
        }

        let mut card = Card::new(body.trim_end()).header(format!(
            "{}  [{}]",
            customer.name,
            deal_badge(customer)
        ));

        if self.show_delete_modal {
            card = card.footer(format!(
                "Are you sure you want to delete {}? This action cannot be undone.",
                customer.name
            ));
        }

        card.render()
    }

    pub fn render_loading() -> String {
        LoadingSpinner::new()
            .size(SpinnerSize::Large)
            .label("Loading customer details...")
            .render()
    }

    pub fn render_error() -> String {
        "Error loading customer details. Please try again.".to_string()
    }
}
