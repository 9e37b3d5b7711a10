// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Customer list: client-side search, status filter and ordering.

use clap::ValueEnum;
use std::fmt::Write as _;

use crate::models::Customer;
use crate::views::components::{Card, LoadingSpinner, SpinnerSize};

/// Avatar background palette.
const AVATAR_COLORS: [&str; 8] = [
    "#00BCD4", "#E91E63", "#9C27B0", "#673AB7", "#3F51B5", "#2196F3", "#00BCD4", "#009688",
];

/// Deal status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl StatusFilter {
    pub fn accepts(&self, customer: &Customer) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => !customer.deal_closed,
            StatusFilter::Closed => customer.deal_closed,
        }
    }
}

/// Filter by search text and status, newest first.
///
/// Search is a case-insensitive substring match on name, phone, email, NRIC
/// and VSA number. Blank search text matches everything.
pub fn filter_customers(
    customers: &[Customer],
    query: &str,
    status: StatusFilter,
) -> Vec<Customer> {
    let query = query.trim().to_lowercase();

    let mut filtered: Vec<Customer> = customers
        .iter()
        .filter(|c| status.accepts(c))
        .filter(|c| query.is_empty() || c.matches_search(&query))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    filtered
}

/// Up to two uppercase initials from the first letters of each word.
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

/// Avatar colour derived from the first character of the name.
pub fn avatar_color(name: &str) -> &'static str {
    let code = name.encode_utf16().next().unwrap_or(0) as usize;
    AVATAR_COLORS[code % AVATAR_COLORS.len()]
}

/// What to show when the filtered list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// Customers exist but the search or status filter hides all of them.
    NoMatches,
    /// The consultant has no customers at all.
    NoCustomers,
}

/// List view state.
#[derive(Debug, Clone, Default)]
pub struct CustomerListView {
    pub search_query: String,
    pub status: StatusFilter,
    pub selected_id: Option<String>,
}

impl CustomerListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
    }

    pub fn select(&mut self, customer_id: impl Into<String>) {
        self.selected_id = Some(customer_id.into());
    }

    pub fn visible(&self, customers: &[Customer]) -> Vec<Customer> {
        filter_customers(customers, &self.search_query, self.status)
    }

    /// Which message to show for an empty list, given the unfiltered
    /// `customers`.
    pub fn empty_state(&self, customers: &[Customer]) -> EmptyState {
        if customers.is_empty() {
            EmptyState::NoCustomers
        } else {
            EmptyState::NoMatches
        }
    }

    /// Plain-text rendering of the list.
    pub fn render(&self, customers: &[Customer]) -> String {
        let visible = self.visible(customers);
        let mut body = String::new();

        if visible.is_empty() {
            match self.empty_state(customers) {
                EmptyState::NoMatches => body.push_str(
                    "No customers found\n(clear the search or status filter to see everyone)",
                ),
                EmptyState::NoCustomers => {
                    body.push_str("No customers yet\n(create your first customer with `create`)")
                }
            }
        } else {
            for c in &visible {
                let marker = if self.selected_id.as_deref() == Some(c.id.as_str()) {
                    '>'
                } else {
                    ' '
                };
                let status = if c.deal_closed { "closed" } else { "open" };
                let _ = writeln!(
                    body,
                    "{} [{:<2}] {:<28} {:<14} {:<6} {}",
                    marker,
                    initials(&c.name),
                    c.name,
                    c.phone,
                    status,
                    c.id
                );
            }
        }

        Card::new(body.trim_end())
            .header(format!("Customer List ({})", visible.len()))
            .render()
    }

    /// Placeholder shown while the list loads.
    pub fn render_loading() -> String {
        LoadingSpinner::new().size(SpinnerSize::Medium).render()
    }
}
