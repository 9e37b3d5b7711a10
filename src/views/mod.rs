// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Presentation layer: view state plus plain-text rendering.

pub mod components;
pub mod details;
pub mod form;
pub mod list;

pub use details::CustomerDetailsView;
pub use form::{CustomerForm, FormMode};
pub use list::{filter_customers, CustomerListView, StatusFilter};
