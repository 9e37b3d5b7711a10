// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod consultant;
pub mod customer;

pub use consultant::Consultant;
pub use customer::{
    Checklist, ChecklistKey, CreateCustomerInput, Customer, CustomerStats, UpdateCustomerInput,
};
