// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external integrations.

pub mod consent;
pub mod customers;
pub mod google_identity;
pub mod memory;

pub use customers::{CustomerService, HttpCustomerService};
pub use google_identity::{GoogleIdentity, IdentityProvider, Prompt, TokenClient, TokenResponse};
pub use memory::InMemoryCustomerService;
