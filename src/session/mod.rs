// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consultant session: identity adapter plus its persisted storage.

pub mod adapter;
pub mod storage;

pub use adapter::{SessionAdapter, SessionState};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
