// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the session, service and view layers.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Google Identity Services not initialized. Call init() first.")]
    NotInitialized,

    #[error("Failed to load Google Identity Services: {0}")]
    IdentityLoad(String),

    #[error("Sign in failed: {0}")]
    SignIn(String),

    #[error("Sign in cancelled by user")]
    SignInCancelled,

    #[error("Another sign in is already in progress")]
    SignInInProgress,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Customer API error: {0}")]
    CustomerApi(String),

    #[error("Customer API rate limit exceeded")]
    RateLimited,

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether a failed read is worth retrying.
    ///
    /// Authentication, lookup and validation failures will fail the same way
    /// on every attempt, so only transport and upstream errors qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::CustomerApi(_) | AppError::RateLimited | AppError::Internal(_)
        )
    }

    /// Whether the error means the user backed out of the consent prompt.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AppError::SignInCancelled)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::CustomerApi(err.to_string())
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
