//! Typed error hierarchy for the issue tracker.
//!
//! - `ValidationError` — a candidate issue failed the field or status checks
//! - `TrackerError` — anything an API operation can fail with

use thiserror::Error;

use crate::tracker::validate::FieldKind;

/// A candidate issue was rejected before persistence. The `Display` text is
/// the exact message returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required.")]
    MissingField { field: &'static str },

    #[error("{field} must be {expected}.")]
    WrongType {
        field: &'static str,
        expected: FieldKind,
    },

    #[error("{status} is not a valid status.")]
    InvalidStatus { status: String },

    #[error("{detail}")]
    Malformed { detail: String },
}

/// Errors from the issue API and its record store.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Issue {id} not found after insert")]
    IssueMissingAfterInsert { id: String },

    #[error("{0:#}")]
    Store(#[source] anyhow::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TrackerError {
    /// Whether the caller can fix this by correcting the request.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, TrackerError::Validation(_))
    }
}
