//! Error type for the diagram store.
//!
//! Only two things fail hard: asking the builder to hang new elements off an
//! anchor that does not exist, and snapshot persistence (including a bad
//! snapshot name). Lookups that tolerate
//! absence return `None`, `false` or an empty string instead.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The anchor element for a new diagram is missing, or is not an element
    /// of the kind the diagram expects as its parent.
    #[error("{kind} element {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A snapshot name that is not a plain file stem.
    #[error("invalid snapshot name '{0}': use letters, digits, '-' and '_' (and not 'settings')")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
