//! Error taxonomy for quiz assembly and session handling.
//!
//! Only some of these ever reach a caller. `DataUnavailable` is absorbed by the
//! assembler (the pool degrades to empty) and `Persistence` is absorbed by the
//! session (the run continues without durability). Nothing is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    /// A pool could not be loaded or parsed.
    #[error("pool `{domain}` unavailable: {reason}")]
    DataUnavailable { domain: String, reason: String },

    /// The chosen pools hold no questions, or every pool is exhausted.
    #[error("no quiz could be generated: no questions available for the selected domains")]
    NoCapacity,

    /// A strict-capacity request asks for more than a pool holds.
    #[error("requested {requested} questions from `{domain}` but only {available} are available")]
    OverRequest {
        domain: String,
        requested: usize,
        available: usize,
    },

    /// Snapshot serialization or storage failed.
    #[error("snapshot persistence failed: {0}")]
    Persistence(String),

    /// The caller asked for something the current state does not allow.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for QuizError {
    fn from(err: figment::Error) -> Self {
        QuizError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
