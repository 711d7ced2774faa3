//! Engine error types.
//!
//! Only input that can never be scheduled and concurrency-guard trips are
//! errors. Sections that cannot be placed are data in the run result.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors surfaced to the caller of a scheduling run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid snapshot: {}", summarize(.0))]
    InvalidSnapshot(Vec<ValidationError>),

    #[error("a scheduling run is already in progress for semester {0}")]
    AlreadyRunning(String),

    #[error("worker pool error: {0}")]
    Pool(String),
}

impl EngineError {
    /// Validation problems, if this is an `InvalidSnapshot` error.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            EngineError::InvalidSnapshot(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
