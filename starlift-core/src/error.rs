// starlift-core/src/error.rs

use crate::domain::error::DomainError;
use crate::domain::quality::QualityFailure;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarliftError {
    // --- DOMAIN ERRORS (templates, cycles, invalid config values) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (DB, IO, parsing) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- LOAD ERRORS (a statement failed against a specific table) ---
    #[error("Load failed during '{stage}' on table '{table}': {source}")]
    Load {
        stage: &'static str,
        table: String,
        #[source]
        source: Box<StarliftError>,
    },

    // --- QUALITY GATE (at least one check failed) ---
    #[error(transparent)]
    Quality(#[from] QualityFailure),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    Internal(String),
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for StarliftError {
    fn from(err: std::io::Error) -> Self {
        StarliftError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl StarliftError {
    /// Whether the graph retry policy may re-attempt the failed task.
    ///
    /// Misconfiguration and unresolved templates are deterministic: retrying
    /// cannot fix a missing parameter. Statement failures and a failed quality
    /// gate may be transient (a reload can self-resolve an upstream data
    /// issue), so those stay eligible.
    pub fn is_retryable(&self) -> bool {
        match self {
            StarliftError::Domain(_) => false,
            StarliftError::Infrastructure(e) => {
                matches!(e, InfrastructureError::Database(_))
            }
            StarliftError::Load { .. } => true,
            StarliftError::Quality(_) => true,
            StarliftError::Internal(_) => false,
        }
    }
}
