//! Error types for query diagnostics
//!
//! Every failure in this crate is fatal for the investigation that raised it.
//! The engine is a one-shot diagnostic instrument, so nothing here is retried;
//! retry policy, if any, belongs to the caller.
//!
//! # Error Codes
//!
//! Each variant carries a stable code (e.g. `UNKNOWN_INDEX_TYPE`) that callers
//! can switch on without parsing messages.
//!
//! # Example
//!
//! ```rust
//! use querydiag_core::error::{DiagnosticsError, ErrorCategory};
//!
//! fn handle_error(err: DiagnosticsError) {
//!     match err.category() {
//!         ErrorCategory::Plan => println!("Plan could not be classified"),
//!         ErrorCategory::Registry => println!("Registry needs a new index type"),
//!         ErrorCategory::Engine => println!("Query engine failed"),
//!         ErrorCategory::Input => println!("Bad fixture or config"),
//!     }
//!     assert!(!err.is_recoverable());
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::QueryPhase;

/// Result type alias for diagnostics operations
pub type Result<T> = std::result::Result<T, DiagnosticsError>;

/// Boxed error produced by a query engine collaborator
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The explain plan text is malformed
    Plan,
    /// The plan names an index the registry does not know
    Registry,
    /// The external query engine failed
    Engine,
    /// Fixture, configuration or serialization input was invalid
    Input,
}

/// Errors that can occur while investigating a query
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    // ═══════════════════════════════════════════════════════════════════════
    // Plan classification
    // ═══════════════════════════════════════════════════════════════════════

    /// Plan text is empty or lacks the index annotation marker
    #[error("Invalid query plan format: {reason}")]
    InvalidPlanFormat { reason: String },

    /// Plan annotation matches no registered index descriptor
    #[error("Unknown index type in query plan: '{identifier}'. Register a descriptor for this index.")]
    UnknownIndexType { identifier: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Query engine
    // ═══════════════════════════════════════════════════════════════════════

    /// The query engine failed during one of the investigated phases
    #[error("Query engine failed during {phase}: {source}")]
    QueryExecution {
        phase: QueryPhase,
        #[source]
        source: EngineError,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Input plumbing (fixtures, config files)
    // ═══════════════════════════════════════════════════════════════════════

    /// Fixture or config file could not be read
    #[error("Failed to load '{path}': {reason}")]
    FixtureLoad { path: String, reason: String },

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiagnosticsError {
    /// Wrap an engine failure for the given phase
    pub fn engine(phase: QueryPhase, source: impl Into<EngineError>) -> Self {
        DiagnosticsError::QueryExecution {
            phase,
            source: source.into(),
        }
    }

    /// Always false: no diagnostics error succeeds on retry
    pub fn is_recoverable(&self) -> bool {
        false
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            DiagnosticsError::InvalidPlanFormat { .. } => ErrorCategory::Plan,
            DiagnosticsError::UnknownIndexType { .. } => ErrorCategory::Registry,
            DiagnosticsError::QueryExecution { .. } => ErrorCategory::Engine,
            DiagnosticsError::FixtureLoad { .. } | DiagnosticsError::Json(_) => ErrorCategory::Input,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            DiagnosticsError::InvalidPlanFormat { .. } => "INVALID_PLAN_FORMAT",
            DiagnosticsError::UnknownIndexType { .. } => "UNKNOWN_INDEX_TYPE",
            DiagnosticsError::QueryExecution { .. } => "QUERY_EXECUTION_FAILURE",
            DiagnosticsError::FixtureLoad { .. } => "FIXTURE_LOAD_ERROR",
            DiagnosticsError::Json(_) => "JSON_ERROR",
        }
    }

    /// The engine phase that failed, if this is an engine error
    pub fn phase(&self) -> Option<QueryPhase> {
        match self {
            DiagnosticsError::QueryExecution { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Converts this error to a JSON-serializable response object
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                recoverable: self.is_recoverable(),
            },
        }
    }
}

/// JSON-serializable error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "UNKNOWN_INDEX_TYPE")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Whether retry might succeed
    pub recoverable: bool,
}
