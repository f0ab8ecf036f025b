//! Unified error handling for the poimap library.
//!
//! All fallible operations return [`Result<T>`], aliased to
//! `std::result::Result<T, PoiMapError>`.

use thiserror::Error;

/// Errors that can occur in poimap operations.
#[derive(Debug, Error)]
pub enum PoiMapError {
    /// An edit mode was requested while another non-idle mode is active.
    #[error("cannot enter {requested} mode while {active} mode is active")]
    ModeBusy { requested: String, active: String },

    /// External source failed after every retry attempt.
    #[error("source request '{request}' failed after {attempts} attempts: {message}")]
    SourceExhausted {
        request: String,
        attempts: u32,
        message: String,
    },

    /// Persistence backend rejected a write.
    #[error("persist write for '{kind}' failed: {message}")]
    PersistFailed { kind: String, message: String },

    /// JSON serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result type for poimap operations.
pub type Result<T> = std::result::Result<T, PoiMapError>;
