//! Error types for the PDF serializer.
//!
//! Mirrors `pdfjoin_core::error::PdfJoinError`: one `thiserror` enum, one
//! variant family per failure kind the spec distinguishes (configuration,
//! I/O, corrupt input, retryable-from-collaborator). Per-object failures
//! under `continue_on_error` never surface as this type — they are caught
//! at the orchestrator boundary and counted instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfWriteError {
    /// Conflicting or unsupported option combination (e.g. incremental + linear).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failure writing to the output sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An indirect reference could not be resolved into a sane object, or a
    /// stream's header was malformed.
    #[error("corrupt input: {0}")]
    Corrupt(String),

    /// The lower-layer resolver collaborator asked us to try again later.
    /// Unlike `Corrupt`, this must propagate rather than be swallowed as a
    /// duff reference.
    #[error("retryable failure: {0}")]
    Retryable(String),
}

pub type Result<T> = std::result::Result<T, PdfWriteError>;
