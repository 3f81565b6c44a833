//! Error types for the placeholder-fulfillment engine
//!
//! This module provides idiomatic Rust error types using thiserror for
//! better error messages and proper error chain handling.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the fill engine
#[derive(Error, Debug)]
pub enum FillError {
    #[error("Document {0} not found")]
    DocumentNotFound(Uuid),

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Field {0} not found")]
    FieldNotFound(Uuid),

    #[error("No answers found in session {0}")]
    NoAnswers(Uuid),

    #[error("Document {0} has no analyzed fields")]
    NoFields(Uuid),

    #[error("No rendered artifact for document {0}")]
    ArtifactMissing(Uuid),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the NLU oracle transport and response handling
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Oracle API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Empty response from model '{model}'")]
    EmptyResponse { model: String },

    #[error("Malformed oracle output: {message}")]
    Malformed { message: String },

    #[error("All oracle models failed after {attempts} attempt(s)")]
    Exhausted { attempts: usize },
}

/// Result type aliases for convenience
pub type FillResult<T> = Result<T, FillError>;
pub type OracleResult<T> = Result<T, OracleError>;
