//! Error types for the domain layer.

use thiserror::Error;

/// Errors produced when an inbound bus payload cannot be decoded.
///
/// Always local to one message: the dispatcher drops the payload and keeps
/// reading.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Payload is not a valid envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors produced when building an envelope for publication.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Envelope could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}
