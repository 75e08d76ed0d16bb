//! Error types for the SMC client.
//!
//! Mirrors the crate's original `MpcError` convention (a single
//! `thiserror`-derived enum plus a `Result` alias) but narrowed to the
//! failure kinds the protocol actually produces, per the error handling
//! design: transport failures, protocol misuse, missing secret values, and
//! dealer/config problems are the only runtime failures expected under the
//! honest-but-curious model. None of them are recoverable locally.

use thiserror::Error;

use crate::expression::ExprId;

/// Errors surfaced by the transport layer (broker connection, polling,
/// malformed payloads).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to reach broker: {0}")]
    ConnectionFailed(String),

    #[error("timed out waiting for label {label}")]
    Timeout { label: String },

    #[error("malformed payload for label {label}: {source}")]
    MalformedPayload {
        label: String,
        source: serde_json::Error,
    },
}

/// Top-level error type for the SMC engine.
#[derive(Error, Debug)]
pub enum MpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Programming error: Share×Share outside the multiplication
    /// sub-protocol, a mismatched Share/Constant combination, a duplicate
    /// Secret id in the AST, or a missing entry in the share table at
    /// evaluation time.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A Secret appears in the expression that no party owns.
    #[error("no party provided a value for secret {0}")]
    MissingSecretValue(ExprId),

    /// The dealer was asked to do something malformed: no participants
    /// registered, or a client id it doesn't recognise.
    #[error("dealer error: {0}")]
    Dealer(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MpcError>;
