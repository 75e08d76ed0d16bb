//! A secure multi-party computation client.
//!
//! Implements BGW-style additive secret sharing over a prime field with
//! Beaver-triple multiplication: each secret input is split into random
//! additive shares distributed among the participating parties, linear
//! operations are computed locally on shares, and every secret-by-secret
//! multiplication is blinded with a triple from a trusted dealer and
//! reconstructed through a designated leader.
//!
//! ## Layout
//!
//! - [`field`] — arithmetic over ℤ/pℤ.
//! - [`share`] — the `Share`/`Constant` value algebra the evaluator works
//!   with.
//! - [`expression`] — the four-node arithmetic expression AST.
//! - [`secret_sharing`] — N-out-of-N additive split/reconstruct.
//! - [`dealer`] — the trusted dealer that hands out Beaver triples.
//! - [`message`] — wire envelopes and transport label conventions.
//! - [`transport`] — the `Transport` trait plus an HTTP and an in-memory
//!   implementation.
//! - [`broker`] — the axum HTTP server backing `transport::HttpTransport`.
//! - [`config`] — per-party configuration and the protocol-wide spec.
//! - [`party`] — the orchestrator that runs the protocol end to end.
//! - [`error`] — the crate's error types.

pub mod broker;
pub mod config;
pub mod dealer;
pub mod error;
pub mod expression;
pub mod field;
pub mod message;
pub mod party;
pub mod secret_sharing;
pub mod share;
pub mod transport;

pub use config::{PartyConfig, ProtocolSpec};
pub use dealer::{BeaverTriple, Dealer};
pub use error::{MpcError, Result, TransportError};
pub use expression::{collect_secret_ids, count_secrets, ExprId, Expression};
pub use field::{field_add, field_mul, field_neg, field_reduce, field_sub, DEFAULT_MODULUS};
pub use party::{SmcParty, ValueDict};
pub use secret_sharing::{reconstruct, split};
pub use share::{combine_add, combine_mul, combine_sub, Constant, Share, Value};
pub use transport::{HttpTransport, InMemoryBroker, InMemoryTransport, PollPolicy, Transport};
