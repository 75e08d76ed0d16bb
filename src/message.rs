//! Wire envelopes and label conventions (spec §6).
//!
//! Every message that crosses the transport is a small `serde`-derived
//! struct with exact, stable field names, and every mailbox is addressed by
//! a literal label string built from one of the functions below. Labels are
//! unique per logical message (a secret's id, a Mul node's operation id, or
//! a sender's client id is folded into the label itself), so delivery
//! doesn't depend on FIFO ordering between distinct logical messages.

use serde::{Deserialize, Serialize};

use crate::error::{MpcError, TransportError};
use crate::expression::ExprId;
use crate::share::{Constant, Share};

pub const RESULT_SHARE_PREFIX: &str = "Result_Share_";
pub const PUBLISH_RESULT_LABEL: &str = "Publish_Result";
const SECRET_SHARE_PREFIX: &str = "Secret_Share_";
const BEAVER_CONST_SHARE_PREFIX: &str = "Beaver_Const_Share_";
const BEAVER_CONST_RESULT_PREFIX: &str = "Beaver_Const_Result_";

pub fn secret_share_label(secret_id: ExprId) -> String {
    format!("{SECRET_SHARE_PREFIX}{}", secret_id.as_label())
}

pub fn result_share_label(sender_client_id: &str) -> String {
    format!("{RESULT_SHARE_PREFIX}{sender_client_id}")
}

pub fn beaver_const_share_label(op_id: ExprId, sender_client_id: &str) -> String {
    format!(
        "{BEAVER_CONST_SHARE_PREFIX}{}_{sender_client_id}",
        op_id.as_label()
    )
}

pub fn beaver_const_result_label(op_id: ExprId) -> String {
    format!("{BEAVER_CONST_RESULT_PREFIX}{}", op_id.as_label())
}

/// A bare field element, used for the leader's final public result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Message {
    pub value: i64,
}

/// One party's Share of one secret, addressed privately by
/// `secret_share_label`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareMessage {
    pub id: String,
    pub share: Share,
}

/// A non-leader's final result Share, addressed privately to the leader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResultShareMessage {
    pub share: Share,
}

/// A non-leader's masked (d, e) shares for one Beaver multiplication,
/// addressed privately to the leader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeaverConstShareMessage {
    pub x_part: Share,
    pub y_part: Share,
}

/// The leader's broadcast of the reconstructed (d, e) for one Beaver
/// multiplication.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeaverConstResultMessage {
    pub x_part: i64,
    pub y_part: i64,
}

/// Shared (de)serialization helper: every envelope round-trips through
/// plain JSON bytes, so the transport layer stays payload-agnostic.
pub trait WireMessage: Sized + Serialize + for<'de> Deserialize<'de> {
    fn to_bytes(&self) -> Result<Vec<u8>, MpcError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn from_bytes(label: &str, bytes: &[u8]) -> Result<Self, MpcError> {
        serde_json::from_slice(bytes).map_err(|source| {
            MpcError::Transport(TransportError::MalformedPayload {
                label: label.to_string(),
                source,
            })
        })
    }
}

impl WireMessage for Message {}
impl WireMessage for ShareMessage {}
impl WireMessage for ResultShareMessage {}
impl WireMessage for BeaverConstShareMessage {}
impl WireMessage for BeaverConstResultMessage {}

impl ShareMessage {
    pub fn new(id: ExprId, share: Share) -> Self {
        Self {
            id: id.as_label(),
            share,
        }
    }
}

impl BeaverConstShareMessage {
    pub fn new(x_part: Share, y_part: Share) -> Self {
        Self { x_part, y_part }
    }
}

impl BeaverConstResultMessage {
    pub fn new(x_part: Constant, y_part: Constant) -> Self {
        Self {
            x_part: x_part.value,
            y_part: y_part.value,
        }
    }
}
