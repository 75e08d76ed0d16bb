//! Share and Constant algebra (spec §4.2).
//!
//! Two value kinds flow through the evaluator: a `Share` (a party's local
//! portion of a secret) and a `Constant` (a public field element, known
//! identically to every party, that appears in the expression as a
//! `Scalar`). Their arithmetic is a small, closed set of cases — mixing
//! anything outside the table below is a protocol violation, not a value
//! to silently coerce.
//!
//! Only the leader absorbs a public constant into the running sum when
//! combining a `Share` with a `Constant` for addition/subtraction (I6):
//! every other party just passes its share through unchanged. This is what
//! keeps the sum of everyone's shares additive after the combination —
//! adding the constant once, at exactly one party, is equivalent to adding
//! it to the reconstructed secret.

use serde::{Deserialize, Serialize};

use crate::error::MpcError;
use crate::field::{field_add, field_mul, field_neg, field_sub};

/// A party's additive portion of some secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub value: i64,
}

impl Share {
    pub fn new(value: i64, modulus: i64) -> Self {
        Self {
            value: crate::field::field_reduce(value, modulus),
        }
    }

    pub fn add(self, other: Share, modulus: i64) -> Share {
        Share::new(field_add(self.value, other.value, modulus), modulus)
    }

    pub fn sub(self, other: Share, modulus: i64) -> Share {
        Share::new(field_sub(self.value, other.value, modulus), modulus)
    }

    /// Share × Constant: the only multiplication a single party may do
    /// locally. Share × Share must go through the Beaver sub-protocol.
    pub fn scalar_mul(self, k: Constant, modulus: i64) -> Share {
        Share::new(field_mul(self.value, k.value, modulus), modulus)
    }

    pub fn neg(self, modulus: i64) -> Share {
        Share::new(field_neg(self.value, modulus), modulus)
    }
}

/// A publicly known field element, derived from a `Scalar` node at
/// evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub value: i64,
}

impl Constant {
    pub fn new(value: i64, modulus: i64) -> Self {
        Self {
            value: crate::field::field_reduce(value, modulus),
        }
    }

    pub fn add(self, other: Constant, modulus: i64) -> Constant {
        Constant::new(field_add(self.value, other.value, modulus), modulus)
    }

    pub fn sub(self, other: Constant, modulus: i64) -> Constant {
        Constant::new(field_sub(self.value, other.value, modulus), modulus)
    }

    pub fn mul(self, other: Constant, modulus: i64) -> Constant {
        Constant::new(field_mul(self.value, other.value, modulus), modulus)
    }
}

/// Whatever the evaluator produces at a node: either a local `Share` or a
/// public `Constant`, per the post-order traversal in spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Share(Share),
    Constant(Constant),
}

/// Combines two evaluator values for an `Add` node, following the
/// Share–Constant interaction table in §4.2.
pub fn combine_add(left: Value, right: Value, is_leader: bool, modulus: i64) -> Value {
    match (left, right) {
        (Value::Share(a), Value::Share(b)) => Value::Share(a.add(b, modulus)),
        (Value::Share(s), Value::Constant(k)) | (Value::Constant(k), Value::Share(s)) => {
            if is_leader {
                Value::Share(Share::new(s.value + k.value, modulus))
            } else {
                Value::Share(s)
            }
        }
        (Value::Constant(a), Value::Constant(b)) => Value::Constant(a.add(b, modulus)),
    }
}

/// Combines two evaluator values for subtraction. The AST never encodes
/// subtraction directly (`a - b` lowers to `a + (b * Scalar(-1))` in
/// `expression.rs`), but the Share/Constant algebra exposes it directly
/// too, matching the original scheme's `__sub__` operators.
pub fn combine_sub(left: Value, right: Value, is_leader: bool, modulus: i64) -> Value {
    match (left, right) {
        (Value::Share(a), Value::Share(b)) => Value::Share(a.sub(b, modulus)),
        (Value::Share(s), Value::Constant(k)) => {
            if is_leader {
                Value::Share(Share::new(s.value - k.value, modulus))
            } else {
                Value::Share(s)
            }
        }
        (Value::Constant(k), Value::Share(s)) => {
            if is_leader {
                Value::Share(Share::new(k.value - s.value, modulus))
            } else {
                Value::Share(s.neg(modulus))
            }
        }
        (Value::Constant(a), Value::Constant(b)) => Value::Constant(a.sub(b, modulus)),
    }
}

/// Combines two evaluator values for a `Mul` node when at least one side is
/// a `Constant`. Rejects Share×Share — that case belongs to the Beaver
/// multiplication sub-protocol (spec §4.6), not local arithmetic.
pub fn combine_mul(left: Value, right: Value, modulus: i64) -> Result<Value, MpcError> {
    match (left, right) {
        (Value::Share(s), Value::Constant(k)) | (Value::Constant(k), Value::Share(s)) => {
            Ok(Value::Share(s.scalar_mul(k, modulus)))
        }
        (Value::Constant(a), Value::Constant(b)) => Ok(Value::Constant(a.mul(b, modulus))),
        (Value::Share(_), Value::Share(_)) => Err(MpcError::ProtocolViolation(
            "Share × Share must go through the Beaver multiplication sub-protocol".to_string(),
        )),
    }
}
