//! Arithmetic expression algebra.
//!
//! An `Expression` is an immutable tree of four node kinds: `Secret`,
//! `Scalar`, `Add`, `Mul`. Every node is stable-identified by an `ExprId`
//! assigned at construction time; the identifier, not the node's position
//! in the tree, is what every party uses to agree on "the same node" across
//! processes (spec §9: identifiers are assigned from a seeded-random
//! counter at AST build time and the whole tree travels with the
//! `ProtocolSpec`, so every party loads a byte-identical copy).
//!
//! Subtraction is not a fifth node kind: `a - b` lowers to
//! `a + (b * Scalar(-1))`, matching the original implementation this
//! protocol is modelled on.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};

const ID_BYTES: usize = 4;

/// Stable 32-bit node identifier, rendered as base64 on the wire and in
/// transport labels (spec §3, §6). Uses the URL-safe alphabet (`-`/`_`
/// instead of `+`/`/`) rather than standard base64, since labels built from
/// this id travel as literal HTTP path segments in the broker's routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExprId([u8; ID_BYTES]);

impl ExprId {
    /// Generates a fresh random identifier. Called once per node at AST
    /// construction time; callers are responsible for then sharing the
    /// resulting tree byte-for-byte with every other party (I1).
    pub fn new() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Renders the id the way the wire format and transport labels expect:
    /// an 8-character base64 string with trailing `==` kept.
    pub fn as_label(&self) -> String {
        URL_SAFE.encode(self.0)
    }

    /// Inverse of `as_label`. Used to recover an id from a label string,
    /// e.g. when a CLI input file names secrets by their rendered id.
    pub fn from_label(label: &str) -> Option<Self> {
        let decoded = URL_SAFE.decode(label).ok()?;
        let bytes: [u8; ID_BYTES] = decoded.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// An arithmetic expression node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    /// Placeholder for one party's private input.
    Secret { id: ExprId },
    /// A literal field element known to all parties.
    Scalar { id: ExprId, value: i64 },
    Add {
        id: ExprId,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Mul {
        id: ExprId,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn id(&self) -> ExprId {
        match self {
            Expression::Secret { id }
            | Expression::Scalar { id, .. }
            | Expression::Add { id, .. }
            | Expression::Mul { id, .. } => *id,
        }
    }

    /// Constructs a fresh Secret leaf with a new stable id. The caller's
    /// ValueDict is expected to map this id to the owner's plain integer
    /// input (I3); the tree itself never carries the value.
    pub fn secret() -> Self {
        Expression::Secret { id: ExprId::new() }
    }

    pub fn scalar(value: i64) -> Self {
        Expression::Scalar {
            id: ExprId::new(),
            value,
        }
    }

    pub fn add(self, other: Expression) -> Expression {
        Expression::Add {
            id: ExprId::new(),
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn mul(self, other: Expression) -> Expression {
        Expression::Mul {
            id: ExprId::new(),
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// `a - b` lowers to `a + (b * -1)`, so the AST keeps exactly the four
    /// node kinds the spec names.
    pub fn sub(self, other: Expression) -> Expression {
        self.add(other.mul(Expression::scalar(-1)))
    }
}

impl std::ops::Add for Expression {
    type Output = Expression;
    fn add(self, rhs: Expression) -> Expression {
        Expression::add(self, rhs)
    }
}

impl std::ops::Sub for Expression {
    type Output = Expression;
    fn sub(self, rhs: Expression) -> Expression {
        Expression::sub(self, rhs)
    }
}

impl std::ops::Mul for Expression {
    type Output = Expression;
    fn mul(self, rhs: Expression) -> Expression {
        Expression::mul(self, rhs)
    }
}

/// Returns the number of Secret leaves in `expr`.
pub fn count_secrets(expr: &Expression) -> usize {
    match expr {
        Expression::Secret { .. } => 1,
        Expression::Scalar { .. } => 0,
        Expression::Add { left, right, .. } | Expression::Mul { left, right, .. } => {
            count_secrets(left) + count_secrets(right)
        }
    }
}

/// Returns the ids of every Secret leaf, in traversal order. Used by a
/// party to compute which shares it must receive from others (everything
/// here minus the ids it owns itself).
pub fn collect_secret_ids(expr: &Expression) -> Vec<ExprId> {
    match expr {
        Expression::Secret { id } => vec![*id],
        Expression::Scalar { .. } => Vec::new(),
        Expression::Add { left, right, .. } | Expression::Mul { left, right, .. } => {
            let mut ids = collect_secret_ids(left);
            ids.extend(collect_secret_ids(right));
            ids
        }
    }
}
