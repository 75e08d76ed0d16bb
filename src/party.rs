//! SMC party orchestrator (spec §4.8).
//!
//! `SmcParty::run` drives one party's side of a protocol run to
//! completion: disseminate input shares, collect the shares it doesn't
//! own, evaluate the expression (invoking the Beaver sub-protocol at
//! every secret×secret multiplication), and reconstruct the public
//! result through the leader. The evaluator walks the expression with an
//! explicit post-order node list rather than recursing node-by-node, so
//! evaluation depth is bounded by heap allocation rather than call-stack
//! depth.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};

use crate::config::ProtocolSpec;
use crate::error::MpcError;
use crate::expression::{collect_secret_ids, count_secrets, Expression, ExprId};
use crate::field::{field_add, DEFAULT_MODULUS};
use crate::message::{
    beaver_const_result_label, beaver_const_share_label, result_share_label, secret_share_label,
    BeaverConstResultMessage, BeaverConstShareMessage, Message, ResultShareMessage, ShareMessage,
    WireMessage, PUBLISH_RESULT_LABEL,
};
use crate::secret_sharing::split;
use crate::share::{combine_add, combine_mul, Constant, Share, Value};
use crate::transport::Transport;

/// A party's mapping from its own Secret nodes to plain-integer inputs
/// (spec §3). Keyed by rendered id rather than `ExprId` directly so the
/// type still round-trips through plain JSON at the CLI boundary.
pub type ValueDict = HashMap<ExprId, i64>;

/// One party's end of a protocol run.
pub struct SmcParty<T: Transport> {
    client_id: String,
    transport: T,
    modulus: i64,
}

impl<T: Transport> SmcParty<T> {
    pub fn new(client_id: impl Into<String>, transport: T) -> Self {
        Self {
            client_id: client_id.into(),
            transport,
            modulus: DEFAULT_MODULUS,
        }
    }

    /// Overrides the design-default field modulus (spec §4.1: "the design
    /// must support redefinition at build time").
    pub fn with_modulus(mut self, modulus: i64) -> Self {
        self.modulus = modulus;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn is_leader(&self, spec: &ProtocolSpec) -> bool {
        spec.leader() == Some(self.client_id.as_str())
    }

    /// Runs the full protocol described in spec §4.8 and returns the
    /// reconstructed result, identical at every party.
    #[instrument(skip(self, spec, own_values), fields(client_id = %self.client_id))]
    pub async fn run(&self, spec: &ProtocolSpec, own_values: &ValueDict) -> Result<i64, MpcError> {
        info!(
            participants = spec.participant_ids.len(),
            secrets = count_secrets(&spec.expr),
            "starting protocol run"
        );

        let share_table = self.build_share_table(spec, own_values).await?;
        let result = self.evaluate(&spec.expr, spec, &share_table).await?;

        match result {
            Value::Constant(k) => {
                debug!(value = k.value, "expression had no secrets, skipping reconstruction");
                Ok(k.value)
            }
            Value::Share(share) => self.reconstruct_result(spec, share).await,
        }
    }

    /// Splits and disseminates every secret this party owns, keeps its
    /// own slice, then collects the slices it doesn't own from peers.
    /// Returns the complete share table keyed by Secret id.
    async fn build_share_table(
        &self,
        spec: &ProtocolSpec,
        own_values: &ValueDict,
    ) -> Result<HashMap<ExprId, Share>, MpcError> {
        let mut table = HashMap::new();
        let num_parties = spec.participant_ids.len();

        for (&secret_id, &value) in own_values {
            let shares = split(value, num_parties, self.modulus)?;
            for (share, participant) in shares.into_iter().zip(spec.participant_ids.iter()) {
                if participant == &self.client_id {
                    table.insert(secret_id, share);
                } else {
                    let label = secret_share_label(secret_id);
                    let payload = ShareMessage::new(secret_id, share).to_bytes()?;
                    self.transport.send_private(participant, &label, payload).await?;
                }
            }
        }

        let mut requested = HashSet::new();
        for secret_id in collect_secret_ids(&spec.expr) {
            if own_values.contains_key(&secret_id) || !requested.insert(secret_id) {
                continue;
            }
            let label = secret_share_label(secret_id);
            let bytes = self.transport.retrieve_private(&label).await?;
            let msg = ShareMessage::from_bytes(&label, &bytes)?;
            table.insert(secret_id, msg.share);
        }

        Ok(table)
    }

    /// Evaluates `root` over an explicit post-order node list (spec §9's
    /// recursion-depth note), dispatching every secret×secret `Mul` into
    /// the Beaver sub-protocol.
    async fn evaluate(
        &self,
        root: &Expression,
        spec: &ProtocolSpec,
        share_table: &HashMap<ExprId, Share>,
    ) -> Result<Value, MpcError> {
        let order = post_order(root);
        let is_leader = self.is_leader(spec);
        let mut values: HashMap<ExprId, Value> = HashMap::with_capacity(order.len());

        for node in order {
            let value = match node {
                Expression::Scalar { value, .. } => Value::Constant(Constant::new(*value, self.modulus)),
                Expression::Secret { id } => {
                    let share = share_table
                        .get(id)
                        .copied()
                        .ok_or(MpcError::MissingSecretValue(*id))?;
                    Value::Share(share)
                }
                Expression::Add { left, right, .. } => {
                    let l = child_value(&values, left)?;
                    let r = child_value(&values, right)?;
                    combine_add(l, r, is_leader, self.modulus)
                }
                Expression::Mul { id, left, right } => {
                    let l = child_value(&values, left)?;
                    let r = child_value(&values, right)?;
                    match (l, r) {
                        (Value::Share(x), Value::Share(y)) => {
                            Value::Share(self.beaver_multiply(spec, *id, x, y).await?)
                        }
                        _ => combine_mul(l, r, self.modulus)?,
                    }
                }
            };
            values.insert(node.id(), value);
        }

        values.get(&root.id()).copied().ok_or_else(|| {
            MpcError::ProtocolViolation("evaluator produced no value for the root node".to_string())
        })
    }

    /// Runs the Beaver multiplication sub-protocol for one `Mul` node
    /// (spec §4.6) and returns this party's share of `x · y`.
    #[instrument(skip(self, spec, x, y), fields(client_id = %self.client_id, op = %op_id))]
    async fn beaver_multiply(
        &self,
        spec: &ProtocolSpec,
        op_id: ExprId,
        x: Share,
        y: Share,
    ) -> Result<Share, MpcError> {
        let triple = self.transport.retrieve_triple_shares(op_id).await?;
        let d_i = x.sub(triple.a, self.modulus);
        let e_i = y.sub(triple.b, self.modulus);

        let leader_id = spec
            .leader()
            .ok_or_else(|| MpcError::ProtocolViolation("protocol spec names no participants".to_string()))?;

        let (d, e) = if self.is_leader(spec) {
            let mut d_sum = d_i;
            let mut e_sum = e_i;
            for participant in &spec.participant_ids {
                if participant == &self.client_id {
                    continue;
                }
                let label = beaver_const_share_label(op_id, participant);
                let bytes = self.transport.retrieve_private(&label).await?;
                let msg = BeaverConstShareMessage::from_bytes(&label, &bytes)?;
                d_sum = d_sum.add(msg.x_part, self.modulus);
                e_sum = e_sum.add(msg.y_part, self.modulus);
            }

            let result_label = beaver_const_result_label(op_id);
            let payload = BeaverConstResultMessage::new(
                Constant::new(d_sum.value, self.modulus),
                Constant::new(e_sum.value, self.modulus),
            )
            .to_bytes()?;
            self.transport.publish(&result_label, payload).await?;
            (d_sum.value, e_sum.value)
        } else {
            let label = beaver_const_share_label(op_id, &self.client_id);
            let payload = BeaverConstShareMessage::new(d_i, e_i).to_bytes()?;
            self.transport.send_private(leader_id, &label, payload).await?;

            let result_label = beaver_const_result_label(op_id);
            let bytes = self.transport.retrieve_public(leader_id, &result_label).await?;
            let msg = BeaverConstResultMessage::from_bytes(&result_label, &bytes)?;
            (msg.x_part, msg.y_part)
        };

        let d_const = Constant::new(d, self.modulus);
        let e_const = Constant::new(e, self.modulus);

        let mut share_xy = triple.c;
        share_xy = share_xy.add(x.scalar_mul(e_const, self.modulus), self.modulus);
        share_xy = share_xy.add(y.scalar_mul(d_const, self.modulus), self.modulus);
        if self.is_leader(spec) {
            let de = d_const.mul(e_const, self.modulus);
            share_xy = share_xy.sub(Share::new(de.value, self.modulus), self.modulus);
        }

        Ok(share_xy)
    }

    /// Final reconstruction (spec §4.8 step 6): non-leaders send their
    /// result share privately, then poll for the leader's broadcast.
    async fn reconstruct_result(&self, spec: &ProtocolSpec, own_share: Share) -> Result<i64, MpcError> {
        let leader_id = spec
            .leader()
            .ok_or_else(|| MpcError::ProtocolViolation("protocol spec names no participants".to_string()))?;

        if self.is_leader(spec) {
            let mut total = own_share.value;
            for participant in &spec.participant_ids {
                if participant == &self.client_id {
                    continue;
                }
                let label = result_share_label(participant);
                let bytes = self.transport.retrieve_private(&label).await?;
                let msg = ResultShareMessage::from_bytes(&label, &bytes)?;
                total = field_add(total, msg.share.value, self.modulus);
            }

            let payload = Message { value: total }.to_bytes()?;
            self.transport.publish(PUBLISH_RESULT_LABEL, payload).await?;
            info!(result = total, "reconstructed and published final result");
            Ok(total)
        } else {
            let label = result_share_label(&self.client_id);
            let payload = ResultShareMessage { share: own_share }.to_bytes()?;
            self.transport.send_private(leader_id, &label, payload).await?;

            let bytes = self
                .transport
                .retrieve_public(leader_id, PUBLISH_RESULT_LABEL)
                .await?;
            let msg = Message::from_bytes(PUBLISH_RESULT_LABEL, &bytes)?;
            Ok(msg.value)
        }
    }
}

fn child_value(values: &HashMap<ExprId, Value>, child: &Expression) -> Result<Value, MpcError> {
    values.get(&child.id()).copied().ok_or_else(|| {
        MpcError::ProtocolViolation(format!(
            "child node {} evaluated after its parent in post-order traversal",
            child.id()
        ))
    })
}

/// Builds a post-order list of node references: every child appears
/// before its parent. Uses an explicit stack rather than recursion, per
/// spec §9's note on bounding evaluator depth for deep expressions.
fn post_order(root: &Expression) -> Vec<&Expression> {
    let mut stack = vec![root];
    let mut visited = Vec::new();

    while let Some(node) = stack.pop() {
        visited.push(node);
        match node {
            Expression::Add { left, right, .. } | Expression::Mul { left, right, .. } => {
                stack.push(left);
                stack.push(right);
            }
            Expression::Secret { .. } | Expression::Scalar { .. } => {}
        }
    }

    visited.reverse();
    visited
}
