//! Trusted dealer / TTP (spec §4.7).
//!
//! The dealer hands out one Beaver triple per multiplication operation,
//! keyed by the `Mul` node's `ExprId` so every party ends up requesting —
//! and receiving consistent shares of — the *same* triple (I5 across
//! parties). It is honest-but-curious: it never sees any party's secret
//! input, only triple requests.
//!
//! Participants are indexed by registration order, not by client id, and
//! the triple cache is lazily populated: the first request for a given
//! operation id generates `(a, b, c = a·b)` and splits each into shares;
//! every later request for that id is served from the cache. Both the
//! participant table and the triple cache live behind one mutex, so two
//! parties racing to request the same fresh operation id can't diverge
//! (spec §5: "a single mutex around the map suffices").

use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MpcError;
use crate::expression::ExprId;
use crate::field::field_mul;
use crate::secret_sharing::split;
use crate::share::Share;

/// One party's slice of a Beaver triple.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeaverTriple {
    pub a: Share,
    pub b: Share,
    pub c: Share,
}

struct RawTriple {
    a_shares: Vec<Share>,
    b_shares: Vec<Share>,
    c_shares: Vec<Share>,
}

struct DealerState {
    participants: HashMap<String, usize>,
    triples: HashMap<ExprId, RawTriple>,
}

pub struct Dealer {
    state: Mutex<DealerState>,
    modulus: i64,
}

impl Dealer {
    pub fn new(modulus: i64) -> Self {
        Self {
            state: Mutex::new(DealerState {
                participants: HashMap::new(),
                triples: HashMap::new(),
            }),
            modulus,
        }
    }

    /// Registers a participant, assigning it the next free index if it
    /// hasn't registered already. Idempotent.
    pub fn register_participant(&self, client_id: &str) {
        let mut state = self.state.lock().expect("dealer mutex poisoned");
        if !state.participants.contains_key(client_id) {
            let next_index = state.participants.len();
            state.participants.insert(client_id.to_string(), next_index);
        }
    }

    /// Returns `client_id`'s share of the triple for `op_id`, generating
    /// and caching a fresh triple on first request.
    pub fn triple_shares(&self, client_id: &str, op_id: ExprId) -> Result<BeaverTriple, MpcError> {
        let mut state = self.state.lock().expect("dealer mutex poisoned");

        let index = *state
            .participants
            .get(client_id)
            .ok_or_else(|| MpcError::Dealer(format!("unknown participant '{client_id}'")))?;
        let num_participants = state.participants.len();
        if num_participants == 0 {
            return Err(MpcError::Dealer("no participants registered".to_string()));
        }

        let modulus = self.modulus;
        let raw = match state.triples.entry(op_id) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Self::generate_raw_triple(num_participants, modulus)?)
            }
        };

        Ok(BeaverTriple {
            a: raw.a_shares[index],
            b: raw.b_shares[index],
            c: raw.c_shares[index],
        })
    }

    fn generate_raw_triple(num_participants: usize, modulus: i64) -> Result<RawTriple, MpcError> {
        let mut rng = rand::thread_rng();
        let a = rng.gen_range(0..modulus);
        let b = rng.gen_range(0..modulus);
        let c = field_mul(a, b, modulus);

        Ok(RawTriple {
            a_shares: split(a, num_participants, modulus)?,
            b_shares: split(b, num_participants, modulus)?,
            c_shares: split(c, num_participants, modulus)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret_sharing::reconstruct;

    const P: i64 = 2003;

    #[test]
    fn two_parties_requesting_the_same_op_get_the_same_triple() {
        let dealer = Dealer::new(P);
        dealer.register_participant("alice");
        dealer.register_participant("bob");

        let op = ExprId::new();
        let alice_triple = dealer.triple_shares("alice", op).unwrap();
        let bob_triple = dealer.triple_shares("bob", op).unwrap();

        let a = reconstruct(&[alice_triple.a, bob_triple.a], P);
        let b = reconstruct(&[alice_triple.b, bob_triple.b], P);
        let c = reconstruct(&[alice_triple.c, bob_triple.c], P);
        assert_eq!(c, field_mul(a, b, P));
    }

    #[test]
    fn different_op_ids_get_different_triples() {
        let dealer = Dealer::new(P);
        dealer.register_participant("alice");

        let t1 = dealer.triple_shares("alice", ExprId::new()).unwrap();
        let t2 = dealer.triple_shares("alice", ExprId::new()).unwrap();
        // With a single participant each triple is fully revealed to it;
        // two independently sampled triples should essentially never match.
        assert!(t1.a.value != t2.a.value || t1.b.value != t2.b.value);
    }

    #[test]
    fn repeated_request_for_same_op_is_cached() {
        let dealer = Dealer::new(P);
        dealer.register_participant("alice");
        let op = ExprId::new();
        let first = dealer.triple_shares("alice", op).unwrap();
        let second = dealer.triple_shares("alice", op).unwrap();
        assert_eq!(first.a.value, second.a.value);
        assert_eq!(first.b.value, second.b.value);
        assert_eq!(first.c.value, second.c.value);
    }

    #[test]
    fn unknown_participant_is_rejected() {
        let dealer = Dealer::new(P);
        dealer.register_participant("alice");
        let result = dealer.triple_shares("mallory", ExprId::new());
        assert!(matches!(result, Err(MpcError::Dealer(_))));
    }
}
