//! N-out-of-N additive secret sharing (spec §4.5).
//!
//! `split` produces `N` shares whose values sum to the secret modulo `p`;
//! `reconstruct` sums them back. Shares are never renormalised or
//! re-randomised between operations — a share produced here is the same
//! share that travels through the rest of the protocol.

use rand::Rng;

use crate::error::MpcError;
use crate::field::field_reduce;
use crate::share::Share;

/// Splits `secret` into `num_parties` additive shares. The first
/// `num_parties - 1` shares are drawn uniformly at random from `[0, p)`;
/// the last is whatever is left over so the shares sum to `secret mod p`.
pub fn split(secret: i64, num_parties: usize, modulus: i64) -> Result<Vec<Share>, MpcError> {
    if num_parties == 0 {
        return Err(MpcError::ProtocolViolation(
            "cannot split a secret across zero parties".to_string(),
        ));
    }

    let mut rng = rand::thread_rng();
    let mut shares = Vec::with_capacity(num_parties);
    let mut sum: i64 = 0;

    for _ in 0..num_parties - 1 {
        let value = rng.gen_range(0..modulus);
        sum = field_reduce(sum + value, modulus);
        shares.push(Share::new(value, modulus));
    }

    let last = field_reduce(secret - sum, modulus);
    shares.push(Share::new(last, modulus));

    Ok(shares)
}

/// Sums a list of shares modulo `p`. An empty slice reconstructs to `0`,
/// matching the additive identity.
pub fn reconstruct(shares: &[Share], modulus: i64) -> i64 {
    shares
        .iter()
        .fold(0i64, |acc, share| field_reduce(acc + share.value, modulus))
}
