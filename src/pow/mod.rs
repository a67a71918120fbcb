pub mod digest;
pub mod search;

pub use digest::digest;
pub use search::{SearchStrategy, Sequential, Strided, find_proof};

/// Seed proof of the default genesis block.
pub const DEFAULT_SEED_PROOF: u64 = 77;

/// A candidate is valid when `digest(probe) % PROOF_MODULUS == PROOF_TARGET`.
pub const PROOF_MODULUS: u64 = 10_000_000;
pub const PROOF_TARGET: u64 = 777_777;

/// Left shift applied to the masked previous proof when forming the probe.
const PROBE_SHIFT: u32 = 16;

/// Merge the previous proof and a candidate into a single 64-bit probe.
///
/// Only the low 32 bits of `prev_proof` take part, so any cycle in the proof
/// sequence is bounded by 2^32 blocks. Returns `None` when the sum leaves
/// the digest's input range.
pub fn probe(prev_proof: u64, candidate: u64) -> Option<u64> {
    ((prev_proof & 0xFFFF_FFFF) << PROBE_SHIFT).checked_add(candidate)
}

/// Return true if `candidate` is a valid proof-of-work following `prev_proof`.
pub fn valid_proof(prev_proof: u64, candidate: u64) -> bool {
    match probe(prev_proof, candidate) {
        Some(p) => digest(p) % PROOF_MODULUS == PROOF_TARGET,
        None => false,
    }
}
