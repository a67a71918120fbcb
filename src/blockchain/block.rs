use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::Codec;
use crate::transaction::Transaction;

/// A sealed block. Fields are fixed at construction; there are no setters,
/// so [`Block::hash`] never goes stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    transactions: Vec<Transaction>,
    proof: u64,     // Proof-of-work linking to the previous block's proof
    prev_hash: u64, // 0 for genesis
    #[serde(deserialize_with = "real_number")]
    timestamp: f64, // Unix seconds
}

/// Only accept a JSON real for `timestamp`; an integer is a type error.
fn real_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    match number.as_f64() {
        Some(value) if number.is_f64() => Ok(value),
        _ => Err(D::Error::custom(format!(
            "invalid type: integer `{number}`, expected a real timestamp"
        ))),
    }
}

impl Block {
    pub fn new(transactions: Vec<Transaction>, proof: u64, prev_hash: u64, timestamp: f64) -> Self {
        Self {
            transactions,
            proof,
            prev_hash,
            timestamp,
        }
    }

    /// First block of a chain: no transactions, no parent.
    pub fn genesis(seed_proof: u64, timestamp: f64) -> Self {
        Self::new(Vec::new(), seed_proof, 0, timestamp)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn proof(&self) -> u64 {
        self.proof
    }

    pub fn prev_hash(&self) -> u64 {
        self.prev_hash
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Digest of `(transactions, proof, prev_hash, timestamp)` in that order:
    /// the first 8 bytes (big-endian) of the SHA-256 of their canonical
    /// encoding. Independent of process, platform and memory layout.
    pub fn hash(&self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update((self.transactions.len() as u64).to_be_bytes());
        for tx in &self.transactions {
            hasher.update(tx.hash_material());
        }
        hasher.update(self.proof.to_be_bytes());
        hasher.update(self.prev_hash.to_be_bytes());
        hasher.update(self.timestamp.to_bits().to_be_bytes());
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

impl Codec for Block {}

#[cfg(test)]
mod tests {
    use super::Block;
    use crate::codec::Codec;
    use crate::error::Error;
    use crate::transaction::Transaction;
    use serde_json::json;

    fn sample() -> Block {
        Block::new(
            vec![
                Transaction::new("alice", "bob", 5),
                Transaction::coinbase("miner", 1),
            ],
            4_856_919,
            0x1234_5678_9ABC_DEF0,
            1_700_000_000.25,
        )
    }

    #[test]
    fn hash_is_stable() {
        let b = sample();
        assert_eq!(b.hash(), b.clone().hash());
        let decoded = Block::from_json(&b.to_json().unwrap()).unwrap();
        assert_eq!(decoded.hash(), b.hash());
    }

    #[test]
    fn hash_covers_every_field() {
        let b = sample();
        let txs = b.transactions().to_vec();
        let variants = [
            Block::new(txs[..1].to_vec(), b.proof(), b.prev_hash(), b.timestamp()),
            Block::new(txs.clone(), b.proof() + 1, b.prev_hash(), b.timestamp()),
            Block::new(txs.clone(), b.proof(), b.prev_hash() ^ 1, b.timestamp()),
            Block::new(txs.clone(), b.proof(), b.prev_hash(), b.timestamp() + 0.5),
        ];
        for v in variants {
            assert_ne!(v.hash(), b.hash());
        }
    }

    #[test]
    fn transaction_order_matters() {
        let b = sample();
        let mut reversed = b.transactions().to_vec();
        reversed.reverse();
        let other = Block::new(reversed, b.proof(), b.prev_hash(), b.timestamp());
        assert_ne!(other.hash(), b.hash());
    }

    #[test]
    fn genesis_has_no_parent() {
        let g = Block::genesis(77, 0.0);
        assert_eq!(g.prev_hash(), 0);
        assert_eq!(g.proof(), 77);
        assert!(g.transactions().is_empty());
    }

    #[test]
    fn round_trips_through_value() {
        let b = sample();
        assert_eq!(Block::from_value(b.to_value().unwrap()).unwrap(), b);
    }

    #[test]
    fn rejects_malformed_mappings() {
        let missing = json!({"transactions": [], "proof": 1, "prev_hash": 0});
        let extra = json!({
            "transactions": [], "proof": 1, "prev_hash": 0, "timestamp": 1.0, "nonce": 3
        });
        let mistyped = json!({"transactions": {}, "proof": 1, "prev_hash": 0, "timestamp": 1.0});
        let bad_tx = json!({
            "transactions": [{"sender": "a", "receiver": "b"}],
            "proof": 1, "prev_hash": 0, "timestamp": 1.0
        });
        let integer_time = json!({"transactions": [], "proof": 1, "prev_hash": 0, "timestamp": 5});
        for value in [missing, extra, mistyped, bad_tx, integer_time] {
            assert!(matches!(Block::from_value(value), Err(Error::Structure(_))));
        }
    }

    #[test]
    fn integer_timestamp_is_rejected_from_text() {
        let integer = r#"{"transactions":[],"proof":1,"prev_hash":0,"timestamp":5}"#;
        assert!(matches!(Block::from_json(integer), Err(Error::Structure(_))));

        let real = r#"{"transactions":[],"proof":1,"prev_hash":0,"timestamp":5.0}"#;
        let block = Block::from_json(real).unwrap();
        assert_eq!(block.timestamp(), 5.0);
        assert_eq!(block.to_json().unwrap(), real);
    }
}
