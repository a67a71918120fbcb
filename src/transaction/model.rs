use serde::{Deserialize, Serialize};

use super::COINBASE_ADDRESS;
use crate::codec::Codec;

/// Transfer of `amount` from `sender` to `receiver`.
///
/// A value object: immutable once built, equal when all fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transaction {
    sender: String,
    receiver: String,
    amount: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// Mining reward paid to `miner`.
    pub fn coinbase(miner: impl Into<String>, amount: u64) -> Self {
        Self::new(COINBASE_ADDRESS, miner, amount)
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn is_coinbase(&self) -> bool {
        self.sender == COINBASE_ADDRESS
    }

    /// Canonical bytes fed into the block hash: length-prefixed addresses
    /// followed by the big-endian amount.
    pub fn hash_material(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(24 + self.sender.len() + self.receiver.len());
        for field in [&self.sender, &self.receiver] {
            bytes.extend_from_slice(&(field.len() as u64).to_be_bytes());
            bytes.extend_from_slice(field.as_bytes());
        }
        bytes.extend_from_slice(&self.amount.to_be_bytes());
        bytes
    }
}

impl Codec for Transaction {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[test]
    fn equality_is_by_value() {
        assert_eq!(Transaction::new("a", "b", 5), Transaction::new("a", "b", 5));
        assert_ne!(Transaction::new("a", "b", 5), Transaction::new("b", "a", 5));
    }

    #[test]
    fn coinbase_uses_reserved_sender() {
        let tx = Transaction::coinbase("miner-1", 1);
        assert!(tx.is_coinbase());
        assert_eq!(tx.sender(), COINBASE_ADDRESS);
        assert!(!Transaction::new("alice", "bob", 1).is_coinbase());
    }

    #[test]
    fn hash_material_separates_fields() {
        let a = Transaction::new("ab", "c", 1);
        let b = Transaction::new("a", "bc", 1);
        assert_ne!(a.hash_material(), b.hash_material());
    }

    #[test]
    fn decodes_in_declared_field_order() {
        let tx = Transaction::new("alice", "bob", 3);
        assert_eq!(
            tx.to_json().unwrap(),
            r#"{"sender":"alice","receiver":"bob","amount":3}"#
        );
        assert_eq!(Transaction::from_value(tx.to_value().unwrap()).unwrap(), tx);
    }

    #[test]
    fn rejects_missing_field() {
        let err = Transaction::from_value(json!({"sender": "a", "receiver": "b"})).unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn rejects_unknown_field() {
        let err = Transaction::from_value(json!({
            "sender": "a", "receiver": "b", "amount": 1, "fee": 0
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn rejects_mistyped_fields() {
        for value in [
            json!({"sender": 1, "receiver": "b", "amount": 1}),
            json!({"sender": "a", "receiver": "b", "amount": "1"}),
            json!({"sender": "a", "receiver": "b", "amount": -1}),
            json!({"sender": "a", "receiver": "b", "amount": 1.5}),
        ] {
            assert!(matches!(
                Transaction::from_value(value),
                Err(Error::Structure(_))
            ));
        }
    }
}
