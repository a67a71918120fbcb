//! A minimal proof-of-work ledger.
//!
//! Blocks are linked twice: by the hash of their parent and by a proof that
//! must solve a puzzle relative to the parent's proof. Miners race over a
//! shared broadcast channel; nodes settle divergent chains by the
//! longest-valid-chain rule.

pub mod api;
pub mod blockchain;
pub mod codec;
pub mod config;
pub mod error;
pub mod miner;
pub mod pow;
pub mod transaction;

pub use blockchain::{Block, Chain, resolve};
pub use codec::Codec;
pub use error::{Error, Result};
pub use transaction::Transaction;
