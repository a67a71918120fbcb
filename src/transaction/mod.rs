pub mod model;

pub use model::Transaction;

/// Reserved sender address of mining rewards.
pub const COINBASE_ADDRESS: &str = "0";

/// Amount credited to the miner of each block (dev value).
pub const MINING_REWARD: u64 = 1;
