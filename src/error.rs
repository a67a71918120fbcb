use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed serialized entity (missing, extra or mistyped field).
    #[error("Malformed structure: {0}")]
    Structure(String),
    #[error("Invalid proof-of-work {proof} for previous proof {prev}")]
    InvalidProof { prev: u64, proof: u64 },
    #[error("Block does not link to head: expected prev_hash {expected:#018x}, got {found:#018x}")]
    BrokenLink { expected: u64, found: u64 },
    /// The search sequence wrapped back to its start without a solution.
    #[error("Proof space exhausted (stride {stride})")]
    Exhausted { stride: u64 },
    #[error("Broadcast channel blocked for {waited:?}")]
    ChannelTimeout { waited: Duration },
    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },
    #[error("Missing genesis block")]
    EmptyChain,
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Structure(err.to_string())
    }
}
