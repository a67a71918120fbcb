use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blockchain::{Block, Chain};
use crate::pow::DEFAULT_SEED_PROOF;

/// Shared application state: this node's chain and the peers it knows.
pub struct AppState {
    pub chain: Mutex<Chain>,
    pub peers: Mutex<BTreeSet<String>>,
    /// Address credited with mining rewards.
    pub node_id: String,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(seed_proof: u64) -> Self {
        Self {
            chain: Mutex::new(Chain::genesis(seed_proof)),
            peers: Mutex::new(BTreeSet::new()),
            node_id: Uuid::new_v4().simple().to_string(),
            http: reqwest::Client::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_SEED_PROOF)
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub chain: &'a Chain,
}

/// Same shape as [`ChainResponse`], as read back from a peer.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerChainResponse {
    pub length: usize,
    pub chain: Chain,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
}

#[derive(Serialize)]
pub struct MineResponse<'a> {
    pub message: &'static str,
    pub index: usize,
    pub proof: u64,
    pub prev_hash: u64,
    pub block: &'a Block,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTxRequest {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub message: String,
    pub index: usize,
}

/* ---------- Node API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct RegisterNodesResponse {
    pub message: &'static str,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub message: &'static str,
    pub replaced: bool,
    pub length: usize,
}
