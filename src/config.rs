use std::collections::HashSet;
use std::env;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::miner::AgentSettings;
use crate::pow::DEFAULT_SEED_PROOF;

/// HTTP node settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub seed_proof: u64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let seed_proof: u64 = env::var("SEED_PROOF")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SEED_PROOF);
        Self {
            host,
            port,
            seed_proof,
        }
    }
}

/// Strides handed out to miners, in order. Small odd primes.
pub const DEFAULT_STRIDES: [u32; 4] = [3, 5, 7, 11];

/// Concurrent mining run: one agent per stride.
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    pub strides: Vec<u32>,
    /// Chain length (genesis included) every agent must reach.
    pub target_len: usize,
    pub burst: u64,
    pub capacity: usize,
    pub publish_timeout: Duration,
    pub drain_timeout: Duration,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            strides: DEFAULT_STRIDES[..3].to_vec(),
            target_len: 3,
            burst: 10_000,
            capacity: 64,
            publish_timeout: Duration::from_secs(4),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl SwarmConfig {
    /// Take the first `miners` default strides.
    pub fn with_miners(mut self, miners: usize) -> Result<Self> {
        if miners > DEFAULT_STRIDES.len() {
            return Err(Error::Config(format!(
                "at most {} miners supported, got {miners}",
                DEFAULT_STRIDES.len()
            )));
        }
        self.strides = DEFAULT_STRIDES[..miners].to_vec();
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.strides.is_empty() {
            return Err(Error::Config("at least one miner required".into()));
        }
        let mut seen = HashSet::new();
        for &stride in &self.strides {
            if stride % 2 == 0 {
                return Err(Error::Config(format!(
                    "stride {stride} is not coprime with 2^32"
                )));
            }
            if !seen.insert(stride) {
                return Err(Error::Config(format!("stride {stride} used twice")));
            }
        }
        if self.target_len == 0 {
            return Err(Error::Config("target length must be at least 1".into()));
        }
        if self.burst == 0 {
            return Err(Error::Config("burst must be positive".into()));
        }
        if self.capacity < self.strides.len() - 1 {
            return Err(Error::Config(format!(
                "channel capacity {} cannot hold a broadcast to {} peers",
                self.capacity,
                self.strides.len() - 1
            )));
        }
        Ok(())
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            target_len: self.target_len,
            burst: self.burst,
            publish_timeout: self.publish_timeout,
            drain_timeout: self.drain_timeout,
        }
    }
}
