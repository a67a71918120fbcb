use std::panic;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info};

use super::{Agent, AgentId, BroadcastChannel};
use crate::blockchain::Chain;
use crate::config::SwarmConfig;
use crate::error::Result;

/// Runs one [`Agent`] per configured stride, each on its own thread with its
/// own copy of the starting chain.
#[derive(Debug, Clone)]
pub struct Swarm {
    config: SwarmConfig,
}

impl Swarm {
    pub fn new(config: SwarmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Mine from `genesis` until every agent holds `target_len` blocks.
    ///
    /// Blocks until all agents have finished. Returns the final chain of each
    /// agent in stride order, or the first fatal error once all have stopped.
    /// Every broadcast block must have been acknowledged by then; a leftover
    /// item is reported as [`ChannelTimeout`](crate::Error::ChannelTimeout).
    pub fn run(&self, genesis: &Chain) -> Result<Vec<Chain>> {
        let channel = Arc::new(BroadcastChannel::new(self.config.capacity));
        let ids: Vec<AgentId> = (0..self.config.strides.len()).collect();
        let settings = self.config.agent_settings();

        info!(
            "swarm - {} miners, strides {:?}, target length {}",
            ids.len(),
            self.config.strides,
            self.config.target_len
        );

        let mut handles = Vec::with_capacity(ids.len());
        for (&id, &stride) in ids.iter().zip(&self.config.strides) {
            let peers = ids.iter().copied().filter(|&p| p != id).collect();
            let agent = Agent::new(
                id,
                stride,
                peers,
                genesis.clone(),
                Arc::clone(&channel),
                settings,
            )?;
            let handle = thread::Builder::new()
                .name(agent.tag())
                .spawn(move || agent.run())?;
            handles.push(handle);
        }

        let outcomes: Vec<Result<Chain>> = handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect();

        let mut chains = Vec::with_capacity(outcomes.len());
        for (outcome, stride) in outcomes.into_iter().zip(&self.config.strides) {
            match outcome {
                Ok(chain) => chains.push(chain),
                Err(err) => {
                    error!("swarm - miner M{stride:02} failed: {err}");
                    return Err(err);
                }
            }
        }
        channel.join(Duration::ZERO).inspect_err(|_| {
            error!("swarm - {} unacknowledged item(s) left in the channel", channel.len())
        })?;
        info!("swarm - done");
        Ok(chains)
    }
}
