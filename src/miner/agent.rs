use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::channel::{AgentId, BroadcastChannel, Envelope, Publish};
use crate::blockchain::{Block, Chain};
use crate::error::{Error, Result};
use crate::pow::{SearchStrategy, Strided};

/// Knobs shared by every agent of a swarm.
#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    /// Stop once the local chain holds this many blocks (genesis included).
    pub target_len: usize,
    /// Candidates tested between two inbox polls.
    pub burst: u64,
    pub publish_timeout: Duration,
    pub drain_timeout: Duration,
}

#[derive(Debug)]
enum State {
    Searching,
    Syncing(Envelope),
    Broadcasting(Block),
    Done,
}

/// A miner with a private chain, racing its peers over a shared channel.
pub struct Agent {
    id: AgentId,
    peers: Vec<AgentId>,
    search: Strided,
    chain: Chain,
    channel: Arc<BroadcastChannel>,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        id: AgentId,
        stride: u32,
        peers: Vec<AgentId>,
        chain: Chain,
        channel: Arc<BroadcastChannel>,
        settings: AgentSettings,
    ) -> Result<Self> {
        Ok(Self {
            id,
            peers,
            search: Strided::new(stride)?,
            chain,
            channel,
            settings,
        })
    }

    /// Short label used in log lines, e.g. `M07`.
    pub fn tag(&self) -> String {
        format!("M{:02}", self.search.stride())
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Mine until the local chain reaches the target length. Exhaustion of the
    /// proof space and channel timeouts are fatal.
    pub fn run(mut self) -> Result<Chain> {
        info!(
            "{}: starting (len={}, target={})",
            self.tag(),
            self.chain.len(),
            self.settings.target_len
        );

        let mut state = State::Searching;
        loop {
            state = match state {
                State::Searching => self.search()?,
                State::Syncing(envelope) => self.sync(envelope),
                State::Broadcasting(block) => self.broadcast(block)?,
                State::Done => break,
            };
        }

        info!("{}: chain done (len={})", self.tag(), self.chain.len());
        Ok(self.chain)
    }

    fn search(&mut self) -> Result<State> {
        if self.chain.len() >= self.settings.target_len {
            return Ok(State::Done);
        }
        if let Some(envelope) = self.channel.try_recv(self.id) {
            return Ok(State::Syncing(envelope));
        }

        let head_proof = self.chain.last_block().ok_or(Error::EmptyChain)?.proof();
        match self.search.advance(head_proof, self.settings.burst)? {
            Some(proof) => {
                info!(
                    "{}: found proof {} after {} guesses (len={})",
                    self.tag(),
                    proof,
                    self.search.tested(),
                    self.chain.len()
                );
                Ok(State::Broadcasting(self.chain.validate_append(proof)?))
            }
            None => Ok(State::Searching),
        }
    }

    /// Adopt a peer's block. Its proof is re-checked against the local head;
    /// a block that does not link is dropped.
    fn sync(&mut self, envelope: Envelope) -> State {
        let from = envelope.from();
        let (block, receipt) = envelope.open();
        match self.chain.accept_block(block) {
            Ok(_) => info!(
                "{}: chain updated from agent {} (len={})",
                self.tag(),
                from,
                self.chain.len()
            ),
            Err(err) => warn!("{}: dropping block from agent {}: {}", self.tag(), from, err),
        }
        self.search.reset();
        self.channel.ack(receipt);
        State::Searching
    }

    fn broadcast(&mut self, block: Block) -> Result<State> {
        let sent = self.channel.publish(
            self.id,
            &self.peers,
            block.clone(),
            self.settings.publish_timeout,
        )?;
        if sent == Publish::Rejected {
            debug!(
                "{}: a peer block is waiting, discarding own proof {}",
                self.tag(),
                block.proof()
            );
            return Ok(State::Searching);
        }

        self.chain.accept_block(block)?;
        self.search.reset();
        self.channel.wait_acknowledged(self.id, self.settings.drain_timeout)?;
        info!("{}: broadcast complete (len={})", self.tag(), self.chain.len());
        Ok(State::Searching)
    }
}
