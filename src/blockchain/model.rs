use log::info;
use serde::{Deserialize, Serialize};

use super::Block;
use super::clock::{Clock, SystemClock};
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::pow::valid_proof;
use crate::transaction::Transaction;

/// Append-only sequence of blocks plus the transactions waiting for the
/// next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Chain {
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Chain {
    /// Initialize a chain holding only a genesis block seeded with `seed_proof`.
    pub fn genesis(seed_proof: u64) -> Self {
        Self::genesis_with(seed_proof, &SystemClock)
    }

    pub fn genesis_with(seed_proof: u64, clock: &dyn Clock) -> Self {
        Self::from_blocks(vec![Block::genesis(seed_proof, clock.now())])
    }

    /// Wrap already-sealed blocks (e.g. received from a peer). Not validated.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            pending: Vec::new(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    fn head(&self) -> Result<&Block> {
        self.last_block().ok_or(Error::EmptyChain)
    }

    /// Queue a transaction for the next block. Returns the index of that block.
    pub fn submit_transaction(
        &mut self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: u64,
    ) -> usize {
        self.pending.push(Transaction::new(sender, receiver, amount));
        self.len()
    }

    /// Queue an already-built transaction (e.g. a coinbase reward).
    pub fn push_transaction(&mut self, tx: Transaction) -> usize {
        self.pending.push(tx);
        self.len()
    }

    /// Validate the entire chain: hash links and proof links.
    pub fn validate(&self) -> bool {
        if self.blocks.is_empty() {
            return false;
        }

        // Each link is two-fold: the parent's full hash is stored in the
        // child, and the child's proof is a function of the parent's proof.
        self.blocks.windows(2).all(|pair| {
            let (prev, block) = (&pair[0], &pair[1]);
            block.prev_hash() == prev.hash() && valid_proof(prev.proof(), block.proof())
        })
    }

    /// Forge the block `proof` would seal on top of the current head, without
    /// touching the chain.
    pub fn validate_append(&self, proof: u64) -> Result<Block> {
        self.validate_append_with(proof, &SystemClock)
    }

    pub fn validate_append_with(&self, proof: u64, clock: &dyn Clock) -> Result<Block> {
        let head = self.head()?;
        if !valid_proof(head.proof(), proof) {
            return Err(Error::InvalidProof {
                prev: head.proof(),
                proof,
            });
        }
        Ok(Block::new(
            self.pending.clone(),
            proof,
            head.hash(),
            clock.now(),
        ))
    }

    /// Seal the pending transactions into a new block with `proof` and append
    /// it. On error neither the blocks nor the pending buffer change.
    pub fn mine(&mut self, proof: u64) -> Result<&Block> {
        self.mine_with(proof, &SystemClock)
    }

    pub fn mine_with(&mut self, proof: u64, clock: &dyn Clock) -> Result<&Block> {
        let block = self.validate_append_with(proof, clock)?;
        self.append(block);
        self.head()
    }

    /// Append a block sealed elsewhere, provided it links to the current head
    /// by both hash and proof.
    pub fn accept_block(&mut self, block: Block) -> Result<&Block> {
        let head = self.head()?;
        let expected = head.hash();
        if block.prev_hash() != expected {
            return Err(Error::BrokenLink {
                expected,
                found: block.prev_hash(),
            });
        }
        if !valid_proof(head.proof(), block.proof()) {
            return Err(Error::InvalidProof {
                prev: head.proof(),
                proof: block.proof(),
            });
        }
        self.append(block);
        self.head()
    }

    fn append(&mut self, block: Block) {
        info!(
            "block #{} appended (proof={}, hash={:#018x}, txs={})",
            self.blocks.len(),
            block.proof(),
            block.hash(),
            block.transactions().len()
        );
        self.blocks.push(block);
        self.pending.clear();
    }

    /// Take over `pending` as this chain's pending buffer (used when a
    /// peer's chain replaces the local one).
    pub(crate) fn with_pending(mut self, pending: Vec<Transaction>) -> Self {
        self.pending = pending;
        self
    }

    pub(crate) fn into_pending(self) -> Vec<Transaction> {
        self.pending
    }
}

impl Codec for Chain {}
