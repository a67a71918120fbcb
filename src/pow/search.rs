use log::debug;

use super::valid_proof;
use crate::error::{Error, Result};

/// A resumable walk over candidate proofs.
///
/// `advance` tests at most `budget` candidates against `prev_proof` and
/// returns the first valid one. The walk keeps its position between calls so
/// a caller can interleave bounded bursts with other work.
pub trait SearchStrategy {
    fn advance(&mut self, prev_proof: u64, budget: u64) -> Result<Option<u64>>;

    /// Rewind to the start value (after the head of the chain moved).
    fn reset(&mut self);

    /// Number of candidates tested since the last reset.
    fn tested(&self) -> u64;
}

/// Brute force: 0, 1, 2, ...
#[derive(Debug, Clone)]
pub struct Sequential {
    start: u64,
    next: Option<u64>,
    tested: u64,
}

impl Sequential {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(start: u64) -> Self {
        Self {
            start,
            next: Some(start),
            tested: 0,
        }
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchStrategy for Sequential {
    fn advance(&mut self, prev_proof: u64, budget: u64) -> Result<Option<u64>> {
        for _ in 0..budget {
            let candidate = self.next.ok_or(Error::Exhausted { stride: 1 })?;
            self.tested += 1;
            self.next = candidate.checked_add(1);
            if valid_proof(prev_proof, candidate) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.next = Some(self.start);
        self.tested = 0;
    }

    fn tested(&self) -> u64 {
        self.tested
    }
}

/// Walks the 32-bit proof space with a fixed odd stride.
///
/// An odd stride is coprime with 2^32, so the walk visits every 32-bit value
/// exactly once before it returns to the start.
#[derive(Debug, Clone)]
pub struct Strided {
    stride: u32,
    start: u32,
    cursor: u32,
    tested: u64,
}

impl Strided {
    pub fn new(stride: u32) -> Result<Self> {
        if stride % 2 == 0 {
            return Err(Error::Config(format!(
                "stride {stride} is not coprime with 2^32"
            )));
        }
        Ok(Self {
            stride,
            start: 0,
            cursor: 0,
            tested: 0,
        })
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }
}

impl SearchStrategy for Strided {
    fn advance(&mut self, prev_proof: u64, budget: u64) -> Result<Option<u64>> {
        for _ in 0..budget {
            let candidate = self.cursor;
            self.tested += 1;
            if valid_proof(prev_proof, u64::from(candidate)) {
                return Ok(Some(u64::from(candidate)));
            }
            self.cursor = self.cursor.wrapping_add(self.stride);
            if self.cursor == self.start {
                return Err(Error::Exhausted {
                    stride: u64::from(self.stride),
                });
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.cursor = self.start;
        self.tested = 0;
    }

    fn tested(&self) -> u64 {
        self.tested
    }
}

/// Candidates tested between progress log lines.
const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Run `strategy` until it yields a proof for `prev_proof`.
pub fn find_proof<S: SearchStrategy + ?Sized>(strategy: &mut S, prev_proof: u64) -> Result<u64> {
    loop {
        if let Some(proof) = strategy.advance(prev_proof, PROGRESS_INTERVAL)? {
            return Ok(proof);
        }
        debug!("guess #{}...", strategy.tested());
    }
}
