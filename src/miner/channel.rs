//! Bounded broadcast queue with per-item acknowledgement.
//!
//! Every miner shares one [`BroadcastChannel`]. A block found by one agent is
//! enqueued once per peer; each peer pops the copy addressed to it, applies
//! it and acknowledges it. The publisher can then block until all of its
//! copies have been acknowledged.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::{Condvar, Mutex};

use crate::blockchain::Block;
use crate::error::{Error, Result};

pub type AgentId = usize;

/// One copy of a broadcast block, addressed to a single agent.
#[derive(Debug)]
pub struct Envelope {
    from: AgentId,
    to: AgentId,
    block: Block,
}

impl Envelope {
    pub fn from(&self) -> AgentId {
        self.from
    }

    pub fn to(&self) -> AgentId {
        self.to
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Split into the block and the receipt that must be handed back to
    /// [`BroadcastChannel::ack`].
    pub fn open(self) -> (Block, Receipt) {
        (self.block, Receipt { from: self.from })
    }
}

/// Proof that an envelope was consumed. Not `Clone`: one ack per item.
#[derive(Debug)]
#[must_use = "unacknowledged items keep the publisher waiting"]
pub struct Receipt {
    from: AgentId,
}

/// Outcome of [`BroadcastChannel::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// This many copies were enqueued.
    Sent(usize),
    /// A block addressed to the publisher is still waiting; it must sync
    /// before it may announce anything.
    Rejected,
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<Envelope>,
    /// Unacknowledged items per publisher.
    outstanding: HashMap<AgentId, usize>,
    unfinished: usize,
}

#[derive(Debug)]
pub struct BroadcastChannel {
    capacity: usize,
    state: Mutex<State>,
    changed: Condvar,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items currently queued (not yet popped).
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue one copy of `block` per recipient, all or nothing.
    ///
    /// Blocks while the queue lacks room for every copy; fails with
    /// [`Error::ChannelTimeout`] once `timeout` elapses. The check for
    /// pending items addressed to `from` and the enqueue happen under the
    /// same lock, so at most one block per height gets announced.
    pub fn publish(
        &self,
        from: AgentId,
        recipients: &[AgentId],
        block: Block,
        timeout: Duration,
    ) -> Result<Publish> {
        if recipients.len() > self.capacity {
            return Err(Error::Config(format!(
                "{} recipients exceed channel capacity {}",
                recipients.len(),
                self.capacity
            )));
        }

        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.queue.iter().any(|e| e.to == from) {
                return Ok(Publish::Rejected);
            }
            if state.queue.len() + recipients.len() <= self.capacity {
                break;
            }
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return Err(Error::ChannelTimeout { waited: timeout });
            }
        }

        for &to in recipients {
            state.queue.push_back(Envelope {
                from,
                to,
                block: block.clone(),
            });
        }
        *state.outstanding.entry(from).or_default() += recipients.len();
        state.unfinished += recipients.len();
        debug!(
            "channel - agent {from} published {} copies (queued={})",
            recipients.len(),
            state.queue.len()
        );
        drop(state);

        self.changed.notify_all();
        Ok(Publish::Sent(recipients.len()))
    }

    /// Pop the oldest item addressed to `agent`, if any. Never blocks.
    pub fn try_recv(&self, agent: AgentId) -> Option<Envelope> {
        let mut state = self.state.lock();
        let pos = state.queue.iter().position(|e| e.to == agent)?;
        let envelope = state.queue.remove(pos);
        drop(state);

        self.changed.notify_all();
        envelope
    }

    /// Mark a popped item as fully processed.
    pub fn ack(&self, receipt: Receipt) {
        let mut state = self.state.lock();
        if let Some(count) = state.outstanding.get_mut(&receipt.from) {
            *count = count.saturating_sub(1);
        }
        state.unfinished = state.unfinished.saturating_sub(1);
        drop(state);

        self.changed.notify_all();
    }

    /// Block until every item published by `from` has been acknowledged.
    pub fn wait_acknowledged(&self, from: AgentId, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.outstanding.get(&from).copied().unwrap_or(0) > 0 {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return Err(Error::ChannelTimeout { waited: timeout });
            }
        }
        Ok(())
    }

    /// Block until every item ever published has been acknowledged.
    pub fn join(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.unfinished > 0 {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return Err(Error::ChannelTimeout { waited: timeout });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const SHORT: Duration = Duration::from_millis(50);
    const LONG: Duration = Duration::from_secs(5);

    fn block(proof: u64) -> Block {
        Block::genesis(proof, 0.0)
    }

    #[test]
    fn delivers_one_copy_per_recipient() {
        let channel = BroadcastChannel::new(8);
        assert_eq!(
            channel.publish(0, &[1, 2], block(9), SHORT).unwrap(),
            Publish::Sent(2)
        );
        assert_eq!(channel.len(), 2);

        assert!(channel.try_recv(0).is_none());
        let to_two = channel.try_recv(2).unwrap();
        assert_eq!((to_two.from(), to_two.to()), (0, 2));
        assert_eq!(to_two.block().proof(), 9);
        assert!(channel.try_recv(2).is_none());
        assert!(channel.try_recv(1).is_some());
        assert!(channel.is_empty());
    }

    #[test]
    fn recipients_see_items_in_order() {
        let channel = BroadcastChannel::new(8);
        channel.publish(0, &[2], block(1), SHORT).unwrap();
        channel.publish(1, &[2], block(2), SHORT).unwrap();
        assert_eq!(channel.try_recv(2).unwrap().block().proof(), 1);
        assert_eq!(channel.try_recv(2).unwrap().block().proof(), 2);
    }

    #[test]
    fn publisher_with_pending_inbox_is_rejected() {
        let channel = BroadcastChannel::new(8);
        channel.publish(0, &[1, 2], block(1), SHORT).unwrap();
        assert_eq!(
            channel.publish(1, &[0, 2], block(2), SHORT).unwrap(),
            Publish::Rejected
        );
        assert_eq!(channel.len(), 2);

        let (_, receipt) = channel.try_recv(1).unwrap().open();
        channel.ack(receipt);
        assert_eq!(
            channel.publish(1, &[0, 2], block(2), SHORT).unwrap(),
            Publish::Sent(2)
        );
    }

    #[test]
    fn full_channel_times_out() {
        let channel = BroadcastChannel::new(1);
        channel.publish(0, &[1], block(1), SHORT).unwrap();
        let err = channel.publish(2, &[3], block(2), SHORT).unwrap_err();
        assert!(matches!(err, Error::ChannelTimeout { .. }));
    }

    #[test]
    fn oversized_broadcast_is_a_config_error() {
        let channel = BroadcastChannel::new(1);
        let err = channel.publish(0, &[1, 2], block(1), SHORT).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn blocked_publisher_resumes_when_space_frees() {
        let channel = Arc::new(BroadcastChannel::new(1));
        channel.publish(0, &[1], block(1), SHORT).unwrap();

        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                let (_, receipt) = channel.try_recv(1).unwrap().open();
                channel.ack(receipt);
            })
        };
        assert_eq!(
            channel.publish(2, &[3], block(2), LONG).unwrap(),
            Publish::Sent(1)
        );
        consumer.join().unwrap();
    }

    #[test]
    fn zero_timeout_join_reports_leftovers() {
        let channel = BroadcastChannel::new(4);
        channel.join(Duration::ZERO).unwrap();

        channel.publish(0, &[1], block(1), SHORT).unwrap();
        assert!(matches!(
            channel.join(Duration::ZERO),
            Err(Error::ChannelTimeout { .. })
        ));

        let (_, receipt) = channel.try_recv(1).unwrap().open();
        channel.ack(receipt);
        channel.join(Duration::ZERO).unwrap();
    }

    #[test]
    fn wait_acknowledged_tracks_publisher() {
        let channel = Arc::new(BroadcastChannel::new(8));
        channel.publish(0, &[1, 2], block(1), SHORT).unwrap();
        assert!(matches!(
            channel.wait_acknowledged(0, SHORT),
            Err(Error::ChannelTimeout { .. })
        ));
        // Nothing published by agent 1.
        channel.wait_acknowledged(1, SHORT).unwrap();

        let peers: Vec<_> = [1, 2]
            .into_iter()
            .map(|id| {
                let channel = Arc::clone(&channel);
                thread::spawn(move || {
                    let (_, receipt) = channel.try_recv(id).unwrap().open();
                    channel.ack(receipt);
                })
            })
            .collect();
        channel.wait_acknowledged(0, LONG).unwrap();
        channel.join(LONG).unwrap();
        for p in peers {
            p.join().unwrap();
        }
    }

    #[test]
    fn popped_but_unacknowledged_items_block_join() {
        let channel = BroadcastChannel::new(8);
        channel.publish(0, &[1], block(1), SHORT).unwrap();
        let envelope = channel.try_recv(1).unwrap();
        assert!(channel.is_empty());
        assert!(channel.join(SHORT).is_err());

        let (_, receipt) = envelope.open();
        channel.ack(receipt);
        channel.join(SHORT).unwrap();
    }
}
