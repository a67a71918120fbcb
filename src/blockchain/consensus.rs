//! Longest-valid-chain fork choice.
//!
//! Length is the only weight: cumulative proof-of-work is not considered.

use log::{debug, info, warn};

use super::Chain;
use crate::error::Result;

/// Pick the canonical chain among `local` and chains fetched from peers.
///
/// A candidate qualifies when it is strictly longer than `local` and
/// validates; among qualifying candidates the last one wins. Failed fetches
/// are skipped. The local pending transactions carry over to the adopted
/// chain. Returns the chosen chain and whether it replaced `local`.
pub fn resolve<I>(local: Chain, candidates: I) -> (Chain, bool)
where
    I: IntoIterator<Item = Result<Chain>>,
{
    let local_len = local.len();
    let mut adopted: Option<Chain> = None;

    for candidate in candidates {
        let candidate = match candidate {
            Ok(chain) => chain,
            Err(err) => {
                warn!("consensus - skipping peer: {err}");
                continue;
            }
        };

        if candidate.len() <= local_len {
            debug!(
                "consensus - candidate of length {} is not longer than local {}",
                candidate.len(),
                local_len
            );
            continue;
        }
        if !candidate.validate() {
            warn!(
                "consensus - rejecting invalid candidate of length {}",
                candidate.len()
            );
            continue;
        }
        adopted = Some(candidate);
    }

    match adopted {
        Some(chain) => {
            info!(
                "consensus - local chain replaced ({} -> {} blocks)",
                local_len,
                chain.len()
            );
            (chain.with_pending(local.into_pending()), true)
        }
        None => (local, false),
    }
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::blockchain::model::tests::{P1, three_block_chain};
    use crate::blockchain::{Block, Chain, FixedClock};
    use crate::error::{Error, Result};

    fn prefix(chain: &Chain, len: usize) -> Chain {
        Chain::from_blocks(chain.blocks()[..len].to_vec())
    }

    fn unreachable(peer: &str) -> Error {
        Error::PeerUnreachable {
            peer: peer.into(),
            reason: "connection refused".into(),
        }
    }

    #[test]
    fn longer_valid_candidate_replaces_local() {
        let full = three_block_chain();
        let mut local = prefix(&full, 2);
        local.submit_transaction("x", "y", 1);

        let (chosen, changed) = resolve(local, vec![Ok(full.clone())]);
        assert!(changed);
        assert_eq!(chosen.blocks(), full.blocks());
        assert_eq!(chosen.pending().len(), 1);
    }

    #[test]
    fn shorter_candidate_is_ignored() {
        let full = three_block_chain();
        let local = prefix(&full, 2);

        let (chosen, changed) = resolve(local.clone(), vec![Ok(prefix(&full, 1))]);
        assert!(!changed);
        assert_eq!(chosen, local);
    }

    #[test]
    fn equal_length_candidate_is_ignored() {
        let full = three_block_chain();
        let (_, changed) = resolve(prefix(&full, 2), vec![Ok(prefix(&full, 2))]);
        assert!(!changed);
    }

    #[test]
    fn invalid_longer_candidate_is_ignored() {
        let full = three_block_chain();
        let local = prefix(&full, 2);
        let b = full.blocks();
        let forged_head = Block::new(Vec::new(), b[2].proof(), b[2].prev_hash() ^ 1, 0.0);
        let forged = Chain::from_blocks(vec![b[0].clone(), b[1].clone(), forged_head]);

        let (chosen, changed) = resolve(local.clone(), vec![Ok(forged)]);
        assert!(!changed);
        assert_eq!(chosen, local);
    }

    #[test]
    fn unreachable_peers_are_skipped() {
        let full = three_block_chain();
        let local = prefix(&full, 1);

        let (chosen, changed) = resolve(
            local,
            vec![Err(unreachable("a:1")), Ok(prefix(&full, 2)), Err(unreachable("b:2"))],
        );
        assert!(changed);
        assert_eq!(chosen.len(), 2);
    }

    #[test]
    fn last_qualifying_candidate_wins() {
        let full = three_block_chain();
        let local = prefix(&full, 1);

        // Independent fork of length 2 on the same genesis.
        let mut fork = prefix(&full, 1);
        fork.mine_with(P1, &FixedClock(5.0)).unwrap();
        assert_ne!(fork.blocks()[1], full.blocks()[1]);

        let (chosen, changed) = resolve(local, vec![Ok(prefix(&full, 2)), Ok(fork.clone())]);
        assert!(changed);
        assert_eq!(chosen.blocks(), fork.blocks());
    }

    #[test]
    fn no_candidates_keeps_local() {
        let local = three_block_chain();
        let (chosen, changed) = resolve(local.clone(), Vec::<Result<Chain>>::new());
        assert!(!changed);
        assert_eq!(chosen, local);
    }
}
