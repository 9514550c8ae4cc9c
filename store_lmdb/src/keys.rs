//! Binary key layouts.
//!
//! Record databases are keyed by the record's 8-byte big-endian id. Index
//! databases use composite big-endian keys so that a range scan over an
//! election's 8-byte prefix visits its entries in a useful order:
//!
//! - candidates index: `election ++ candidate` — candidate id ascending.
//! - votes index: `election ++ cast_at ++ vote` — oldest vote first, vote id
//!   breaking ties within one second; a reverse scan yields the most recent
//!   vote first, which is exactly what undo needs.

use pollbox_types::{CandidateId, ElectionId, Timestamp, VoteId};

pub(crate) fn election_key(id: ElectionId) -> [u8; 8] {
    id.as_u64().to_be_bytes()
}

pub(crate) fn candidate_key(id: CandidateId) -> [u8; 8] {
    id.as_u64().to_be_bytes()
}

pub(crate) fn vote_key(id: VoteId) -> [u8; 8] {
    id.as_u64().to_be_bytes()
}

/// Composite key for the candidates-by-election index.
pub(crate) fn candidate_index_key(election: ElectionId, candidate: CandidateId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&election.as_u64().to_be_bytes());
    key[8..].copy_from_slice(&candidate.as_u64().to_be_bytes());
    key
}

/// Composite key for the votes-by-election index.
pub(crate) fn vote_index_key(election: ElectionId, cast_at: Timestamp, vote: VoteId) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&election.as_u64().to_be_bytes());
    key[8..16].copy_from_slice(&cast_at.as_secs().to_be_bytes());
    key[16..].copy_from_slice(&vote.as_u64().to_be_bytes());
    key
}

/// Extract the candidate id from a candidates-index key.
pub(crate) fn candidate_from_index_key(key: &[u8]) -> Option<CandidateId> {
    let bytes: [u8; 8] = key.get(8..16)?.try_into().ok()?;
    Some(CandidateId::new(u64::from_be_bytes(bytes)))
}

/// Extract the (cast_at, vote id) tail from a votes-index key.
pub(crate) fn vote_from_index_key(key: &[u8]) -> Option<(Timestamp, VoteId)> {
    let ts: [u8; 8] = key.get(8..16)?.try_into().ok()?;
    let id: [u8; 8] = key.get(16..24)?.try_into().ok()?;
    Some((
        Timestamp::new(u64::from_be_bytes(ts)),
        VoteId::new(u64::from_be_bytes(id)),
    ))
}

/// Turn a prefix into the smallest key strictly greater than every key that
/// starts with it, for use as an exclusive upper range bound.
///
/// Ids are counter-allocated starting at 1 and never reach `u64::MAX`, so an
/// all-0xFF prefix cannot occur here.
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) {
    for i in (0..prefix.len()).rev() {
        if prefix[i] < 0xFF {
            prefix[i] += 1;
            prefix.truncate(i + 1);
            return;
        }
    }
    prefix.clear();
}
