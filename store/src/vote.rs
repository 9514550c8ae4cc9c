//! Vote storage trait.

use crate::StoreError;
use pollbox_types::{CandidateId, ElectionId, Timestamp, VoteId};
use serde::{Deserialize, Serialize};

/// One recorded vote.
///
/// Votes are never edited. They are inserted one at a time and deleted
/// wholesale: by election, by candidate (through cascades), or the single
/// most recent one through [`VoteStore::remove_latest_vote`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: VoteId,
    pub election: ElectionId,
    pub candidate: CandidateId,
    pub cast_at: Timestamp,
}

/// Trait for vote storage operations.
pub trait VoteStore {
    /// Record one vote and return its generated id.
    ///
    /// The candidate must belong to the election; anything else is a
    /// [`StoreError::ForeignKey`] violation and nothing is written.
    fn insert_vote(
        &self,
        election: ElectionId,
        candidate: CandidateId,
        cast_at: Timestamp,
    ) -> Result<VoteId, StoreError>;

    /// All votes of an election, oldest first (cast_at, then vote id).
    fn iter_votes(&self, election: ElectionId) -> Result<Vec<VoteRecord>, StoreError>;

    fn vote_count(&self, election: ElectionId) -> Result<u64, StoreError>;

    /// Delete the most recent vote of an election: latest cast_at, highest
    /// vote id as the same-second tiebreak. Returns the deleted vote's id,
    /// or `None` when the election has no votes (not an error).
    fn remove_latest_vote(&self, election: ElectionId) -> Result<Option<VoteId>, StoreError>;

    /// Delete every vote of an election, returning how many were removed.
    /// Candidates are untouched.
    fn clear_votes(&self, election: ElectionId) -> Result<u64, StoreError>;
}
