//! LMDB implementation of `VoteStore`.

use std::ops::Bound;

use pollbox_store::{StoreError, VoteRecord, VoteStore};
use pollbox_types::{CandidateId, ElectionId, Timestamp, VoteId};

use crate::environment::{LmdbStore, COUNTER_VOTE};
use crate::keys;
use crate::LmdbError;

impl VoteStore for LmdbStore {
    fn insert_vote(
        &self,
        election: ElectionId,
        candidate: CandidateId,
        cast_at: Timestamp,
    ) -> Result<VoteId, StoreError> {
        let mut wtxn = self.write_txn()?;
        if self.read_election(&wtxn, election)?.is_none() {
            return Err(StoreError::ForeignKey(format!(
                "election {election} does not exist"
            )));
        }
        let owner = self
            .read_candidate(&wtxn, candidate)?
            .ok_or_else(|| {
                StoreError::ForeignKey(format!("candidate {candidate} does not exist"))
            })?
            .election;
        if owner != election {
            return Err(StoreError::ForeignKey(format!(
                "candidate {candidate} belongs to election {owner}, not {election}"
            )));
        }

        let id = VoteId::new(self.next_id(&mut wtxn, COUNTER_VOTE)?);
        let record = VoteRecord {
            id,
            election,
            candidate,
            cast_at,
        };
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.votes_db
            .put(&mut wtxn, &keys::vote_key(id), &bytes)
            .map_err(LmdbError::from)?;
        self.votes_by_election_db
            .put(
                &mut wtxn,
                &keys::vote_index_key(election, cast_at, id),
                &candidate.as_u64().to_be_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(%id, %election, %candidate, %cast_at, "recorded vote");
        Ok(id)
    }

    fn iter_votes(&self, election: ElectionId) -> Result<Vec<VoteRecord>, StoreError> {
        let rtxn = self.read_txn()?;
        let mut records = Vec::new();
        for (_cast_at, vote, _candidate) in self.vote_index_entries(&rtxn, election)? {
            let record = self.read_vote(&rtxn, vote)?.ok_or_else(|| {
                StoreError::Corruption(format!("vote index points at missing row {vote}"))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn vote_count(&self, election: ElectionId) -> Result<u64, StoreError> {
        let rtxn = self.read_txn()?;
        let prefix = keys::election_key(election);
        let mut upper = prefix.to_vec();
        keys::increment_prefix(&mut upper);
        let bounds = (Bound::Included(&prefix[..]), Bound::Excluded(upper.as_slice()));

        let iter = self
            .votes_by_election_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut count = 0u64;
        for result in iter {
            result.map_err(LmdbError::from)?;
            count += 1;
        }
        Ok(count)
    }

    fn remove_latest_vote(&self, election: ElectionId) -> Result<Option<VoteId>, StoreError> {
        let mut wtxn = self.write_txn()?;
        if self.read_election(&wtxn, election)?.is_none() {
            return Err(StoreError::NotFound(format!("election {election}")));
        }

        let prefix = keys::election_key(election);
        let mut upper = prefix.to_vec();
        keys::increment_prefix(&mut upper);
        let bounds = (Bound::Included(&prefix[..]), Bound::Excluded(upper.as_slice()));

        // The index orders by (cast_at, vote id), so the last key in the
        // prefix is the most recent vote.
        let latest = {
            let mut iter = self
                .votes_by_election_db
                .rev_range(&wtxn, &bounds)
                .map_err(LmdbError::from)?;
            match iter.next() {
                Some(result) => {
                    let (key, _val) = result.map_err(LmdbError::from)?;
                    Some(key.to_vec())
                }
                None => None,
            }
        };

        let key = match latest {
            Some(key) => key,
            None => return Ok(None),
        };
        let (_cast_at, vote) = keys::vote_from_index_key(&key).ok_or_else(|| {
            StoreError::Corruption(format!("malformed vote index key ({} bytes)", key.len()))
        })?;
        self.votes_db
            .delete(&mut wtxn, &keys::vote_key(vote))
            .map_err(LmdbError::from)?;
        self.votes_by_election_db
            .delete(&mut wtxn, &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::info!(%vote, %election, "removed latest vote");
        Ok(Some(vote))
    }

    fn clear_votes(&self, election: ElectionId) -> Result<u64, StoreError> {
        let mut wtxn = self.write_txn()?;
        if self.read_election(&wtxn, election)?.is_none() {
            return Err(StoreError::NotFound(format!("election {election}")));
        }

        let entries = self.vote_index_entries(&wtxn, election)?;
        for &(cast_at, vote, _candidate) in &entries {
            self.votes_db
                .delete(&mut wtxn, &keys::vote_key(vote))
                .map_err(LmdbError::from)?;
            self.votes_by_election_db
                .delete(&mut wtxn, &keys::vote_index_key(election, cast_at, vote))
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::info!(%election, removed = entries.len(), "cleared votes");
        Ok(entries.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollbox_store::{CandidateStore, ElectionStore, NewCandidate, NewElection};
    use pollbox_types::CredentialDigest;

    fn temp_store() -> (tempfile::TempDir, LmdbStore) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).expect("failed to open store");
        (dir, store)
    }

    fn make_election(store: &LmdbStore, name: &str) -> ElectionId {
        store
            .insert_election(&NewElection {
                name: name.to_string(),
                credential: CredentialDigest::new([7u8; 32]),
                created_at: Timestamp::new(1_700_000_000),
            })
            .expect("insert election")
    }

    fn make_candidate(store: &LmdbStore, election: ElectionId, name: &str) -> CandidateId {
        store
            .insert_candidate(&NewCandidate {
                election,
                name: name.to_string(),
                symbol: Some(format!("{}.png", name.to_lowercase())),
                is_nota: false,
            })
            .expect("insert candidate")
    }

    #[test]
    fn insert_and_iter_chronological() {
        let (_dir, store) = temp_store();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");
        let b = make_candidate(&store, election, "B");

        // Insert out of timestamp order; iteration is chronological.
        let late = store.insert_vote(election, a, Timestamp::new(300)).expect("vote");
        let early = store.insert_vote(election, b, Timestamp::new(100)).expect("vote");

        let votes = store.iter_votes(election).expect("iter");
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].id, early);
        assert_eq!(votes[1].id, late);
    }

    #[test]
    fn same_second_votes_order_by_id() {
        let (_dir, store) = temp_store();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");
        let ts = Timestamp::new(500);
        let first = store.insert_vote(election, a, ts).expect("vote");
        let second = store.insert_vote(election, a, ts).expect("vote");

        let votes = store.iter_votes(election).expect("iter");
        assert_eq!(votes[0].id, first);
        assert_eq!(votes[1].id, second);
    }

    #[test]
    fn insert_checks_referential_integrity() {
        let (_dir, store) = temp_store();
        let board = make_election(&store, "Board");
        let council = make_election(&store, "Council");
        let board_candidate = make_candidate(&store, board, "A");

        let err = store
            .insert_vote(council, board_candidate, Timestamp::new(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey(_)));

        let err = store
            .insert_vote(board, CandidateId::new(999), Timestamp::new(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey(_)));

        let err = store
            .insert_vote(ElectionId::new(999), board_candidate, Timestamp::new(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey(_)));
    }

    #[test]
    fn remove_latest_follows_timestamps_not_insertion_order() {
        let (_dir, store) = temp_store();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");

        // The newest timestamp was inserted first.
        let newest = store.insert_vote(election, a, Timestamp::new(900)).expect("vote");
        let oldest = store.insert_vote(election, a, Timestamp::new(100)).expect("vote");

        let removed = store.remove_latest_vote(election).expect("remove");
        assert_eq!(removed, Some(newest));

        let votes = store.iter_votes(election).expect("iter");
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].id, oldest);
    }

    #[test]
    fn remove_latest_breaks_same_second_ties_by_id() {
        let (_dir, store) = temp_store();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");
        let ts = Timestamp::new(42);
        store.insert_vote(election, a, ts).expect("vote");
        let second = store.insert_vote(election, a, ts).expect("vote");

        let removed = store.remove_latest_vote(election).expect("remove");
        assert_eq!(removed, Some(second));
    }

    #[test]
    fn remove_latest_on_empty_election_is_none() {
        let (_dir, store) = temp_store();
        let election = make_election(&store, "Board");
        assert_eq!(store.remove_latest_vote(election).expect("remove"), None);
    }

    #[test]
    fn remove_latest_scoped_to_election() {
        let (_dir, store) = temp_store();
        let board = make_election(&store, "Board");
        let council = make_election(&store, "Council");
        let a = make_candidate(&store, board, "A");
        let b = make_candidate(&store, council, "B");
        store.insert_vote(board, a, Timestamp::new(50)).expect("vote");
        // Council's vote is globally the most recent.
        store.insert_vote(council, b, Timestamp::new(999)).expect("vote");

        store.remove_latest_vote(board).expect("remove");
        assert_eq!(store.vote_count(board).expect("count"), 0);
        assert_eq!(store.vote_count(council).expect("count"), 1);
    }

    #[test]
    fn clear_votes_leaves_candidates() {
        let (_dir, store) = temp_store();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");
        let b = make_candidate(&store, election, "B");
        store.insert_vote(election, a, Timestamp::new(1)).expect("vote");
        store.insert_vote(election, b, Timestamp::new(2)).expect("vote");
        store.insert_vote(election, a, Timestamp::new(3)).expect("vote");

        let removed = store.clear_votes(election).expect("clear");
        assert_eq!(removed, 3);
        assert_eq!(store.vote_count(election).expect("count"), 0);
        assert_eq!(store.iter_candidates(election).expect("iter").len(), 2);
    }

    #[test]
    fn vote_count_counts_per_election() {
        let (_dir, store) = temp_store();
        let board = make_election(&store, "Board");
        let council = make_election(&store, "Council");
        let a = make_candidate(&store, board, "A");
        let b = make_candidate(&store, council, "B");
        store.insert_vote(board, a, Timestamp::new(1)).expect("vote");
        store.insert_vote(board, a, Timestamp::new(2)).expect("vote");
        store.insert_vote(council, b, Timestamp::new(3)).expect("vote");

        assert_eq!(store.vote_count(board).expect("count"), 2);
        assert_eq!(store.vote_count(council).expect("count"), 1);
    }
}
