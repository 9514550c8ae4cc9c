//! LMDB implementation of `ElectionStore`.

use pollbox_store::{ElectionRecord, ElectionStore, NewElection, StoreError};
use pollbox_types::ElectionId;

use crate::environment::{LmdbStore, COUNTER_ELECTION};
use crate::keys;
use crate::LmdbError;

impl ElectionStore for LmdbStore {
    fn insert_election(&self, new: &NewElection) -> Result<ElectionId, StoreError> {
        let mut wtxn = self.write_txn()?;
        if self
            .election_names_db
            .get(&wtxn, new.name.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "election name '{}'",
                new.name
            )));
        }

        let id = ElectionId::new(self.next_id(&mut wtxn, COUNTER_ELECTION)?);
        let record = ElectionRecord {
            id,
            name: new.name.clone(),
            credential: new.credential,
            created_at: new.created_at,
        };
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.elections_db
            .put(&mut wtxn, &keys::election_key(id), &bytes)
            .map_err(LmdbError::from)?;
        self.election_names_db
            .put(&mut wtxn, new.name.as_bytes(), &keys::election_key(id))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(%id, name = %new.name, "inserted election");
        Ok(id)
    }

    fn get_election(&self, id: ElectionId) -> Result<ElectionRecord, StoreError> {
        let rtxn = self.read_txn()?;
        self.read_election(&rtxn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("election {id}")))
    }

    fn find_election_by_name(&self, name: &str) -> Result<Option<ElectionRecord>, StoreError> {
        let rtxn = self.read_txn()?;
        let id_bytes = match self
            .election_names_db
            .get(&rtxn, name.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let raw: [u8; 8] = id_bytes.try_into().map_err(|_| {
            StoreError::Corruption(format!("malformed name index entry for '{name}'"))
        })?;
        let id = ElectionId::new(u64::from_be_bytes(raw));
        match self.read_election(&rtxn, id)? {
            Some(record) => Ok(Some(record)),
            None => Err(StoreError::Corruption(format!(
                "name index for '{name}' points at missing election {id}"
            ))),
        }
    }

    fn iter_elections(&self) -> Result<Vec<ElectionRecord>, StoreError> {
        let rtxn = self.read_txn()?;
        let iter = self.elections_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut records = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            records.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(records)
    }

    fn delete_election(&self, id: ElectionId) -> Result<(), StoreError> {
        let mut wtxn = self.write_txn()?;
        let record = self
            .read_election(&wtxn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("election {id}")))?;

        // Collect before mutating; iterators hold a borrow of the txn.
        let candidates = self.candidate_ids(&wtxn, id)?;
        let votes = self.vote_index_entries(&wtxn, id)?;

        for &(cast_at, vote, _candidate) in &votes {
            self.votes_db
                .delete(&mut wtxn, &keys::vote_key(vote))
                .map_err(LmdbError::from)?;
            self.votes_by_election_db
                .delete(&mut wtxn, &keys::vote_index_key(id, cast_at, vote))
                .map_err(LmdbError::from)?;
        }
        for &candidate in &candidates {
            self.candidates_db
                .delete(&mut wtxn, &keys::candidate_key(candidate))
                .map_err(LmdbError::from)?;
            self.candidates_by_election_db
                .delete(&mut wtxn, &keys::candidate_index_key(id, candidate))
                .map_err(LmdbError::from)?;
        }
        self.election_names_db
            .delete(&mut wtxn, record.name.as_bytes())
            .map_err(LmdbError::from)?;
        self.elections_db
            .delete(&mut wtxn, &keys::election_key(id))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::info!(
            %id,
            candidates = candidates.len(),
            votes = votes.len(),
            "deleted election"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollbox_store::{CandidateStore, NewCandidate, VoteStore};
    use pollbox_types::{CredentialDigest, Timestamp};

    fn temp_store() -> (tempfile::TempDir, LmdbStore) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).expect("failed to open store");
        (dir, store)
    }

    fn new_election(name: &str) -> NewElection {
        NewElection {
            name: name.to_string(),
            credential: CredentialDigest::new([7u8; 32]),
            created_at: Timestamp::new(1_700_000_000),
        }
    }

    fn new_candidate(election: ElectionId, name: &str, symbol: &str) -> NewCandidate {
        NewCandidate {
            election,
            name: name.to_string(),
            symbol: Some(symbol.to_string()),
            is_nota: false,
        }
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let (_dir, store) = temp_store();
        let id = store.insert_election(&new_election("Board 2024")).expect("insert");
        let record = store.get_election(id).expect("get");
        assert_eq!(record.id, id);
        assert_eq!(record.name, "Board 2024");
        assert_eq!(record.credential, CredentialDigest::new([7u8; 32]));
    }

    #[test]
    fn get_missing_election_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.get_election(ElectionId::new(42)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn duplicate_name_rejected() {
        let (_dir, store) = temp_store();
        store.insert_election(&new_election("Board")).expect("insert");
        let err = store.insert_election(&new_election("Board")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn find_by_name() {
        let (_dir, store) = temp_store();
        let id = store.insert_election(&new_election("Council")).expect("insert");
        let found = store.find_election_by_name("Council").expect("find");
        assert_eq!(found.expect("should exist").id, id);
        assert!(store.find_election_by_name("Senate").expect("find").is_none());
    }

    #[test]
    fn iter_elections_id_ascending() {
        let (_dir, store) = temp_store();
        let a = store.insert_election(&new_election("A")).expect("insert");
        let b = store.insert_election(&new_election("B")).expect("insert");
        let c = store.insert_election(&new_election("C")).expect("insert");
        let ids: Vec<ElectionId> = store
            .iter_elections()
            .expect("iter")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn delete_cascades_to_candidates_and_votes() {
        let (_dir, store) = temp_store();
        let doomed = store.insert_election(&new_election("Doomed")).expect("insert");
        let kept = store.insert_election(&new_election("Kept")).expect("insert");

        let dc = store
            .insert_candidate(&new_candidate(doomed, "X", "x.png"))
            .expect("candidate");
        let kc = store
            .insert_candidate(&new_candidate(kept, "Y", "y.png"))
            .expect("candidate");
        store
            .insert_vote(doomed, dc, Timestamp::new(10))
            .expect("vote");
        store.insert_vote(kept, kc, Timestamp::new(11)).expect("vote");

        store.delete_election(doomed).expect("delete");

        assert!(matches!(
            store.get_election(doomed).unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            store.get_candidate(dc).unwrap_err(),
            StoreError::NotFound(_)
        ));
        // Name is free for reuse once the election is gone.
        assert!(store.find_election_by_name("Doomed").expect("find").is_none());

        // The other election is untouched.
        assert_eq!(store.vote_count(kept).expect("count"), 1);
        assert_eq!(store.iter_candidates(kept).expect("iter").len(), 1);
    }

    #[test]
    fn delete_missing_election_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.delete_election(ElectionId::new(9)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (_dir, store) = temp_store();
        let first = store.insert_election(&new_election("First")).expect("insert");
        store.delete_election(first).expect("delete");
        let second = store.insert_election(&new_election("Second")).expect("insert");
        assert!(second > first);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let id = {
            let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).expect("open");
            store.insert_election(&new_election("Persistent")).expect("insert")
        };
        let store = LmdbStore::open(dir.path(), 10 * 1024 * 1024).expect("reopen");
        let record = store.get_election(id).expect("get");
        assert_eq!(record.name, "Persistent");
    }
}
