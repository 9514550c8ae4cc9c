//! Nullable store — thread-safe in-memory persistence gateway for testing.

use std::collections::BTreeMap;
use std::sync::Mutex;

use pollbox_store::{
    CandidateRecord, CandidateStore, ElectionRecord, ElectionStore, NewCandidate, NewElection,
    StoreError, VoteRecord, VoteStore, NOTA_LABEL,
};
use pollbox_types::{CandidateId, ElectionId, Timestamp, VoteId};

#[derive(Debug, Default)]
struct Inner {
    elections: BTreeMap<u64, ElectionRecord>,
    candidates: BTreeMap<u64, CandidateRecord>,
    votes: BTreeMap<u64, VoteRecord>,
    next_election_id: u64,
    next_candidate_id: u64,
    next_vote_id: u64,
}

/// An in-memory persistence gateway for testing.
///
/// One mutex guards all three relations, so every operation — including the
/// cross-relation cascades and the NOTA lookup-or-insert — is one critical
/// section, the same discipline the LMDB backend gets from its transactions.
#[derive(Debug)]
pub struct NullStore {
    inner: Mutex<Inner>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn nota_ids(&self, election: ElectionId) -> Vec<CandidateId> {
        self.candidates
            .values()
            .filter(|c| c.election == election && c.is_nota)
            .map(|c| c.id)
            .collect()
    }
}

impl ElectionStore for NullStore {
    fn insert_election(&self, new: &NewElection) -> Result<ElectionId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.elections.values().any(|e| e.name == new.name) {
            return Err(StoreError::Duplicate(format!(
                "election name '{}'",
                new.name
            )));
        }
        inner.next_election_id += 1;
        let id = ElectionId::new(inner.next_election_id);
        inner.elections.insert(
            id.as_u64(),
            ElectionRecord {
                id,
                name: new.name.clone(),
                credential: new.credential,
                created_at: new.created_at,
            },
        );
        Ok(id)
    }

    fn get_election(&self, id: ElectionId) -> Result<ElectionRecord, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .elections
            .get(&id.as_u64())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("election {id}")))
    }

    fn find_election_by_name(&self, name: &str) -> Result<Option<ElectionRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .elections
            .values()
            .find(|e| e.name == name)
            .cloned())
    }

    fn iter_elections(&self) -> Result<Vec<ElectionRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().elections.values().cloned().collect())
    }

    fn delete_election(&self, id: ElectionId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.elections.remove(&id.as_u64()).is_none() {
            return Err(StoreError::NotFound(format!("election {id}")));
        }
        inner.candidates.retain(|_, c| c.election != id);
        inner.votes.retain(|_, v| v.election != id);
        Ok(())
    }
}

impl CandidateStore for NullStore {
    fn insert_candidate(&self, new: &NewCandidate) -> Result<CandidateId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.elections.contains_key(&new.election.as_u64()) {
            return Err(StoreError::ForeignKey(format!(
                "election {} does not exist",
                new.election
            )));
        }
        if new.is_nota && !inner.nota_ids(new.election).is_empty() {
            return Err(StoreError::Duplicate(format!(
                "NOTA candidate for election {}",
                new.election
            )));
        }
        inner.next_candidate_id += 1;
        let id = CandidateId::new(inner.next_candidate_id);
        inner.candidates.insert(
            id.as_u64(),
            CandidateRecord {
                id,
                election: new.election,
                name: new.name.clone(),
                symbol: new.symbol.clone(),
                is_nota: new.is_nota,
            },
        );
        Ok(id)
    }

    fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .candidates
            .get(&id.as_u64())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("candidate {id}")))
    }

    fn iter_candidates(&self, election: ElectionId) -> Result<Vec<CandidateRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .candidates
            .values()
            .filter(|c| c.election == election)
            .cloned()
            .collect())
    }

    fn update_candidate(
        &self,
        id: CandidateId,
        name: &str,
        symbol: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .candidates
            .get_mut(&id.as_u64())
            .ok_or_else(|| StoreError::NotFound(format!("candidate {id}")))?;
        record.name = name.to_string();
        record.symbol = symbol.map(str::to_string);
        Ok(())
    }

    fn delete_candidate(&self, id: CandidateId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.candidates.remove(&id.as_u64()).is_none() {
            return Err(StoreError::NotFound(format!("candidate {id}")));
        }
        inner.votes.retain(|_, v| v.candidate != id);
        Ok(())
    }

    fn find_or_create_nota(&self, election: ElectionId) -> Result<CandidateId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.elections.contains_key(&election.as_u64()) {
            return Err(StoreError::ForeignKey(format!(
                "election {election} does not exist"
            )));
        }
        let notas = inner.nota_ids(election);
        match notas.len() {
            0 => {
                inner.next_candidate_id += 1;
                let id = CandidateId::new(inner.next_candidate_id);
                inner.candidates.insert(
                    id.as_u64(),
                    CandidateRecord {
                        id,
                        election,
                        name: NOTA_LABEL.to_string(),
                        symbol: None,
                        is_nota: true,
                    },
                );
                Ok(id)
            }
            1 => Ok(notas[0]),
            n => Err(StoreError::Corruption(format!(
                "election {election} has {n} NOTA candidates"
            ))),
        }
    }
}

impl VoteStore for NullStore {
    fn insert_vote(
        &self,
        election: ElectionId,
        candidate: CandidateId,
        cast_at: Timestamp,
    ) -> Result<VoteId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.elections.contains_key(&election.as_u64()) {
            return Err(StoreError::ForeignKey(format!(
                "election {election} does not exist"
            )));
        }
        match inner.candidates.get(&candidate.as_u64()) {
            None => {
                return Err(StoreError::ForeignKey(format!(
                    "candidate {candidate} does not exist"
                )))
            }
            Some(record) if record.election != election => {
                return Err(StoreError::ForeignKey(format!(
                    "candidate {candidate} belongs to election {}, not {election}",
                    record.election
                )))
            }
            Some(_) => {}
        }
        inner.next_vote_id += 1;
        let id = VoteId::new(inner.next_vote_id);
        inner.votes.insert(
            id.as_u64(),
            VoteRecord {
                id,
                election,
                candidate,
                cast_at,
            },
        );
        Ok(id)
    }

    fn iter_votes(&self, election: ElectionId) -> Result<Vec<VoteRecord>, StoreError> {
        let mut votes: Vec<VoteRecord> = self
            .inner
            .lock()
            .unwrap()
            .votes
            .values()
            .filter(|v| v.election == election)
            .cloned()
            .collect();
        votes.sort_by_key(|v| (v.cast_at, v.id));
        Ok(votes)
    }

    fn vote_count(&self, election: ElectionId) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .votes
            .values()
            .filter(|v| v.election == election)
            .count() as u64)
    }

    fn remove_latest_vote(&self, election: ElectionId) -> Result<Option<VoteId>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.elections.contains_key(&election.as_u64()) {
            return Err(StoreError::NotFound(format!("election {election}")));
        }
        let latest = inner
            .votes
            .values()
            .filter(|v| v.election == election)
            .max_by_key(|v| (v.cast_at, v.id))
            .map(|v| v.id);
        if let Some(id) = latest {
            inner.votes.remove(&id.as_u64());
        }
        Ok(latest)
    }

    fn clear_votes(&self, election: ElectionId) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.elections.contains_key(&election.as_u64()) {
            return Err(StoreError::NotFound(format!("election {election}")));
        }
        let before = inner.votes.len();
        inner.votes.retain(|_, v| v.election != election);
        Ok((before - inner.votes.len()) as u64)
    }
}
