//! LMDB implementation of `CandidateStore`.

use heed::RoTxn;

use pollbox_store::{CandidateRecord, CandidateStore, NewCandidate, StoreError, NOTA_LABEL};
use pollbox_types::{CandidateId, ElectionId};

use crate::environment::{LmdbStore, COUNTER_CANDIDATE};
use crate::keys;
use crate::LmdbError;

impl LmdbStore {
    /// Every NOTA row of an election. The spec'd invariant is at most one;
    /// callers decide what a violation means.
    fn nota_candidates(
        &self,
        txn: &RoTxn<'_>,
        election: ElectionId,
    ) -> Result<Vec<CandidateRecord>, StoreError> {
        let mut notas = Vec::new();
        for id in self.candidate_ids(txn, election)? {
            let record = self.read_candidate(txn, id)?.ok_or_else(|| {
                StoreError::Corruption(format!("candidate index points at missing row {id}"))
            })?;
            if record.is_nota {
                notas.push(record);
            }
        }
        Ok(notas)
    }

    fn write_candidate(
        &self,
        wtxn: &mut heed::RwTxn<'_>,
        record: &CandidateRecord,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.candidates_db
            .put(wtxn, &keys::candidate_key(record.id), &bytes)
            .map_err(LmdbError::from)?;
        self.candidates_by_election_db
            .put(
                wtxn,
                &keys::candidate_index_key(record.election, record.id),
                &[],
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

impl CandidateStore for LmdbStore {
    fn insert_candidate(&self, new: &NewCandidate) -> Result<CandidateId, StoreError> {
        let mut wtxn = self.write_txn()?;
        if self.read_election(&wtxn, new.election)?.is_none() {
            return Err(StoreError::ForeignKey(format!(
                "election {} does not exist",
                new.election
            )));
        }
        if new.is_nota && !self.nota_candidates(&wtxn, new.election)?.is_empty() {
            return Err(StoreError::Duplicate(format!(
                "NOTA candidate for election {}",
                new.election
            )));
        }

        let id = CandidateId::new(self.next_id(&mut wtxn, COUNTER_CANDIDATE)?);
        let record = CandidateRecord {
            id,
            election: new.election,
            name: new.name.clone(),
            symbol: new.symbol.clone(),
            is_nota: new.is_nota,
        };
        self.write_candidate(&mut wtxn, &record)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(%id, election = %new.election, name = %new.name, "inserted candidate");
        Ok(id)
    }

    fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StoreError> {
        let rtxn = self.read_txn()?;
        self.read_candidate(&rtxn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("candidate {id}")))
    }

    fn iter_candidates(&self, election: ElectionId) -> Result<Vec<CandidateRecord>, StoreError> {
        let rtxn = self.read_txn()?;
        let mut records = Vec::new();
        for id in self.candidate_ids(&rtxn, election)? {
            let record = self.read_candidate(&rtxn, id)?.ok_or_else(|| {
                StoreError::Corruption(format!("candidate index points at missing row {id}"))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn update_candidate(
        &self,
        id: CandidateId,
        name: &str,
        symbol: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.write_txn()?;
        let mut record = self
            .read_candidate(&wtxn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("candidate {id}")))?;
        record.name = name.to_string();
        record.symbol = symbol.map(str::to_string);
        self.write_candidate(&mut wtxn, &record)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(%id, name, "updated candidate");
        Ok(())
    }

    fn delete_candidate(&self, id: CandidateId) -> Result<(), StoreError> {
        let mut wtxn = self.write_txn()?;
        let record = self
            .read_candidate(&wtxn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("candidate {id}")))?;

        let votes: Vec<_> = self
            .vote_index_entries(&wtxn, record.election)?
            .into_iter()
            .filter(|&(_, _, candidate)| candidate == id)
            .collect();

        for &(cast_at, vote, _candidate) in &votes {
            self.votes_db
                .delete(&mut wtxn, &keys::vote_key(vote))
                .map_err(LmdbError::from)?;
            self.votes_by_election_db
                .delete(&mut wtxn, &keys::vote_index_key(record.election, cast_at, vote))
                .map_err(LmdbError::from)?;
        }
        self.candidates_db
            .delete(&mut wtxn, &keys::candidate_key(id))
            .map_err(LmdbError::from)?;
        self.candidates_by_election_db
            .delete(&mut wtxn, &keys::candidate_index_key(record.election, id))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::info!(%id, votes = votes.len(), "deleted candidate");
        Ok(())
    }

    fn find_or_create_nota(&self, election: ElectionId) -> Result<CandidateId, StoreError> {
        // Lookup and insert share one write transaction; LMDB's single
        // writer makes this the critical section the NOTA invariant needs.
        let mut wtxn = self.write_txn()?;
        if self.read_election(&wtxn, election)?.is_none() {
            return Err(StoreError::ForeignKey(format!(
                "election {election} does not exist"
            )));
        }

        let notas = self.nota_candidates(&wtxn, election)?;
        match notas.len() {
            0 => {
                let id = CandidateId::new(self.next_id(&mut wtxn, COUNTER_CANDIDATE)?);
                let record = CandidateRecord {
                    id,
                    election,
                    name: NOTA_LABEL.to_string(),
                    symbol: None,
                    is_nota: true,
                };
                self.write_candidate(&mut wtxn, &record)?;
                wtxn.commit().map_err(LmdbError::from)?;
                tracing::info!(%id, %election, "provisioned NOTA candidate");
                Ok(id)
            }
            1 => {
                let id = notas[0].id;
                wtxn.commit().map_err(LmdbError::from)?;
                Ok(id)
            }
            n => Err(StoreError::Corruption(format!(
                "election {election} has {n} NOTA candidates"
            ))),
        }
    }
}
