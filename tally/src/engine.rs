//! Vote counting.

use std::collections::BTreeMap;

use pollbox_store::{Store, StoreError};
use pollbox_types::{CandidateId, ElectionId};

use crate::TallyError;

/// One line of a tally: a candidate and how it fared.
#[derive(Clone, Debug, PartialEq)]
pub struct TallyRow {
    pub candidate: CandidateId,
    pub name: String,
    pub votes: u64,
    /// Share of the election's total, rounded to two decimal places.
    /// 0 when the election has no votes at all.
    pub percentage: f64,
    pub symbol: Option<String>,
}

/// Engine for counting and clearing an election's votes.
pub struct TallyEngine;

impl TallyEngine {
    /// Count an election's votes grouped by candidate.
    ///
    /// Every candidate appears, zero-vote ones included. Rows are ordered
    /// by vote count descending with candidate id ascending as the
    /// tiebreak, so the result is deterministic for a fixed store.
    pub fn tally<S: Store>(
        &self,
        store: &S,
        election: ElectionId,
    ) -> Result<Vec<TallyRow>, TallyError> {
        store.get_election(election)?;
        let candidates = store.iter_candidates(election)?;
        let votes = store.iter_votes(election)?;

        let mut counts: BTreeMap<CandidateId, u64> =
            candidates.iter().map(|c| (c.id, 0)).collect();
        for vote in &votes {
            match counts.get_mut(&vote.candidate) {
                Some(count) => *count += 1,
                None => {
                    return Err(StoreError::Corruption(format!(
                        "vote {} references candidate {} outside election {election}",
                        vote.id, vote.candidate
                    ))
                    .into());
                }
            }
        }

        let total = votes.len() as u64;
        let mut rows: Vec<TallyRow> = candidates
            .into_iter()
            .map(|c| TallyRow {
                candidate: c.id,
                votes: counts[&c.id],
                percentage: percentage(counts[&c.id], total),
                name: c.name,
                symbol: c.symbol,
            })
            .collect();
        rows.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.candidate.cmp(&b.candidate)));
        Ok(rows)
    }

    /// Delete every vote of an election, leaving candidates untouched.
    /// Returns how many were removed. Irreversible; callers gate this
    /// behind administrator authentication.
    pub fn clear<S: Store>(&self, store: &S, election: ElectionId) -> Result<u64, TallyError> {
        Ok(store.clear_votes(election)?)
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = votes as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollbox_nullables::NullStore;
    use pollbox_store::{CandidateStore, ElectionStore, NewCandidate, NewElection, VoteStore};
    use pollbox_types::{CredentialDigest, Timestamp};

    fn make_election(store: &NullStore, name: &str) -> ElectionId {
        store
            .insert_election(&NewElection {
                name: name.to_string(),
                credential: CredentialDigest::new([1u8; 32]),
                created_at: Timestamp::new(1000),
            })
            .unwrap()
    }

    fn make_candidate(store: &NullStore, election: ElectionId, name: &str) -> CandidateId {
        store
            .insert_candidate(&NewCandidate {
                election,
                name: name.to_string(),
                symbol: Some(format!("{}.png", name.to_lowercase())),
                is_nota: false,
            })
            .unwrap()
    }

    fn cast(store: &NullStore, election: ElectionId, candidate: CandidateId, times: u64) {
        for i in 0..times {
            store
                .insert_vote(election, candidate, Timestamp::new(1000 + i))
                .unwrap();
        }
    }

    #[test]
    fn zero_votes_means_zero_percentages() {
        let store = NullStore::new();
        let election = make_election(&store, "Board");
        make_candidate(&store, election, "A");
        make_candidate(&store, election, "B");

        let rows = TallyEngine.tally(&store, election).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.votes, 0);
            assert_eq!(row.percentage, 0.0);
        }
    }

    #[test]
    fn board2024_scenario_one_vote_each() {
        let store = NullStore::new();
        let election = make_election(&store, "Board2024");
        let a = make_candidate(&store, election, "A");
        let b = make_candidate(&store, election, "B");
        let nota = store.find_or_create_nota(election).unwrap();
        cast(&store, election, a, 1);
        cast(&store, election, nota, 1);
        cast(&store, election, b, 1);

        let rows = TallyEngine.tally(&store, election).unwrap();
        assert_eq!(rows.len(), 3);
        // All tied at one vote; candidate id breaks the tie.
        assert_eq!(rows[0].candidate, a);
        assert_eq!(rows[1].candidate, b);
        assert_eq!(rows[2].candidate, nota);
        assert_eq!(rows[2].name, "NOTA");
        for row in &rows {
            assert_eq!(row.votes, 1);
            assert_eq!(row.percentage, 33.33);
        }
    }

    #[test]
    fn rows_ordered_by_votes_then_id() {
        let store = NullStore::new();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");
        let b = make_candidate(&store, election, "B");
        let c = make_candidate(&store, election, "C");
        cast(&store, election, a, 1);
        cast(&store, election, b, 3);
        cast(&store, election, c, 2);

        let rows = TallyEngine.tally(&store, election).unwrap();
        let order: Vec<CandidateId> = rows.iter().map(|r| r.candidate).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn zero_vote_candidate_still_listed() {
        let store = NullStore::new();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");
        let b = make_candidate(&store, election, "B");
        cast(&store, election, a, 2);

        let rows = TallyEngine.tally(&store, election).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].candidate, a);
        assert_eq!(rows[0].percentage, 100.0);
        assert_eq!(rows[1].candidate, b);
        assert_eq!(rows[1].votes, 0);
        assert_eq!(rows[1].percentage, 0.0);
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        let store = NullStore::new();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");
        let b = make_candidate(&store, election, "B");
        cast(&store, election, a, 2);
        cast(&store, election, b, 1);

        let rows = TallyEngine.tally(&store, election).unwrap();
        assert_eq!(rows[0].percentage, 66.67);
        assert_eq!(rows[1].percentage, 33.33);
    }

    #[test]
    fn tally_on_missing_election_is_not_found() {
        let store = NullStore::new();
        let err = TallyEngine.tally(&store, ElectionId::new(42)).unwrap_err();
        assert!(matches!(err, TallyError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn clear_removes_votes_keeps_candidates() {
        let store = NullStore::new();
        let election = make_election(&store, "Board");
        let a = make_candidate(&store, election, "A");
        cast(&store, election, a, 3);

        assert_eq!(TallyEngine.clear(&store, election).unwrap(), 3);
        assert_eq!(store.vote_count(election).unwrap(), 0);

        let rows = TallyEngine.tally(&store, election).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].votes, 0);
    }

    #[test]
    fn clear_on_missing_election_is_not_found() {
        let store = NullStore::new();
        let err = TallyEngine.clear(&store, ElectionId::new(42)).unwrap_err();
        assert!(matches!(err, TallyError::Store(StoreError::NotFound(_))));
    }
}
