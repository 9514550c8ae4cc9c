//! Candidate storage trait.

use crate::StoreError;
use pollbox_types::{CandidateId, ElectionId};
use serde::{Deserialize, Serialize};

/// Display name of the lazily provisioned "None of the Above" candidate.
pub const NOTA_LABEL: &str = "NOTA";

/// One candidate as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub election: ElectionId,
    pub name: String,
    /// Path to the ballot symbol image. `None` only for the NOTA row.
    pub symbol: Option<String>,
    pub is_nota: bool,
}

/// Fields of a candidate about to be inserted; the store allocates the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCandidate {
    pub election: ElectionId,
    pub name: String,
    pub symbol: Option<String>,
    pub is_nota: bool,
}

/// Trait for candidate storage operations.
pub trait CandidateStore {
    /// Insert a new candidate and return its generated id.
    ///
    /// The owning election must exist. Inserting with `is_nota` set fails
    /// with [`StoreError::Duplicate`] when the election already has a NOTA
    /// row; `find_or_create_nota` is the normal way to provision one.
    fn insert_candidate(&self, new: &NewCandidate) -> Result<CandidateId, StoreError>;

    fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StoreError>;

    /// All candidates of an election, id ascending.
    fn iter_candidates(&self, election: ElectionId) -> Result<Vec<CandidateRecord>, StoreError>;

    /// Replace a candidate's name and symbol. The NOTA flag is not editable.
    fn update_candidate(
        &self,
        id: CandidateId,
        name: &str,
        symbol: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Delete a candidate, cascading to its votes.
    fn delete_candidate(&self, id: CandidateId) -> Result<(), StoreError>;

    /// Return the election's NOTA candidate id, inserting the row first if
    /// it does not exist yet.
    ///
    /// Lookup and insert form one atomic critical section: at most one NOTA
    /// row can ever exist per election. Finding more than one reports
    /// [`StoreError::Corruption`].
    fn find_or_create_nota(&self, election: ElectionId) -> Result<CandidateId, StoreError>;
}
