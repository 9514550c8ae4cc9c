//! Election storage trait.

use crate::StoreError;
use pollbox_types::{CredentialDigest, ElectionId, Timestamp};
use serde::{Deserialize, Serialize};

/// One election as persisted.
///
/// Immutable after creation; removed only by cascading delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionRecord {
    pub id: ElectionId,
    /// Display name, unique across the store.
    pub name: String,
    /// One-way hash of the administrator password.
    pub credential: CredentialDigest,
    pub created_at: Timestamp,
}

/// Fields of an election about to be inserted; the store allocates the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewElection {
    pub name: String,
    pub credential: CredentialDigest,
    pub created_at: Timestamp,
}

/// Trait for election storage operations.
pub trait ElectionStore {
    /// Insert a new election and return its generated id.
    ///
    /// Fails with [`StoreError::Duplicate`] when the name is already taken.
    fn insert_election(&self, new: &NewElection) -> Result<ElectionId, StoreError>;

    fn get_election(&self, id: ElectionId) -> Result<ElectionRecord, StoreError>;

    /// Look an election up by its unique name.
    fn find_election_by_name(&self, name: &str) -> Result<Option<ElectionRecord>, StoreError>;

    /// All elections, id ascending.
    fn iter_elections(&self) -> Result<Vec<ElectionRecord>, StoreError>;

    /// Delete an election, cascading to its candidates and their votes.
    fn delete_election(&self, id: ElectionId) -> Result<(), StoreError>;
}
