//! LMDB environment setup and shared transaction helpers.

use std::ops::Bound;
use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};

use pollbox_store::{CandidateRecord, ElectionRecord, StoreError, VoteRecord};
use pollbox_types::{CandidateId, ElectionId, Timestamp, VoteId};

use crate::keys;
use crate::LmdbError;

/// On-disk schema version. Written on first open, checked on every reopen.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub(crate) const DB_ELECTIONS: &str = "elections";
pub(crate) const DB_ELECTION_NAMES: &str = "election_names";
pub(crate) const DB_CANDIDATES: &str = "candidates";
pub(crate) const DB_CANDIDATES_BY_ELECTION: &str = "candidates_by_election";
pub(crate) const DB_VOTES: &str = "votes";
pub(crate) const DB_VOTES_BY_ELECTION: &str = "votes_by_election";
pub(crate) const DB_META: &str = "meta";

pub(crate) const COUNTER_ELECTION: &[u8] = b"next_election_id";
pub(crate) const COUNTER_CANDIDATE: &[u8] = b"next_candidate_id";
pub(crate) const COUNTER_VOTE: &[u8] = b"next_vote_id";

const MAX_DBS: u32 = 7;

/// The LMDB-backed persistence gateway.
///
/// Record databases hold bincode-encoded rows keyed by 8-byte big-endian id;
/// index databases use the composite keys described in [`crate::keys`]. Ids
/// come from counters in the meta database, allocated inside the same write
/// transaction as the insert they serve.
#[derive(Debug)]
pub struct LmdbStore {
    env: Env,
    pub(crate) elections_db: Database<Bytes, Bytes>,
    pub(crate) election_names_db: Database<Bytes, Bytes>,
    pub(crate) candidates_db: Database<Bytes, Bytes>,
    pub(crate) candidates_by_election_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) votes_by_election_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create the store at `path` with the given LMDB map size.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)
            .map_err(|e| StoreError::Backend(format!("create data dir: {e}")))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(MAX_DBS)
                .map_size(map_size)
                .open(path)
                .map_err(LmdbError::from)?
        };

        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let elections_db = env
            .create_database(&mut wtxn, Some(DB_ELECTIONS))
            .map_err(LmdbError::from)?;
        let election_names_db = env
            .create_database(&mut wtxn, Some(DB_ELECTION_NAMES))
            .map_err(LmdbError::from)?;
        let candidates_db = env
            .create_database(&mut wtxn, Some(DB_CANDIDATES))
            .map_err(LmdbError::from)?;
        let candidates_by_election_db = env
            .create_database(&mut wtxn, Some(DB_CANDIDATES_BY_ELECTION))
            .map_err(LmdbError::from)?;
        let votes_db = env
            .create_database(&mut wtxn, Some(DB_VOTES))
            .map_err(LmdbError::from)?;
        let votes_by_election_db = env
            .create_database(&mut wtxn, Some(DB_VOTES_BY_ELECTION))
            .map_err(LmdbError::from)?;
        let meta_db = env
            .create_database(&mut wtxn, Some(DB_META))
            .map_err(LmdbError::from)?;

        check_schema_version(&meta_db, &mut wtxn)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(path = %path.display(), "opened LMDB store");
        Ok(Self {
            env,
            elections_db,
            election_names_db,
            candidates_db,
            candidates_by_election_db,
            votes_db,
            votes_by_election_db,
            meta_db,
        })
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn read_txn(&self) -> Result<RoTxn<'_>, StoreError> {
        Ok(self.env.read_txn().map_err(LmdbError::from)?)
    }

    pub(crate) fn write_txn(&self) -> Result<RwTxn<'_>, StoreError> {
        Ok(self.env.write_txn().map_err(LmdbError::from)?)
    }

    /// Allocate the next id for a counter key, inside the caller's write
    /// transaction. Counters only grow, so deleting the newest record never
    /// recycles its id.
    pub(crate) fn next_id(&self, txn: &mut RwTxn<'_>, counter: &[u8]) -> Result<u64, StoreError> {
        let current = self
            .meta_db
            .get(txn, counter)
            .map_err(LmdbError::from)?
            .and_then(|b| b.try_into().ok().map(u64::from_be_bytes))
            .unwrap_or(0);
        let next = current + 1;
        self.meta_db
            .put(txn, counter, &next.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(next)
    }

    pub(crate) fn read_election(
        &self,
        txn: &RoTxn<'_>,
        id: ElectionId,
    ) -> Result<Option<ElectionRecord>, StoreError> {
        match self
            .elections_db
            .get(txn, &keys::election_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn read_candidate(
        &self,
        txn: &RoTxn<'_>,
        id: CandidateId,
    ) -> Result<Option<CandidateRecord>, StoreError> {
        match self
            .candidates_db
            .get(txn, &keys::candidate_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn read_vote(
        &self,
        txn: &RoTxn<'_>,
        id: VoteId,
    ) -> Result<Option<VoteRecord>, StoreError> {
        match self
            .votes_db
            .get(txn, &keys::vote_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    /// Candidate ids of an election, id ascending.
    pub(crate) fn candidate_ids(
        &self,
        txn: &RoTxn<'_>,
        election: ElectionId,
    ) -> Result<Vec<CandidateId>, StoreError> {
        let prefix = keys::election_key(election);
        let mut upper = prefix.to_vec();
        keys::increment_prefix(&mut upper);
        let bounds = (Bound::Included(&prefix[..]), Bound::Excluded(upper.as_slice()));

        let iter = self
            .candidates_by_election_db
            .range(txn, &bounds)
            .map_err(LmdbError::from)?;
        let mut ids = Vec::new();
        for result in iter {
            let (key, _val) = result.map_err(LmdbError::from)?;
            let id = keys::candidate_from_index_key(key).ok_or_else(|| {
                StoreError::Corruption(format!("malformed candidate index key ({} bytes)", key.len()))
            })?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Vote index entries of an election as (cast_at, vote, candidate),
    /// oldest first.
    pub(crate) fn vote_index_entries(
        &self,
        txn: &RoTxn<'_>,
        election: ElectionId,
    ) -> Result<Vec<(Timestamp, VoteId, CandidateId)>, StoreError> {
        let prefix = keys::election_key(election);
        let mut upper = prefix.to_vec();
        keys::increment_prefix(&mut upper);
        let bounds = (Bound::Included(&prefix[..]), Bound::Excluded(upper.as_slice()));

        let iter = self
            .votes_by_election_db
            .range(txn, &bounds)
            .map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for result in iter {
            let (key, val) = result.map_err(LmdbError::from)?;
            let (cast_at, vote) = keys::vote_from_index_key(key).ok_or_else(|| {
                StoreError::Corruption(format!("malformed vote index key ({} bytes)", key.len()))
            })?;
            let candidate = val
                .try_into()
                .ok()
                .map(u64::from_be_bytes)
                .map(CandidateId::new)
                .ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "malformed vote index value ({} bytes)",
                        val.len()
                    ))
                })?;
            entries.push((cast_at, vote, candidate));
        }
        Ok(entries)
    }
}

/// Verify the stored schema version, writing it on a fresh database.
fn check_schema_version(
    meta_db: &Database<Bytes, Bytes>,
    wtxn: &mut RwTxn<'_>,
) -> Result<(), StoreError> {
    let stored = meta_db
        .get(wtxn, SCHEMA_VERSION_KEY)
        .map_err(LmdbError::from)?;
    match stored {
        None => {
            meta_db
                .put(wtxn, SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_le_bytes())
                .map_err(LmdbError::from)?;
            tracing::info!(version = SCHEMA_VERSION, "initialised store schema");
            Ok(())
        }
        Some(bytes) if bytes.len() == 4 => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                StoreError::Corruption("schema_version has unexpected byte length".to_string())
            })?;
            let version = u32::from_le_bytes(arr);
            if version == SCHEMA_VERSION {
                Ok(())
            } else {
                Err(StoreError::Corruption(format!(
                    "store schema version {} is not supported (expected {})",
                    version, SCHEMA_VERSION
                )))
            }
        }
        Some(_) => Err(StoreError::Corruption(
            "schema_version has unexpected byte length".to_string(),
        )),
    }
}
