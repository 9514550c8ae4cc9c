//! The station service: administrative operations over one shared store.

use std::path::Path;
use std::sync::Arc;

use pollbox_credential::{hash_password, verify_password};
use pollbox_roster::{check, ensure_symbol_available, RosterVerdict};
use pollbox_session::BallotSession;
use pollbox_store::{
    CandidateRecord, CandidateStore, ElectionRecord, ElectionStore, NewCandidate, NewElection,
    Store,
};
use pollbox_store_lmdb::{check_data_dir, LmdbStore};
use pollbox_tally::{TallyEngine, TallyRow};
use pollbox_types::{CandidateId, ElectionId, Timestamp};

use crate::{StationConfig, StationError};

/// One voting station over a shared persistence gateway.
///
/// All administrative operations go through here: election lifecycle,
/// roster management, session start, tally, and the authenticated bulk
/// vote reset. Password-gated operations verify the credential first and
/// do nothing on a mismatch.
pub struct Station<S> {
    store: Arc<S>,
    tally: TallyEngine,
}

impl Station<LmdbStore> {
    /// Open the durable store described by `config` and wrap it.
    ///
    /// Runs the integrity check on the freshly opened environment and logs
    /// the report; a damaged directory refuses to open.
    pub fn open(config: &StationConfig) -> Result<Self, StationError> {
        check_data_dir(&config.data_dir)?;
        let store = LmdbStore::open(&config.data_dir, config.map_size())?;

        let report = store.check_integrity()?;
        if report.is_healthy() {
            tracing::info!(
                databases = report.databases_checked,
                entries = report.total_entries,
                "store opened"
            );
        } else {
            for error in &report.errors {
                tracing::warn!(%error, "store integrity");
            }
        }
        Ok(Self::new(Arc::new(store)))
    }
}

impl<S: Store> Station<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            tally: TallyEngine,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ── Elections ──────────────────────────────────────────────────────

    /// Create an election with an administrator password.
    ///
    /// The name must be non-empty and unique; the password non-empty. Only
    /// the password's digest is persisted.
    pub fn create_election(
        &self,
        name: &str,
        password: &str,
        now: Timestamp,
    ) -> Result<ElectionId, StationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StationError::InvalidInput(
                "election name must not be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(StationError::InvalidInput(
                "administrator password must not be empty".to_string(),
            ));
        }

        let id = self.store.insert_election(&NewElection {
            name: name.to_string(),
            credential: hash_password(password),
            created_at: now,
        })?;
        tracing::info!(election = %id, %name, "election created");
        Ok(id)
    }

    /// Verify the administrator password of an election.
    pub fn authenticate(&self, election: ElectionId, password: &str) -> Result<(), StationError> {
        let record = self.store.get_election(election)?;
        if verify_password(password, &record.credential) {
            Ok(())
        } else {
            tracing::warn!(election = %election, "authentication failed");
            Err(StationError::Authentication)
        }
    }

    /// Delete an election and, by cascade, its candidates and votes.
    /// Password-gated.
    pub fn delete_election(
        &self,
        election: ElectionId,
        password: &str,
    ) -> Result<(), StationError> {
        self.authenticate(election, password)?;
        self.store.delete_election(election)?;
        tracing::info!(election = %election, "election deleted");
        Ok(())
    }

    /// All elections, newest first (creation time, then id, descending).
    ///
    /// The store hands them back id ascending; display order is the
    /// station's concern.
    pub fn list_elections(&self) -> Result<Vec<ElectionRecord>, StationError> {
        let mut elections = self.store.iter_elections()?;
        elections.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(elections)
    }

    // ── Candidates ─────────────────────────────────────────────────────

    /// Register an ordinary candidate.
    ///
    /// The symbol path must be non-empty, point at an existing file, and
    /// not collide with another candidate's symbol in this election.
    pub fn add_candidate(
        &self,
        election: ElectionId,
        name: &str,
        symbol: &str,
    ) -> Result<CandidateId, StationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StationError::InvalidInput(
                "candidate name must not be empty".to_string(),
            ));
        }
        let symbol = validated_symbol(symbol)?;
        ensure_symbol_available(self.store.as_ref(), election, symbol, None)?;

        let id = self.store.insert_candidate(&NewCandidate {
            election,
            name: name.to_string(),
            symbol: Some(symbol.to_string()),
            is_nota: false,
        })?;
        tracing::info!(election = %election, candidate = %id, %name, "candidate added");
        Ok(id)
    }

    /// Replace a candidate's name and symbol, under the same checks as
    /// [`Station::add_candidate`] but excluding the candidate's own prior
    /// symbol from the collision check. The NOTA row is not editable.
    pub fn edit_candidate(
        &self,
        candidate: CandidateId,
        name: &str,
        symbol: &str,
    ) -> Result<(), StationError> {
        let record = self.store.get_candidate(candidate)?;
        if record.is_nota {
            return Err(StationError::InvalidInput(
                "the NOTA entry cannot be edited".to_string(),
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(StationError::InvalidInput(
                "candidate name must not be empty".to_string(),
            ));
        }
        let symbol = validated_symbol(symbol)?;
        ensure_symbol_available(self.store.as_ref(), record.election, symbol, Some(candidate))?;

        self.store
            .update_candidate(candidate, name, Some(symbol))?;
        tracing::info!(candidate = %candidate, %name, "candidate updated");
        Ok(())
    }

    /// Remove a candidate and, by cascade, its votes.
    pub fn remove_candidate(&self, candidate: CandidateId) -> Result<(), StationError> {
        self.store.delete_candidate(candidate)?;
        tracing::info!(candidate = %candidate, "candidate removed");
        Ok(())
    }

    /// An election's candidates, NOTA included if provisioned, id ascending.
    pub fn list_candidates(
        &self,
        election: ElectionId,
    ) -> Result<Vec<CandidateRecord>, StationError> {
        Ok(self.store.iter_candidates(election)?)
    }

    // ── Voting ─────────────────────────────────────────────────────────

    /// Run the full pre-voting roster check.
    pub fn roster_check(&self, election: ElectionId) -> Result<RosterVerdict, StationError> {
        Ok(check(self.store.as_ref(), election)?)
    }

    /// Build a ballot session for an election.
    ///
    /// The session itself applies the roster gate; a blocked roster
    /// surfaces as [`pollbox_session::SessionError::NotReady`].
    pub fn start_session(&self, election: ElectionId) -> Result<BallotSession<S>, StationError> {
        Ok(BallotSession::start(self.store.clone(), election)?)
    }

    // ── Results ────────────────────────────────────────────────────────

    /// The election's current tally, ranked.
    pub fn tally(&self, election: ElectionId) -> Result<Vec<TallyRow>, StationError> {
        Ok(self.tally.tally(self.store.as_ref(), election)?)
    }

    /// Delete every vote of an election, keeping its candidates.
    /// Password-gated and irreversible.
    pub fn clear_votes(&self, election: ElectionId, password: &str) -> Result<u64, StationError> {
        self.authenticate(election, password)?;
        let removed = self.tally.clear(self.store.as_ref(), election)?;
        tracing::info!(election = %election, removed, "votes cleared");
        Ok(removed)
    }
}

/// An administrative symbol input must be a non-empty path to an existing
/// file. Returns the trimmed path.
fn validated_symbol(symbol: &str) -> Result<&str, StationError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(StationError::InvalidInput(
            "symbol path must not be empty".to_string(),
        ));
    }
    if !Path::new(symbol).is_file() {
        return Err(StationError::InvalidInput(format!(
            "symbol file '{symbol}' does not exist"
        )));
    }
    Ok(symbol)
}
