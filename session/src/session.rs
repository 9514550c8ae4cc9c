//! The ballot session engine.

use std::sync::Arc;

use pollbox_credential::verify_password;
use pollbox_roster::check;
use pollbox_store::{ElectionRecord, Store, StoreError};
use pollbox_types::{CandidateId, ElectionId, Timestamp, VoteId};

use crate::error::SessionError;
use crate::state::{BallotChoice, BallotEntry, BallotState};

/// What a `select` call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The tentative selection now points at the requested entry.
    Selected,
    /// Wrong state or out-of-range index; selection unchanged.
    Ignored,
}

/// What a `cast` call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastOutcome {
    /// One vote row was durably recorded.
    Cast(VoteId),
    /// No selection exists or the state does not allow casting.
    Ignored,
}

/// What an `advance_ballot` call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Selection cleared; the next ballot is open.
    Advanced,
    /// Wrong state; nothing changed.
    Ignored,
}

/// What an `undo_last_vote` call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The most recent vote was deleted and the next ballot is open.
    Undone(VoteId),
    /// No vote existed to delete; the next ballot is open anyway.
    NothingToUndo,
    /// Wrong state; nothing changed.
    Ignored,
}

/// One voting station's pass through a stream of ballots.
///
/// The session snapshots the roster at construction and appends the
/// synthetic NOTA entry after all real candidates. Exactly one tentative
/// selection is held at a time; re-selecting overwrites it. The shared
/// store serializes every gateway call, so a cast is atomic from this
/// session's point of view.
#[derive(Debug)]
pub struct BallotSession<S> {
    store: Arc<S>,
    election: ElectionRecord,
    ballot: Vec<BallotEntry>,
    state: BallotState,
    selection: Option<usize>,
    halted: bool,
}

impl<S: Store> BallotSession<S> {
    /// Build a session for an election, gated by the roster check.
    ///
    /// A roster verdict other than `Ready` refuses construction with
    /// [`SessionError::NotReady`] carrying the verdict.
    pub fn start(store: Arc<S>, election: ElectionId) -> Result<Self, SessionError> {
        let record = store.get_election(election)?;
        let verdict = check(store.as_ref(), election)?;
        if !verdict.is_ready() {
            return Err(SessionError::NotReady(verdict));
        }

        let mut ballot: Vec<BallotEntry> = store
            .iter_candidates(election)?
            .into_iter()
            .filter(|c| !c.is_nota)
            .map(|c| BallotEntry {
                label: c.name,
                symbol: c.symbol,
                choice: BallotChoice::Candidate(c.id),
            })
            .collect();
        ballot.push(BallotEntry::nota());

        tracing::info!(
            election = %record.id,
            name = %record.name,
            entries = ballot.len(),
            "ballot session started"
        );
        Ok(Self {
            store,
            election: record,
            ballot,
            state: BallotState::AwaitingSelection,
            selection: None,
            halted: false,
        })
    }

    /// Tentatively select the ballot entry at `index`.
    ///
    /// Valid in `AwaitingSelection` and `SelectionMade` (re-selecting
    /// replaces the choice). Ignored in any other state and for an
    /// out-of-range index. Persists nothing.
    pub fn select(&mut self, index: usize) -> SelectOutcome {
        match self.state {
            BallotState::AwaitingSelection | BallotState::SelectionMade => {
                if index >= self.ballot.len() {
                    return SelectOutcome::Ignored;
                }
                self.selection = Some(index);
                self.state = BallotState::SelectionMade;
                SelectOutcome::Selected
            }
            _ => SelectOutcome::Ignored,
        }
    }

    /// Durably record the tentative selection as one vote.
    ///
    /// Valid only in `SelectionMade`. A NOTA selection first resolves the
    /// election's NOTA candidate row, provisioning it on first use. On
    /// success the session lands on `AwaitingNextBallot`. On a store
    /// failure nothing is recorded and the state stays `SelectionMade`, so
    /// the voter's choice survives for a retry.
    pub fn cast(&mut self, now: Timestamp) -> Result<CastOutcome, SessionError> {
        if self.state != BallotState::SelectionMade {
            return Ok(CastOutcome::Ignored);
        }
        if self.halted {
            return Err(SessionError::Halted);
        }
        let Some(index) = self.selection else {
            return Ok(CastOutcome::Ignored);
        };

        let candidate = match self.ballot[index].choice {
            BallotChoice::Candidate(id) => id,
            BallotChoice::Nota => self.resolve_nota()?,
        };

        self.state = BallotState::BallotCast;
        match self.store.insert_vote(self.election.id, candidate, now) {
            Ok(vote) => {
                self.state = BallotState::AwaitingNextBallot;
                tracing::debug!(
                    election = %self.election.id,
                    %vote,
                    candidate = %candidate,
                    "ballot cast"
                );
                Ok(CastOutcome::Cast(vote))
            }
            Err(err) => {
                // Nothing was written; the selection stays live for a retry.
                self.state = BallotState::SelectionMade;
                Err(self.note_store_failure(err))
            }
        }
    }

    /// Clear the selection and open the next ballot.
    ///
    /// Valid only in `AwaitingNextBallot`; calling it again once already
    /// in `AwaitingSelection` is a no-op, not an error.
    pub fn advance_ballot(&mut self) -> AdvanceOutcome {
        if self.state != BallotState::AwaitingNextBallot {
            return AdvanceOutcome::Ignored;
        }
        self.selection = None;
        self.state = BallotState::AwaitingSelection;
        AdvanceOutcome::Advanced
    }

    /// Delete the most recent vote of this election, then open the next
    /// ballot.
    ///
    /// Valid only in `AwaitingNextBallot`, i.e. only for the ballot just
    /// cast. The vote to delete is found by timestamp ordering against the
    /// durable store, not by a remembered row id, so this stays correct
    /// even if the store's identity counters were reset in between. With
    /// no vote on record the deletion is skipped but the session still
    /// advances.
    pub fn undo_last_vote(&mut self) -> Result<UndoOutcome, SessionError> {
        if self.state != BallotState::AwaitingNextBallot {
            return Ok(UndoOutcome::Ignored);
        }
        let removed = self
            .store
            .remove_latest_vote(self.election.id)
            .map_err(|err| self.note_store_failure(err))?;

        self.selection = None;
        self.state = BallotState::AwaitingSelection;
        match removed {
            Some(vote) => {
                tracing::info!(election = %self.election.id, %vote, "vote undone");
                Ok(UndoOutcome::Undone(vote))
            }
            None => Ok(UndoOutcome::NothingToUndo),
        }
    }

    /// Terminate the session after verifying the administrator password.
    ///
    /// A wrong password leaves the state untouched. A correct one moves to
    /// `Ended` from any state, discarding an uncast tentative selection.
    pub fn end(&mut self, password: &str) -> Result<(), SessionError> {
        if !verify_password(password, &self.election.credential) {
            return Err(SessionError::Authentication);
        }
        self.selection = None;
        self.state = BallotState::Ended;
        tracing::info!(election = %self.election.id, "ballot session ended");
        Ok(())
    }

    pub fn current_state(&self) -> BallotState {
        self.state
    }

    /// The tentatively selected entry, for display.
    pub fn current_selection(&self) -> Option<&BallotEntry> {
        self.selection.map(|index| &self.ballot[index])
    }

    /// The ballot as presented: real candidates in id order, NOTA last.
    pub fn ballot(&self) -> &[BallotEntry] {
        &self.ballot
    }

    pub fn election(&self) -> &ElectionRecord {
        &self.election
    }

    fn resolve_nota(&mut self) -> Result<CandidateId, SessionError> {
        self.store
            .find_or_create_nota(self.election.id)
            .map_err(|err| self.note_store_failure(err))
    }

    /// Corruption means the store contradicts its own invariants; this
    /// session refuses further casts until rebuilt after repair.
    fn note_store_failure(&mut self, err: StoreError) -> SessionError {
        if matches!(err, StoreError::Corruption(_)) {
            tracing::error!(election = %self.election.id, error = %err, "halting session");
            self.halted = true;
        }
        SessionError::Store(err)
    }
}
