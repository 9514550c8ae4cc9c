use pollbox_roster::{RosterError, RosterVerdict};
use pollbox_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The roster check blocked session construction.
    #[error("election is not ready for voting: {0}")]
    NotReady(RosterVerdict),

    /// Wrong administrator password; the session state is unchanged.
    #[error("administrator password rejected")]
    Authentication,

    /// The session observed store corruption earlier and refuses further
    /// casts for this election until it is rebuilt after repair.
    #[error("session halted: store reported corruption for this election")]
    Halted,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Roster(#[from] RosterError),
}
