use pollbox_roster::RosterError;
use pollbox_session::SessionError;
use pollbox_store::StoreError;
use pollbox_tally::TallyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationError {
    /// Wrong administrator password; the protected operation did not occur.
    #[error("administrator password rejected")]
    Authentication,

    /// A rejected administrative input (empty name, missing symbol file, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("tally error: {0}")]
    Tally(#[from] TallyError),

    #[error("config error: {0}")]
    Config(String),
}
