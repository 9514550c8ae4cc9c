//! Ballot session state machine.
//!
//! One session drives one voting station through a stream of ballots:
//! tentative selection, durable cast, undo of the ballot just cast, and
//! administrator-authenticated termination. The session owns lazy NOTA
//! provisioning: the synthetic "None of the Above" entry is always on the
//! ballot, but its candidate row is written only on the first NOTA cast.
//!
//! All operations are synchronous and run to completion. Inputs that arrive
//! in a state where they do not apply are ignored, never queued.

pub mod error;
pub mod session;
pub mod state;

pub use error::SessionError;
pub use session::{AdvanceOutcome, BallotSession, CastOutcome, SelectOutcome, UndoOutcome};
pub use state::{BallotChoice, BallotEntry, BallotState};
