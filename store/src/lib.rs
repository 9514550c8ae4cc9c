//! Abstract persistence gateway traits for pollbox.
//!
//! Every storage backend (LMDB for the station, in-memory for testing)
//! implements these traits. The session, roster, and tally engines depend
//! only on the traits.
//!
//! Backend contract: every trait method is one atomic operation, and all
//! operations across all callers are serialized by the backend. In
//! particular `find_or_create_nota` is a single critical section, so
//! concurrent first NOTA casts can never provision two NOTA rows.

pub mod candidate;
pub mod election;
pub mod error;
pub mod vote;

pub use candidate::{CandidateRecord, CandidateStore, NewCandidate, NOTA_LABEL};
pub use election::{ElectionRecord, ElectionStore, NewElection};
pub use error::StoreError;
pub use vote::{VoteRecord, VoteStore};

/// A complete persistence gateway: all three relations behind one handle.
pub trait Store: ElectionStore + CandidateStore + VoteStore {}

impl<T: ElectionStore + CandidateStore + VoteStore> Store for T {}
