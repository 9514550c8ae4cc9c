//! Fundamental types for the pollbox election station.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! record identifiers, timestamps, and the administrator credential digest.

pub mod digest;
pub mod id;
pub mod time;

pub use digest::{CredentialDigest, DigestParseError};
pub use id::{CandidateId, ElectionId, VoteId};
pub use time::Timestamp;
