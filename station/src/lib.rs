//! Voting station service — wires the engines over one shared store.
//!
//! The station is the administrative front of the system:
//! - Creates and deletes password-protected elections
//! - Manages each election's candidate roster
//! - Gates session start on the roster check
//! - Exposes the tally and the authenticated bulk vote reset
//!
//! Voting itself happens through a [`pollbox_session::BallotSession`]
//! obtained from [`Station::start_session`].

pub mod admin;
pub mod config;
pub mod error;
pub mod logging;

pub use admin::Station;
pub use config::StationConfig;
pub use error::StationError;
pub use logging::{init_logging, LogFormat};
