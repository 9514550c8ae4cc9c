//! Tally engine — vote counts, percentages, bulk clear.
//!
//! Counting is outer-join style: every candidate of the election gets a row,
//! zero-vote ones and the NOTA row (once provisioned) included. A store
//! failure propagates; the engine never substitutes a partial or zeroed
//! tally for one it could not compute.

pub mod engine;
pub mod error;

pub use engine::{TallyEngine, TallyRow};
pub use error::TallyError;
