//! Pre-voting roster validation.
//!
//! A session may only start when every ordinary candidate carries a unique,
//! present symbol image. [`check`] applies the full rule set and yields a
//! [`RosterVerdict`]; [`ensure_symbol_available`] is the narrower check run
//! when a single candidate is added or edited.

pub mod check;
pub mod error;

pub use check::{check, ensure_symbol_available, normalize_symbol, RosterVerdict};
pub use error::RosterError;
