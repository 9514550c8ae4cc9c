//! Nullable infrastructure for deterministic testing.
//!
//! The persistence gateway is abstracted behind the `pollbox-store` traits.
//! This crate provides an in-memory implementation that never touches the
//! filesystem, so session, roster, and tally behavior can be tested without
//! an LMDB environment.
//!
//! Usage: swap the real store for [`NullStore`] in tests.

pub mod store;

pub use store::NullStore;
