//! LMDB persistence backend for pollbox.
//!
//! Implements the gateway traits from `pollbox-store` using the `heed` LMDB
//! bindings. All relations live in one environment; every trait method is a
//! single LMDB transaction, so each call is atomic and writes are serialized
//! by LMDB's single-writer lock. Cascading deletes and the NOTA
//! lookup-or-insert run inside one write transaction each.

pub mod candidate;
pub mod election;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod vote;

pub use environment::LmdbStore;
pub use error::LmdbError;
pub use integrity::{check_data_dir, IntegrityReport};
