//! LMDB database integrity checks.
//!
//! Run on station startup to detect a damaged store before any session or
//! administrative operation touches it.

use std::path::Path;

use heed::types::Bytes;

use pollbox_store::StoreError;

use crate::environment::{
    LmdbStore, DB_CANDIDATES, DB_CANDIDATES_BY_ELECTION, DB_ELECTIONS, DB_ELECTION_NAMES,
    DB_META, DB_VOTES, DB_VOTES_BY_ELECTION,
};
use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that exist in a valid pollbox LMDB environment.
const EXPECTED_DATABASES: &[&str] = &[
    DB_ELECTIONS,
    DB_ELECTION_NAMES,
    DB_CANDIDATES,
    DB_CANDIDATES_BY_ELECTION,
    DB_VOTES,
    DB_VOTES_BY_ELECTION,
    DB_META,
];

impl LmdbStore {
    /// Open each expected database and count its entries. Read failures are
    /// recorded in the report rather than causing a hard error.
    pub fn check_integrity(&self) -> Result<IntegrityReport, StoreError> {
        let mut report = IntegrityReport {
            databases_checked: 0,
            total_entries: 0,
            errors: Vec::new(),
        };

        let rtxn = self.read_txn()?;
        for &db_name in EXPECTED_DATABASES {
            match self
                .env()
                .open_database::<Bytes, Bytes>(&rtxn, Some(db_name))
            {
                Ok(Some(db)) => {
                    report.databases_checked += 1;
                    match db.len(&rtxn) {
                        Ok(count) => {
                            report.total_entries += count;
                        }
                        Err(e) => {
                            report
                                .errors
                                .push(format!("failed to read database '{}': {}", db_name, e));
                        }
                    }
                }
                Ok(None) => {
                    report
                        .errors
                        .push(format!("expected database '{}' is missing", db_name));
                }
                Err(e) => {
                    report
                        .errors
                        .push(format!("failed to open database '{}': {}", db_name, e));
                }
            }
        }

        Ok(report)
    }
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error if
/// the directory exists but `data.mdb` is missing, which suggests corruption
/// or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        return Ok(()); // Fresh start
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(LmdbError::Heed(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ))
        .into());
    }
    Ok(())
}
