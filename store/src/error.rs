use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique constraint violation: election name, or a second NOTA row
    /// requested where one already exists.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Referential integrity violation, e.g. a vote naming a candidate that
    /// belongs to a different election.
    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store contradicts an invariant it is supposed to uphold (for
    /// example, more than one NOTA candidate for an election). Never
    /// resolved silently; surfaced for administrative repair.
    #[error("store is corrupted: {0}")]
    Corruption(String),
}
