use pollbox_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    /// Another candidate of the same election already uses this symbol.
    /// The offending write is rejected, not merely warned about.
    #[error("symbol '{symbol}' is already used by candidate '{name}'")]
    DuplicateSymbol { symbol: String, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
