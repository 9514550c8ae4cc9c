use pollbox_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TallyError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
