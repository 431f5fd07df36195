use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// None of the client's short-chain hashes is a block we hold.
    #[error("no common block between the client chain and ours")]
    ChainDisjoint,
    /// A block the caller assumed present is not, e.g. the genesis
    /// block before the indexer has run, or a progress row whose
    /// block was purged by a reorganization.
    #[error("block not found at height {0}")]
    MissingBlock(u64),
    /// A row failed to decode, e.g. a hash column that is not valid
    /// 32-byte hex.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Collapse `RowNotFound` into a domain error, everything else
    /// stays a database error.
    pub(crate) fn on_missing_row(err: sqlx::Error, missing: Self) -> Self {
        match err {
            sqlx::Error::RowNotFound => missing,
            other => Self::Database(other),
        }
    }
}
