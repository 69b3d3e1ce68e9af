use std::borrow::Cow;

use multiproxy_calldata_store::TransactionStoreError;

use crate::chain::ChainError;

pub type Result<T, E = CalldataEngineError> = core::result::Result<T, E>;

/// Errors returned by the merger and the poller.
#[derive(Debug, thiserror::Error)]
#[error("calldata engine error: {0}")]
pub struct CalldataEngineError(#[from] CalldataEngineErrorKind);

/// The cause of a [`CalldataEngineError`].
#[derive(Debug, thiserror::Error)]
pub enum CalldataEngineErrorKind {
    /// A chain query failed. The pass is aborted and retried on the next poll.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// The transaction store rejected a mutation.
    #[error("transaction store error: {0}")]
    TransactionStore(#[from] TransactionStoreError),

    /// An unclassified error occurred.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl CalldataEngineError {
    /// Returns the cause.
    pub fn kind(&self) -> &CalldataEngineErrorKind {
        &self.0
    }
}

impl CalldataEngineErrorKind {
    /// Creates an `Other` error from any type that can be converted to a string.
    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}

impl From<ChainError> for CalldataEngineError {
    fn from(err: ChainError) -> Self {
        Self(err.into())
    }
}

impl From<TransactionStoreError> for CalldataEngineError {
    fn from(err: TransactionStoreError) -> Self {
        Self(err.into())
    }
}
