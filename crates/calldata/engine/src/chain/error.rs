use std::borrow::Cow;

/// Errors reported by a [`ChainApi`](super::ChainApi) or [`BestTxSource`](crate::BestTxSource)
/// implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    /// The call bytes could not be decoded with the chain's metadata.
    #[error("decode error: {0}")]
    Decode(Cow<'static, str>),

    /// An event, storage or indexer query failed.
    #[error("query error: {0}")]
    Query(Cow<'static, str>),

    /// An unclassified error occurred.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl ChainError {
    /// Creates a `Decode` error.
    pub fn decode<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Decode(err.into())
    }

    /// Creates a `Query` error.
    pub fn query<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Query(err.into())
    }

    /// Creates an `Other` error.
    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}
