use std::borrow::Cow;

use multiproxy_calldata_domain::tx::TxIndex;

pub type Result<T, E = TransactionStoreError> = core::result::Result<T, E>;

/// Errors that can occur when mutating the transaction store
#[derive(Debug, thiserror::Error)]
pub enum TransactionStoreError {
    /// No transaction lives at the given index.
    #[error("transaction {0} not found")]
    NotFound(TxIndex),

    /// A link would make a transaction its own ancestor.
    #[error("linking {child} under {parent} would create a cycle")]
    Cycle {
        /// The transaction that would become the parent.
        parent: TxIndex,
        /// The transaction that would become the child.
        child: TxIndex,
    },

    /// An unclassified error occurred.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl TransactionStoreError {
    /// Creates an unclassified error.
    pub fn other<T>(msg: T) -> Self
    where
        Cow<'static, str>: From<T>,
    {
        Self::Other(msg.into())
    }
}
