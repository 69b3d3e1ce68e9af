//! JSON report of the tracked transaction trees and the signing paths open to the local signer.

use multiproxy_calldata_domain::{
    Address, CallHash,
    account::AccountData,
    path::FilterPath,
    tx::{Transaction, TransactionId, TxStatus},
};
use multiproxy_calldata_engine::{AccountSource, PendingTx, find_filter_paths};
use multiproxy_calldata_store::TransactionStore;
use serde::Serialize;

/// Everything the tracker knows after a polling session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    transactions: Vec<&'a Transaction>,
    accounts: Vec<AccountReport>,
}

/// The signing paths of one account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountReport {
    address: Address,
    paths: Vec<FilterPath>,
    pending: Vec<PendingReport>,
}

/// The signing paths that can progress one open transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReport {
    id: TransactionId,
    hash: CallHash,
    status: TxStatus,
    paths: Vec<FilterPath>,
}

impl<'a> Report<'a> {
    /// Builds the report for every account of `accounts`.
    ///
    /// Each open root transaction sent by an account gets the paths that can progress it.
    pub fn new<A>(store: &'a TransactionStore, accounts: &[AccountData], source: &A) -> Self
    where
        A: AccountSource + ?Sized,
    {
        let accounts = accounts
            .iter()
            .map(|account| {
                let pending = store
                    .roots()
                    .filter(|tx| tx.sender() == account.address() && tx.status().is_open())
                    .map(|tx| PendingReport {
                        id: tx.id(),
                        hash: tx.hash(),
                        status: tx.status(),
                        paths: find_filter_paths(
                            account,
                            source,
                            Some(PendingTx::new(store, tx.index())),
                        ),
                    })
                    .collect();

                AccountReport {
                    address: account.address(),
                    paths: find_filter_paths(account, source, None),
                    pending,
                }
            })
            .collect();

        Self { transactions: store.iter().collect(), accounts }
    }

    /// Returns every tracked transaction.
    pub fn transactions(&self) -> &[&'a Transaction] {
        &self.transactions
    }

    /// Returns the per-account signing paths.
    pub fn accounts(&self) -> &[AccountReport] {
        &self.accounts
    }
}

impl AccountReport {
    /// Returns the account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns every control path of the account.
    pub fn paths(&self) -> &[FilterPath] {
        &self.paths
    }

    /// Returns the open transactions of the account.
    pub fn pending(&self) -> &[PendingReport] {
        &self.pending
    }
}

impl PendingReport {
    /// Returns the call hash of the transaction.
    pub fn hash(&self) -> CallHash {
        self.hash
    }

    /// Returns the transaction status.
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Returns the paths that can progress the transaction.
    pub fn paths(&self) -> &[FilterPath] {
        &self.paths
    }
}
