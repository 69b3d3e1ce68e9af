//! Enumeration of the signing paths a local key can use to act on an account.

use std::{collections::HashMap, hash::BuildHasher};

use multiproxy_calldata_domain::{
    Address,
    account::{AccountData, AccountKind},
    call::Call,
    path::{FilterPath, FilterPathStep},
    tx::{Transaction, TransactionKind, TxIndex, TxStatus},
};
use multiproxy_calldata_store::TransactionStore;

/// Tells which addresses the local signer controls.
pub trait AccountSource {
    /// Returns the name of the wallet source holding the key of `address`, if it is local.
    fn source(&self, address: Address) -> Option<&str>;
}

impl<S> AccountSource for HashMap<Address, String, S>
where
    S: BuildHasher,
{
    fn source(&self, address: Address) -> Option<&str> {
        self.get(&address).map(String::as_str)
    }
}

/// A transaction to progress, together with the store holding its tree.
#[derive(Debug, Clone, Copy)]
pub struct PendingTx<'a> {
    store: &'a TransactionStore,
    index: TxIndex,
}

impl<'a> PendingTx<'a> {
    /// Refers to the transaction at `index` of `store`.
    pub fn new(store: &'a TransactionStore, index: TxIndex) -> Self {
        Self { store, index }
    }
}

/// Returns every path from `account` down to a key `source` controls.
///
/// Without `tx` every control path is returned. With `tx` only the paths that can progress it
/// are: a delegatee is followed only if it is the delegate that drove `tx`, members only if `tx`
/// is driven by a multisig, and each hop carries the child transaction its next account sent.
/// A leg that already succeeded is pruned with everything below it.
#[tracing::instrument(skip_all, fields(account = %account.address(), with_tx = tx.is_some()))]
pub fn find_filter_paths<A>(
    account: &AccountData,
    source: &A,
    tx: Option<PendingTx<'_>>,
) -> Vec<FilterPath>
where
    A: AccountSource + ?Sized,
{
    let mut search =
        Search { source, store: tx.map(|tx| tx.store), path: Vec::new(), paths: Vec::new() };
    let root_tx = tx.and_then(|tx| tx.store.get(tx.index));

    search.visit(account, FilterPathStep::Origin { address: account.address() }, root_tx, true);

    tracing::debug!(paths = search.paths.len(), "found filter paths");
    search.paths
}

struct Search<'s, A: ?Sized> {
    source: &'s A,
    store: Option<&'s TransactionStore>,
    path: Vec<FilterPathStep>,
    paths: Vec<FilterPath>,
}

impl<'s, A> Search<'s, A>
where
    A: AccountSource + ?Sized,
{
    fn visit(
        &mut self,
        account: &AccountData,
        step: FilterPathStep,
        tx: Option<&'s Transaction>,
        approval: bool,
    ) {
        if tx.is_some_and(|tx| tx.status() == TxStatus::Success) {
            return;
        }

        self.path.push(step);

        let approval = approval && tx.is_none_or(|tx| is_actionable(tx));
        if approval && self.source.source(account.address()).is_some() {
            self.paths.push(FilterPath::from(self.path.clone()));
        }

        for delegatee in account.delegatees() {
            let delegate = delegatee.account();
            let child_tx = match tx {
                None => None,
                Some(tx) if is_driven_by(tx, delegate.address()) => {
                    self.child(tx, delegate.address(), is_proxy_call)
                },
                Some(_) => continue,
            };

            let step = FilterPathStep::Proxy {
                address: delegate.address(),
                real: account.address(),
                proxy_type: delegatee.proxy_type().clone(),
                delay: delegatee.delay(),
            };
            self.visit(delegate, step, child_tx, approval);
        }

        match account.kind() {
            AccountKind::Multisig { threshold, members }
                if tx.is_none_or(|tx| tx.kind() == TransactionKind::Multisig) =>
            {
                for member in members {
                    let child_tx =
                        tx.and_then(|tx| self.child(tx, member.address(), is_multisig_call));

                    let step = FilterPathStep::Multisig {
                        address: member.address(),
                        multisig: account.address(),
                        threshold: *threshold,
                        other_signatures: members
                            .iter()
                            .map(AccountData::address)
                            .filter(|&other| other != member.address())
                            .collect(),
                    };
                    self.visit(member, step, child_tx, approval);
                }
            },
            _ => {},
        }

        self.path.pop();
    }

    fn child(
        &self,
        tx: &Transaction,
        sender: Address,
        wraps: fn(&Call) -> bool,
    ) -> Option<&'s Transaction> {
        let store = self.store?;

        tx.children()
            .iter()
            .filter_map(|&index| store.get(index))
            .find(|child| child.sender() == sender && child.call().is_some_and(wraps))
    }
}

fn is_actionable(tx: &Transaction) -> bool {
    if tx.kind().is_delegated() {
        tx.status() < TxStatus::Success
    } else {
        tx.status() == TxStatus::Pending
    }
}

fn is_driven_by(tx: &Transaction, delegate: Address) -> bool {
    tx.kind().is_delegated() && tx.delegate() == Some(delegate)
}

fn is_proxy_call(call: &Call) -> bool {
    TransactionKind::of_wrapper(call).is_some_and(TransactionKind::is_delegated)
}

fn is_multisig_call(call: &Call) -> bool {
    TransactionKind::of_wrapper(call) == Some(TransactionKind::Multisig)
}
