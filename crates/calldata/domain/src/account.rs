//! Account ownership and delegation tree.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Address, call::ProxyType};

/// An account together with everything that can act on its behalf.
///
/// `delegatees` are the accounts registered as its proxies; a multisig additionally lists its
/// `members`. Both nest arbitrarily deep.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccountData {
    address: Address,
    kind: AccountKind,
    #[cfg_attr(feature = "serde", serde(default))]
    delegatees: Vec<Delegatee>,
}

/// What kind of account an [`AccountData`] node is.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub enum AccountKind {
    /// A regular keyed account.
    Account,
    /// A keyless pure proxy, controllable only through its delegatees.
    Pure,
    /// A multisig account.
    Multisig {
        /// Number of approvals required.
        threshold: u16,
        /// The signatories.
        members: Vec<AccountData>,
    },
}

/// A proxy registered on an account.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct Delegatee {
    account: AccountData,
    proxy_type: ProxyType,
    delay: u32,
}

impl AccountData {
    /// Creates a regular keyed account with no delegatees.
    pub fn account(address: Address) -> Self {
        Self { address, kind: AccountKind::Account, delegatees: Vec::new() }
    }

    /// Creates a pure proxy with no delegatees.
    pub fn pure(address: Address) -> Self {
        Self { address, kind: AccountKind::Pure, delegatees: Vec::new() }
    }

    /// Creates a multisig account.
    pub fn multisig(address: Address, threshold: u16, members: Vec<AccountData>) -> Self {
        Self {
            address,
            kind: AccountKind::Multisig { threshold, members },
            delegatees: Vec::new(),
        }
    }

    /// Adds a delegatee able to act for this account.
    pub fn with_delegatee(
        mut self,
        account: AccountData,
        proxy_type: ProxyType,
        delay: u32,
    ) -> Self {
        self.delegatees.push(Delegatee { account, proxy_type, delay });
        self
    }

    /// Returns the account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the account kind.
    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    /// Returns the registered delegatees.
    pub fn delegatees(&self) -> &[Delegatee] {
        &self.delegatees
    }

    /// Returns the multisig members, empty for other kinds.
    pub fn members(&self) -> &[AccountData] {
        match &self.kind {
            AccountKind::Multisig { members, .. } => members,
            AccountKind::Account | AccountKind::Pure => &[],
        }
    }

    /// Returns the multisig threshold, if this is a multisig.
    pub fn threshold(&self) -> Option<u16> {
        match &self.kind {
            AccountKind::Multisig { threshold, .. } => Some(*threshold),
            AccountKind::Account | AccountKind::Pure => None,
        }
    }

    /// Returns `true` for multisig accounts.
    pub fn is_multisig(&self) -> bool {
        matches!(self.kind, AccountKind::Multisig { .. })
    }
}

impl Delegatee {
    /// Returns the delegate account.
    pub fn account(&self) -> &AccountData {
        &self.account
    }

    /// Returns the permission scope of the proxy.
    pub fn proxy_type(&self) -> &ProxyType {
        &self.proxy_type
    }

    /// Returns the announcement delay in blocks; zero for an immediate proxy.
    pub fn delay(&self) -> u32 {
        self.delay
    }
}
