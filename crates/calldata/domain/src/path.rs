//! Signing paths from an account down to a locally controlled key.

use alloc::{format, string::String, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Address, call::ProxyType};

/// One hop of a [`FilterPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "camelCase")
)]
pub enum FilterPathStep {
    /// The account the path starts from.
    Origin {
        /// The account address.
        address: Address,
    },
    /// Acting for `real` as its proxy.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Proxy {
        /// The delegate address.
        address: Address,
        /// The account the delegate acts for.
        real: Address,
        /// Permission scope of the proxy.
        proxy_type: ProxyType,
        /// Announcement delay in blocks.
        delay: u32,
    },
    /// Approving for `multisig` as one of its members.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Multisig {
        /// The member address.
        address: Address,
        /// The multisig account.
        multisig: Address,
        /// Number of approvals required.
        threshold: u16,
        /// The other members, needed to build `asMulti`/`approveAsMulti`.
        other_signatures: Vec<Address>,
    },
}

/// A complete route from the root account to a locally controlled signer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct FilterPath(Vec<FilterPathStep>);

impl FilterPathStep {
    /// Returns the address acting at this hop.
    pub fn address(&self) -> Address {
        match self {
            FilterPathStep::Origin { address }
            | FilterPathStep::Proxy { address, .. }
            | FilterPathStep::Multisig { address, .. } => *address,
        }
    }

    /// Returns a deterministic key built from the step's fields, used for display.
    pub fn id(&self) -> String {
        match self {
            FilterPathStep::Origin { address } => format!("origin-{address}"),
            FilterPathStep::Proxy { address, real, proxy_type, delay } => {
                format!("proxy-{address}-{real}-{proxy_type}-{delay}")
            },
            FilterPathStep::Multisig { address, multisig, threshold, .. } => {
                format!("multisig-{address}-{multisig}-{threshold}")
            },
        }
    }
}

impl FilterPath {
    /// Returns the hops from the root account down to the signer.
    pub fn steps(&self) -> &[FilterPathStep] {
        &self.0
    }

    /// Returns the signer at the end of the path.
    pub fn signer(&self) -> Option<Address> {
        self.0.last().map(FilterPathStep::address)
    }

    /// Returns the number of hops.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the path has no hops.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a key joining the ids of every hop.
    pub fn id(&self) -> String {
        self.0.iter().map(FilterPathStep::id).collect::<Vec<_>>().join("/")
    }
}

impl From<Vec<FilterPathStep>> for FilterPath {
    fn from(steps: Vec<FilterPathStep>) -> Self {
        Self(steps)
    }
}

impl From<FilterPath> for Vec<FilterPathStep> {
    fn from(FilterPath(steps): FilterPath) -> Self {
        steps
    }
}
