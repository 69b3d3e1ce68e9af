//! Decoded calls of the `multisig` and `proxy` pallets.

use core::{convert::Infallible, fmt, str::FromStr};

use alloc::{
    boxed::Box,
    string::{String, ToString},
    vec::Vec,
};

use bon::Builder;
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Address, CallHash};

/// A `(block height, extrinsic index)` pair identifying when a multisig operation was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Builder)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timepoint {
    /// Block height.
    height: u32,
    /// Index of the extrinsic within the block.
    index: u32,
}

impl Timepoint {
    /// Returns the block height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the extrinsic index within the block.
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Permission scope of a proxy relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub enum ProxyType {
    /// Unrestricted.
    #[default]
    Any,
    /// Anything but balance transfers.
    NonTransfer,
    /// Governance calls only.
    Governance,
    /// Staking calls only.
    Staking,
    /// Identity judgement calls only.
    IdentityJudgement,
    /// May only cancel other proxies' announcements.
    CancelProxy,
    /// Auction calls only.
    Auction,
    /// Nomination pool calls only.
    NominationPools,
    /// A runtime specific proxy type.
    Other(String),
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            ProxyType::Any => "Any",
            ProxyType::NonTransfer => "NonTransfer",
            ProxyType::Governance => "Governance",
            ProxyType::Staking => "Staking",
            ProxyType::IdentityJudgement => "IdentityJudgement",
            ProxyType::CancelProxy => "CancelProxy",
            ProxyType::Auction => "Auction",
            ProxyType::NominationPools => "NominationPools",
            ProxyType::Other(name) => name.as_str(),
        };

        f.write_str(name)
    }
}

impl FromStr for ProxyType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let proxy_type = match s {
            "Any" => ProxyType::Any,
            "NonTransfer" => ProxyType::NonTransfer,
            "Governance" => ProxyType::Governance,
            "Staking" => ProxyType::Staking,
            "IdentityJudgement" => ProxyType::IdentityJudgement,
            "CancelProxy" => ProxyType::CancelProxy,
            "Auction" => ProxyType::Auction,
            "NominationPools" => ProxyType::NominationPools,
            other => ProxyType::Other(other.to_string()),
        };

        Ok(proxy_type)
    }
}

/// A decoded call together with its hash.
///
/// The hash is the Blake2b-256 digest of the SCALE-encoded call as computed by the chain client
/// at decode time; it is what multisig storage and events are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Call {
    hash: CallHash,
    kind: CallKind,
}

/// The call variants the reduction engine understands.
///
/// Anything outside the `multisig` and `proxy` wrapper calls is an opaque business call kept as
/// [`CallKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub enum CallKind {
    /// `multisig.asMulti`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    AsMulti {
        /// Number of approvals required.
        threshold: u16,
        /// Signatories other than the sender.
        other_signatories: Vec<Address>,
        /// Timepoint of the first approval, if this is not the first one.
        maybe_timepoint: Option<Timepoint>,
        /// The call to dispatch once the threshold is met.
        call: Box<Call>,
    },
    /// `multisig.approveAsMulti`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    ApproveAsMulti {
        /// Number of approvals required.
        threshold: u16,
        /// Signatories other than the sender.
        other_signatories: Vec<Address>,
        /// Timepoint of the first approval, if this is not the first one.
        maybe_timepoint: Option<Timepoint>,
        /// Hash of the call being approved.
        call_hash: CallHash,
    },
    /// `multisig.asMultiThreshold1`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    AsMultiThreshold1 {
        /// Signatories other than the sender.
        other_signatories: Vec<Address>,
        /// The call to dispatch.
        call: Box<Call>,
    },
    /// `multisig.cancelAsMulti`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    CancelAsMulti {
        /// Number of approvals required.
        threshold: u16,
        /// Signatories other than the sender.
        other_signatories: Vec<Address>,
        /// Timepoint of the operation being cancelled.
        timepoint: Timepoint,
        /// Hash of the call being cancelled.
        call_hash: CallHash,
    },
    /// `proxy.proxy`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Proxy {
        /// The account the call is dispatched for.
        real: Address,
        /// Restrict the proxy relationship used to this type.
        force_proxy_type: Option<ProxyType>,
        /// The call to dispatch.
        call: Box<Call>,
    },
    /// `proxy.proxyAnnounced`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    ProxyAnnounced {
        /// The delegate that made the announcement.
        delegate: Address,
        /// The account the call is dispatched for.
        real: Address,
        /// Restrict the proxy relationship used to this type.
        force_proxy_type: Option<ProxyType>,
        /// The call to dispatch.
        call: Box<Call>,
    },
    /// `proxy.announce`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Announce {
        /// The account the announced call will be dispatched for.
        real: Address,
        /// Hash of the announced call.
        call_hash: CallHash,
    },
    /// Any other call.
    Other {
        /// Pallet name, camelCase.
        section: String,
        /// Call name, camelCase.
        method: String,
    },
}

impl Call {
    /// Creates a call from its hash and decoded variant.
    pub fn new(hash: CallHash, kind: CallKind) -> Self {
        Self { hash, kind }
    }

    /// Returns the call hash.
    pub fn hash(&self) -> CallHash {
        self.hash
    }

    /// Returns the decoded call variant.
    pub fn kind(&self) -> &CallKind {
        &self.kind
    }

    /// Returns the pallet name, e.g. `multisig`.
    pub fn section(&self) -> &str {
        match &self.kind {
            CallKind::AsMulti { .. }
            | CallKind::ApproveAsMulti { .. }
            | CallKind::AsMultiThreshold1 { .. }
            | CallKind::CancelAsMulti { .. } => "multisig",
            CallKind::Proxy { .. }
            | CallKind::ProxyAnnounced { .. }
            | CallKind::Announce { .. } => "proxy",
            CallKind::Other { section, .. } => section.as_str(),
        }
    }

    /// Returns the call name, e.g. `asMulti`.
    pub fn method(&self) -> &str {
        match &self.kind {
            CallKind::AsMulti { .. } => "asMulti",
            CallKind::ApproveAsMulti { .. } => "approveAsMulti",
            CallKind::AsMultiThreshold1 { .. } => "asMultiThreshold1",
            CallKind::CancelAsMulti { .. } => "cancelAsMulti",
            CallKind::Proxy { .. } => "proxy",
            CallKind::ProxyAnnounced { .. } => "proxyAnnounced",
            CallKind::Announce { .. } => "announce",
            CallKind::Other { method, .. } => method.as_str(),
        }
    }

    /// Returns `true` if this is `section.method`.
    pub fn is(&self, section: &str, method: &str) -> bool {
        self.section() == section && self.method() == method
    }

    /// Returns the directly wrapped call, when the variant carries one.
    pub fn inner_call(&self) -> Option<&Call> {
        match &self.kind {
            CallKind::AsMulti { call, .. }
            | CallKind::AsMultiThreshold1 { call, .. }
            | CallKind::Proxy { call, .. }
            | CallKind::ProxyAnnounced { call, .. } => Some(call),
            _ => None,
        }
    }
}
