//! Decoded block events relevant to multisig and proxy status tracking.

use core::fmt;

use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Address, CallHash, call::Timepoint};

/// A dispatch error as reported by the runtime, kept in its rendered form.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct DispatchError(String);

/// Outcome of a dispatched inner call.
pub type DispatchResult = Result<(), DispatchError>;

/// The phase of block execution an event was emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub enum Phase {
    /// Emitted while applying the extrinsic at this index.
    ApplyExtrinsic(u32),
    /// Emitted during block finalization.
    Finalization,
    /// Emitted during block initialization.
    Initialization,
}

/// The events the status classifier reads, resolved from `(section, method)` at decode time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub enum ChainEvent {
    /// `system.ExtrinsicSuccess`
    ExtrinsicSuccess,
    /// `system.ExtrinsicFailed`
    ExtrinsicFailed {
        /// The dispatch error of the extrinsic.
        error: DispatchError,
    },
    /// `multisig.NewMultisig`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    NewMultisig {
        /// The signatory opening the operation.
        approving: Address,
        /// The multisig account.
        multisig: Address,
        /// Hash of the call under approval.
        call_hash: CallHash,
    },
    /// `multisig.MultisigApproval`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    MultisigApproval {
        /// The approving signatory.
        approving: Address,
        /// Timepoint of the operation.
        timepoint: Timepoint,
        /// The multisig account.
        multisig: Address,
        /// Hash of the call under approval.
        call_hash: CallHash,
    },
    /// `multisig.MultisigExecuted`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    MultisigExecuted {
        /// The final approving signatory.
        approving: Address,
        /// Timepoint of the operation, i.e. where it was opened.
        timepoint: Timepoint,
        /// The multisig account.
        multisig: Address,
        /// Hash of the executed call.
        call_hash: CallHash,
        /// Outcome of the inner call.
        result: DispatchResult,
    },
    /// `multisig.MultisigCancelled`
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    MultisigCancelled {
        /// The signatory that cancelled, always the depositor.
        cancelling: Address,
        /// Timepoint of the cancelled operation.
        timepoint: Timepoint,
        /// The multisig account.
        multisig: Address,
        /// Hash of the cancelled call.
        call_hash: CallHash,
    },
    /// `proxy.ProxyExecuted`
    ProxyExecuted {
        /// Outcome of the inner call.
        result: DispatchResult,
    },
    /// Any other event.
    Other {
        /// Pallet name, camelCase.
        section: String,
        /// Event name, PascalCase.
        method: String,
    },
}

/// An event with the phase it was emitted in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventRecord {
    phase: Phase,
    event: ChainEvent,
}

impl DispatchError {
    /// Creates a dispatch error from its rendered description.
    pub fn new<S>(description: S) -> Self
    where
        String: From<S>,
    {
        Self(description.into())
    }

    /// Returns the rendered description.
    pub fn description(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ChainEvent {
    /// Returns the pallet name, e.g. `multisig`.
    pub fn section(&self) -> &str {
        match self {
            ChainEvent::ExtrinsicSuccess | ChainEvent::ExtrinsicFailed { .. } => "system",
            ChainEvent::NewMultisig { .. }
            | ChainEvent::MultisigApproval { .. }
            | ChainEvent::MultisigExecuted { .. }
            | ChainEvent::MultisigCancelled { .. } => "multisig",
            ChainEvent::ProxyExecuted { .. } => "proxy",
            ChainEvent::Other { section, .. } => section.as_str(),
        }
    }

    /// Returns the event name, e.g. `MultisigExecuted`.
    pub fn method(&self) -> &str {
        match self {
            ChainEvent::ExtrinsicSuccess => "ExtrinsicSuccess",
            ChainEvent::ExtrinsicFailed { .. } => "ExtrinsicFailed",
            ChainEvent::NewMultisig { .. } => "NewMultisig",
            ChainEvent::MultisigApproval { .. } => "MultisigApproval",
            ChainEvent::MultisigExecuted { .. } => "MultisigExecuted",
            ChainEvent::MultisigCancelled { .. } => "MultisigCancelled",
            ChainEvent::ProxyExecuted { .. } => "ProxyExecuted",
            ChainEvent::Other { method, .. } => method.as_str(),
        }
    }
}

impl EventRecord {
    /// Creates an event record.
    pub fn new(phase: Phase, event: ChainEvent) -> Self {
        Self { phase, event }
    }

    /// Returns the phase the event was emitted in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the event.
    pub fn event(&self) -> &ChainEvent {
        &self.event
    }

    /// Consumes the record, returning the event.
    pub fn into_event(self) -> ChainEvent {
        self.event
    }

    /// Returns `true` if the event was emitted while applying the extrinsic at `index`.
    pub fn applies_to(&self, index: u32) -> bool {
        self.phase == Phase::ApplyExtrinsic(index)
    }
}
