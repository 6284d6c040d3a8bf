//! Virtual-machine families and cross-VM order records.
//!
//! ## CrossVmOrder lifecycle
//!
//! ```text
//!   ┌─────────┐  relay picks up  ┌────────────┐  destination done  ┌───────────┐
//!   │ PENDING ├─────────────────▶│ PROCESSING ├───────────────────▶│ COMPLETED │
//!   └────┬────┘                  └─────┬──────┘                    └───────────┘
//!        │                             │ failure
//!        │        ┌────────┐           │
//!        └───────▶│ FAILED │◀──────────┘
//!                 └────────┘
//! ```
//!
//! The on-chain extension only ever creates records in `PENDING`; every
//! later transition belongs to the off-chain relay.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ChainId, OrderHash};

/// Tag identifying a virtual-machine family. Open-ended: new families are
/// new values, not new variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct VmType(pub u8);

impl VmType {
    /// EVM family (the source VM by default).
    pub const EVM: Self = Self(0);
    /// Stellar / Soroban.
    pub const STELLAR: Self = Self(1);
    /// Solana SVM.
    pub const SOLANA: Self = Self(2);

    #[must_use]
    pub fn name(&self) -> &'static str {
        match *self {
            Self::EVM => "EVM",
            Self::STELLAR => "STELLAR",
            Self::SOLANA => "SOLANA",
            _ => "UNKNOWN",
        }
    }
}

impl fmt::Display for VmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

/// Status of a cross-VM order. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossVmStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl CrossVmStatus {
    /// Can a record in this status move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Processing | Self::Failed)
                | (Self::Processing, Self::Completed | Self::Failed)
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for CrossVmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// An order whose destination leg lives on a non-source VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossVmOrder {
    pub order_hash: OrderHash,
    pub vm_type: VmType,
    pub dst_chain_id: ChainId,
    /// Destination address in the VM family's own string format.
    pub dst_address: String,
    /// Source-ledger timestamp of creation.
    pub created_at: u64,
    pub status: CrossVmStatus,
}

impl CrossVmOrder {
    /// Whether this record carries the given destination route.
    #[must_use]
    pub fn same_route(&self, vm_type: VmType, dst_chain_id: ChainId, dst_address: &str) -> bool {
        self.vm_type == vm_type && self.dst_chain_id == dst_chain_id && self.dst_address == dst_address
    }
}
