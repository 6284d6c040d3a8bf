//! Externally observable events.
//!
//! Events are the durable surface off-chain agents react to: creation
//! events let relays build the opposite leg, withdrawal events reveal the
//! secret to everyone watching.

use serde::{Deserialize, Serialize};

use crate::{
    AccountId, AssetId, ChainId, DstImmutablesComplement, EventId, Hashlock, Immutables,
    OrderHash, Secret, VmType,
};

/// An event emitted by the escrow core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    /// A source escrow was deployed by the post-fill hook.
    SrcEscrowCreated {
        escrow: AccountId,
        immutables: Immutables,
        complement: DstImmutablesComplement,
    },
    /// A destination escrow was deployed by a resolver.
    DstEscrowCreated {
        escrow: AccountId,
        hashlock: Hashlock,
        taker: AccountId,
    },
    /// A fill was routed to a non-source VM.
    CrossVmOrderCreated {
        order_hash: OrderHash,
        vm_type: VmType,
        dst_chain_id: ChainId,
        dst_address: String,
    },
    /// Funds were released; the secret is now public.
    EscrowWithdrawal { escrow: AccountId, secret: Secret },
    /// Funds were returned to the depositor.
    EscrowCancelled { escrow: AccountId },
    /// Stray funds were recovered after the rescue delay.
    FundsRescued {
        escrow: AccountId,
        asset: AssetId,
        amount: u128,
    },
    /// A resolver registered (or replaced) a destination address.
    ResolverRegistered {
        resolver: AccountId,
        vm_type: VmType,
        address: String,
    },
}

impl EscrowEvent {
    /// Short machine-readable name, used as the tracing message field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SrcEscrowCreated { .. } => "SrcEscrowCreated",
            Self::DstEscrowCreated { .. } => "DstEscrowCreated",
            Self::CrossVmOrderCreated { .. } => "CrossVmOrderCreated",
            Self::EscrowWithdrawal { .. } => "EscrowWithdrawal",
            Self::EscrowCancelled { .. } => "EscrowCancelled",
            Self::FundsRescued { .. } => "FundsRescued",
            Self::ResolverRegistered { .. } => "ResolverRegistered",
        }
    }
}

/// An event as stored in the append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    /// Position in the log, starting at zero.
    pub sequence: u64,
    /// Ledger timestamp of the emitting call.
    pub timestamp: u64,
    pub event: EscrowEvent,
}
