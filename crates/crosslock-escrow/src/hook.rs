//! Seams between the order-settlement engine and the escrow core.
//!
//! The settlement engine verifies and fills orders; after moving the maker's
//! asset to the fill target it calls a [`PostFillHook`] with the fill's
//! details and the order's extension payload. If the hook fails, the engine
//! must undo the fill.

use crosslock_types::{AccountId, CallContext, Order, OrderHash, Result};

use crate::ledger::Ledger;
use crate::merkle::TakerProof;

/// What the engine tells the hook about one fill.
#[derive(Debug, Clone, Copy)]
pub struct FillContext<'a> {
    pub order: &'a Order,
    pub order_hash: OrderHash,
    /// The account that filled the order.
    pub taker: AccountId,
    pub making_amount: u128,
    pub taking_amount: u128,
    /// Amount left on the order before this fill.
    pub remaining_making_amount: u128,
    /// Secret proof supplied by the taker for multi-fill orders.
    pub taker_proof: Option<&'a TakerProof>,
}

/// Called by the engine after the maker's asset has moved.
pub trait PostFillHook {
    /// Handle a fill. Returning an error aborts the whole fill; the hook
    /// must not leave ledger changes behind when it fails.
    fn on_order_filled(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        fill: &FillContext<'_>,
        extension: &[u8],
    ) -> Result<()>;
}

/// A taker's request to fill an order.
#[derive(Debug, Clone)]
pub struct FillRequest {
    /// Making amount to fill.
    pub amount: u128,
    /// Receives the maker's asset (the escrow address for cross-chain fills).
    pub target: AccountId,
    pub taker_proof: Option<TakerProof>,
    /// Opaque payload handed to the hook.
    pub extension: Vec<u8>,
}

impl FillRequest {
    #[must_use]
    pub fn new(amount: u128, target: AccountId) -> Self {
        Self {
            amount,
            target,
            taker_proof: None,
            extension: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extension(mut self, extension: Vec<u8>) -> Self {
        self.extension = extension;
        self
    }

    #[must_use]
    pub fn with_taker_proof(mut self, proof: TakerProof) -> Self {
        self.taker_proof = Some(proof);
        self
    }
}

/// The order-settlement engine the escrow core plugs into.
pub trait SettlementEngine {
    /// Fill `order` for `ctx.caller` and run `hook`. Returns the order hash.
    fn fill_order(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        order: &Order,
        request: FillRequest,
        hook: &mut dyn PostFillHook,
    ) -> Result<OrderHash>;
}
