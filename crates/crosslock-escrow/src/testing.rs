//! In-memory settlement engine for tests and local simulation.
//!
//! [`LocalSettlement`] stands in for the external order-settlement engine:
//! it tracks how much of each order remains, moves the maker's asset to the
//! fill target and runs the post-fill hook. Signatures are not checked and
//! the taker asset is settled on the destination ledger, not here.

use std::collections::HashMap;

use crosslock_types::{CallContext, CrosslockError, Order, OrderHash, Result};

use crate::hook::{FillContext, FillRequest, PostFillHook, SettlementEngine};
use crate::ledger::{Ledger, Transfer};

/// Remaining making amount per order.
#[derive(Debug, Default)]
pub struct LocalSettlement {
    remaining: HashMap<OrderHash, u128>,
}

impl LocalSettlement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Making amount still open on `order`.
    #[must_use]
    pub fn remaining(&self, order: &Order) -> u128 {
        self.remaining
            .get(&order.hash())
            .copied()
            .unwrap_or(order.making_amount)
    }
}

fn invalid_fill(reason: impl Into<String>) -> CrosslockError {
    CrosslockError::InvalidFill {
        reason: reason.into(),
    }
}

impl SettlementEngine for LocalSettlement {
    fn fill_order(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        order: &Order,
        request: FillRequest,
        hook: &mut dyn PostFillHook,
    ) -> Result<OrderHash> {
        let order_hash = order.hash();
        let remaining = self.remaining(order);
        let traits = &order.maker_traits;

        if remaining == 0 {
            return Err(invalid_fill("order already filled"));
        }
        if request.amount == 0 || request.amount > remaining {
            return Err(invalid_fill(format!(
                "amount {} outside (0, {remaining}]",
                request.amount
            )));
        }
        if traits.is_expired(ctx.timestamp) {
            return Err(invalid_fill("order expired"));
        }
        if !traits.is_allowed_sender(&ctx.caller) {
            return Err(invalid_fill("sender not allowed"));
        }
        if !traits.allow_partial_fills() && request.amount != order.making_amount {
            return Err(invalid_fill("partial fills not allowed"));
        }
        if remaining != order.making_amount && !traits.allow_multiple_fills {
            return Err(invalid_fill("multiple fills not allowed"));
        }

        // Taking amount rounds up in the maker's favour.
        let taking_amount = request
            .amount
            .checked_mul(order.taking_amount)
            .and_then(|n| n.checked_add(order.making_amount - 1))
            .map(|n| n / order.making_amount)
            .ok_or(CrosslockError::AmountOverflow)?;

        let transfer = Transfer::new(order.maker, request.target, order.maker_asset, request.amount);
        ledger.transfer_all(&[transfer])?;

        let fill = FillContext {
            order,
            order_hash,
            taker: ctx.caller,
            making_amount: request.amount,
            taking_amount,
            remaining_making_amount: remaining,
            taker_proof: request.taker_proof.as_ref(),
        };
        if let Err(err) = hook.on_order_filled(ledger, ctx, &fill, &request.extension) {
            tracing::warn!(%order_hash, error = %err, "Post-fill hook failed, reverting fill");
            ledger.transfer_all(&[transfer.reversed()])?;
            return Err(err);
        }

        self.remaining.insert(order_hash, remaining - request.amount);
        tracing::info!(
            %order_hash,
            taker = %ctx.caller,
            making_amount = request.amount,
            taking_amount,
            remaining = remaining - request.amount,
            "Order filled"
        );
        Ok(order_hash)
    }
}
