//! Escrow state machine.
//!
//! One escrow holds one leg of a swap: the maker's asset on the source
//! ledger, or the taker's asset on the destination ledger, plus a native
//! safety deposit paid to whoever completes it.
//!
//! ```text
//!            withdraw / public_withdraw
//!   FUNDED ──────────────────────────────▶ WITHDRAWN
//!      │
//!      │     cancel / public_cancel
//!      └─────────────────────────────────▶ CANCELLED
//! ```
//!
//! Source leg timeline (offsets from `deployed_at`):
//! ```text
//!   SrcWithdrawal ........ taker may withdraw
//!   SrcPublicWithdrawal .. access-token holders may withdraw too
//!   SrcCancellation ...... withdrawal closes, taker may cancel
//!   SrcPublicCancellation  access-token holders may cancel too
//! ```
//! The destination leg has no public cancellation.
//!
//! Every guard runs before any value moves; a terminal call then moves the
//! locked amount and the safety deposit in one atomic batch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crosslock_types::{
    AccountId, AssetId, CallContext, CrosslockError, EscrowEvent, EscrowKind, Immutables, Result,
    Secret, Stage,
};

use crate::ledger::{Ledger, Transfer};

/// Lifecycle state of an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowState {
    Funded,
    Withdrawn,
    Cancelled,
}

impl EscrowState {
    /// Whether the transition `self → target` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Funded, Self::Withdrawn | Self::Cancelled)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Funded)
    }
}

impl fmt::Display for EscrowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Funded => write!(f, "FUNDED"),
            Self::Withdrawn => write!(f, "WITHDRAWN"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A deployed escrow.
///
/// Only the immutables hash is stored; callers present the full
/// [`Immutables`] on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    address: AccountId,
    kind: EscrowKind,
    immutables_hash: [u8; 32],
    state: EscrowState,
    rescue_delay: u32,
    access_token: AssetId,
}

impl Escrow {
    /// Record for a freshly deployed escrow.
    #[must_use]
    pub fn new(
        address: AccountId,
        kind: EscrowKind,
        immutables: &Immutables,
        rescue_delay: u32,
        access_token: AssetId,
    ) -> Self {
        Self {
            address,
            kind,
            immutables_hash: immutables.hash(),
            state: EscrowState::Funded,
            rescue_delay,
            access_token,
        }
    }

    #[must_use]
    pub fn address(&self) -> AccountId {
        self.address
    }

    #[must_use]
    pub fn kind(&self) -> EscrowKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> EscrowState {
        self.state
    }

    #[must_use]
    pub fn immutables_hash(&self) -> [u8; 32] {
        self.immutables_hash
    }

    #[must_use]
    pub fn rescue_delay(&self) -> u32 {
        self.rescue_delay
    }

    // -----------------------------------------------------------------
    // Withdraw
    // -----------------------------------------------------------------

    /// Taker reveals the secret and releases the funds.
    ///
    /// Source leg pays the taker; destination leg pays the maker.
    pub fn withdraw(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        secret: &Secret,
        immutables: &Immutables,
    ) -> Result<()> {
        self.only_active()?;
        self.only_valid_immutables(immutables)?;
        only_taker(ctx, immutables)?;
        let (start, end) = self.withdrawal_window(immutables, false);
        only_within(ctx.timestamp, start, end)?;
        only_valid_secret(secret, immutables)?;

        let recipient = match self.kind {
            EscrowKind::Src => immutables.taker,
            EscrowKind::Dst => immutables.maker,
        };
        self.release(ledger, ctx, immutables, recipient, *secret)
    }

    /// Source-leg withdraw paying `target` instead of the taker.
    pub fn withdraw_to(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        secret: &Secret,
        target: AccountId,
        immutables: &Immutables,
    ) -> Result<()> {
        self.only_leg("withdraw_to", EscrowKind::Src)?;
        self.only_active()?;
        self.only_valid_immutables(immutables)?;
        only_taker(ctx, immutables)?;
        let (start, end) = self.withdrawal_window(immutables, false);
        only_within(ctx.timestamp, start, end)?;
        only_valid_secret(secret, immutables)?;

        self.release(ledger, ctx, immutables, target, *secret)
    }

    /// Any access-token holder completes the withdrawal for the taker
    /// (source) or maker (destination) and collects the safety deposit.
    pub fn public_withdraw(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        secret: &Secret,
        immutables: &Immutables,
    ) -> Result<()> {
        self.only_active()?;
        self.only_valid_immutables(immutables)?;
        self.only_access_token_holder(ledger, ctx)?;
        let (start, end) = self.withdrawal_window(immutables, true);
        only_within(ctx.timestamp, start, end)?;
        only_valid_secret(secret, immutables)?;

        let recipient = match self.kind {
            EscrowKind::Src => immutables.taker,
            EscrowKind::Dst => immutables.maker,
        };
        self.release(ledger, ctx, immutables, recipient, *secret)
    }

    // -----------------------------------------------------------------
    // Cancel
    // -----------------------------------------------------------------

    /// Taker returns the funds to their depositor after cancellation opens.
    ///
    /// Source leg refunds the maker; destination leg refunds the taker.
    pub fn cancel(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        immutables: &Immutables,
    ) -> Result<()> {
        self.only_active()?;
        self.only_valid_immutables(immutables)?;
        only_taker(ctx, immutables)?;
        let start = match self.kind {
            EscrowKind::Src => immutables.timelocks.get(Stage::SrcCancellation),
            EscrowKind::Dst => immutables.timelocks.get(Stage::DstCancellation),
        };
        only_after(ctx.timestamp, start)?;

        let recipient = match self.kind {
            EscrowKind::Src => immutables.maker,
            EscrowKind::Dst => immutables.taker,
        };
        self.refund(ledger, ctx, immutables, recipient)
    }

    /// Source-leg cancel by any access-token holder once public
    /// cancellation opens.
    pub fn public_cancel(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        immutables: &Immutables,
    ) -> Result<()> {
        self.only_leg("public_cancel", EscrowKind::Src)?;
        self.only_active()?;
        self.only_valid_immutables(immutables)?;
        self.only_access_token_holder(ledger, ctx)?;
        only_after(
            ctx.timestamp,
            immutables.timelocks.get(Stage::SrcPublicCancellation),
        )?;

        self.refund(ledger, ctx, immutables, immutables.maker)
    }

    // -----------------------------------------------------------------
    // Rescue
    // -----------------------------------------------------------------

    /// Taker recovers `amount` of `asset` from the escrow address once the
    /// rescue delay has passed. State is left unchanged.
    pub fn rescue(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        asset: AssetId,
        amount: u128,
        immutables: &Immutables,
    ) -> Result<()> {
        self.only_valid_immutables(immutables)?;
        only_taker(ctx, immutables)?;
        only_after(
            ctx.timestamp,
            immutables.timelocks.rescue_start(self.rescue_delay),
        )?;

        ledger.transfer_all(&[Transfer::new(self.address, ctx.caller, asset, amount)])?;
        ledger.emit(
            ctx.timestamp,
            EscrowEvent::FundsRescued {
                escrow: self.address,
                asset,
                amount,
            },
        );
        tracing::info!(escrow = %self.address, %asset, amount, "Funds rescued");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------

    fn only_active(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(CrosslockError::EscrowNotActive(self.address));
        }
        Ok(())
    }

    fn only_leg(&self, operation: &'static str, kind: EscrowKind) -> Result<()> {
        if self.kind != kind {
            return Err(CrosslockError::NotSupportedOnLeg {
                operation,
                kind: self.kind,
            });
        }
        Ok(())
    }

    fn only_valid_immutables(&self, immutables: &Immutables) -> Result<()> {
        if immutables.hash() != self.immutables_hash {
            return Err(CrosslockError::InvalidImmutables {
                escrow: self.address,
            });
        }
        Ok(())
    }

    fn only_access_token_holder(&self, ledger: &Ledger, ctx: &CallContext) -> Result<()> {
        if ledger.balance_of(ctx.caller, self.access_token) == 0 {
            return Err(CrosslockError::InvalidCaller { caller: ctx.caller });
        }
        Ok(())
    }

    /// `[start, end)` of the (public) withdrawal window of this leg.
    fn withdrawal_window(&self, immutables: &Immutables, public: bool) -> (u64, u64) {
        let t = &immutables.timelocks;
        match (self.kind, public) {
            (EscrowKind::Src, false) => (t.get(Stage::SrcWithdrawal), t.get(Stage::SrcCancellation)),
            (EscrowKind::Src, true) => (
                t.get(Stage::SrcPublicWithdrawal),
                t.get(Stage::SrcCancellation),
            ),
            (EscrowKind::Dst, false) => (t.get(Stage::DstWithdrawal), t.get(Stage::DstCancellation)),
            (EscrowKind::Dst, true) => (
                t.get(Stage::DstPublicWithdrawal),
                t.get(Stage::DstCancellation),
            ),
        }
    }

    // -----------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------

    fn release(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        immutables: &Immutables,
        recipient: AccountId,
        secret: Secret,
    ) -> Result<()> {
        self.pay_out(ledger, ctx, immutables, recipient, EscrowState::Withdrawn)?;
        ledger.emit(
            ctx.timestamp,
            EscrowEvent::EscrowWithdrawal {
                escrow: self.address,
                secret,
            },
        );
        tracing::info!(
            escrow = %self.address,
            kind = %self.kind,
            %recipient,
            amount = immutables.amount,
            "Escrow withdrawn"
        );
        Ok(())
    }

    fn refund(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        immutables: &Immutables,
        recipient: AccountId,
    ) -> Result<()> {
        self.pay_out(ledger, ctx, immutables, recipient, EscrowState::Cancelled)?;
        ledger.emit(
            ctx.timestamp,
            EscrowEvent::EscrowCancelled {
                escrow: self.address,
            },
        );
        tracing::info!(
            escrow = %self.address,
            kind = %self.kind,
            %recipient,
            amount = immutables.amount,
            "Escrow cancelled"
        );
        Ok(())
    }

    /// Locked amount to `recipient`, safety deposit to the caller.
    fn pay_out(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        immutables: &Immutables,
        recipient: AccountId,
        next: EscrowState,
    ) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CrosslockError::EscrowNotActive(self.address));
        }
        ledger.transfer_all(&[
            Transfer::new(self.address, recipient, immutables.asset, immutables.amount),
            Transfer::new(
                self.address,
                ctx.caller,
                AssetId::NATIVE,
                immutables.safety_deposit,
            ),
        ])?;
        self.state = next;
        Ok(())
    }
}

fn only_taker(ctx: &CallContext, immutables: &Immutables) -> Result<()> {
    if ctx.caller != immutables.taker {
        return Err(CrosslockError::InvalidCaller { caller: ctx.caller });
    }
    Ok(())
}

fn only_within(now: u64, start: u64, end: u64) -> Result<()> {
    if now < start || now >= end {
        return Err(CrosslockError::InvalidTime {
            now,
            lower: start,
            upper: end,
        });
    }
    Ok(())
}

fn only_after(now: u64, start: u64) -> Result<()> {
    only_within(now, start, u64::MAX)
}

fn only_valid_secret(secret: &Secret, immutables: &Immutables) -> Result<()> {
    if !immutables.hashlock.matches(secret) {
        return Err(CrosslockError::InvalidSecret);
    }
    Ok(())
}
