//! Escrow factory.
//!
//! The factory derives escrow addresses, deploys source escrows from the
//! settlement engine's post-fill hook and destination escrows on a direct
//! call from the resolver. It owns every escrow it deployed, keyed by
//! address.
//!
//! ## Source escrow creation (post-fill hook)
//!
//! ```text
//!  payload ──▶ decode ──▶ resolve hashlock ──▶ immutables ──▶ address
//!                             │                                  │
//!               multi-fill:   │ proof + partial-fill check       │ not yet deployed
//!                             ▼                                  ▼
//!                        ValidationData                   funding check ──▶ commit
//! ```
//!
//! Nothing is written until every check has passed.

use std::collections::HashMap;

use crosslock_types::{
    AccountId, AssetId, CallContext, CrosslockError, DstImmutablesComplement, EscrowEvent,
    EscrowKind, FactoryConfig, Hashlock, HashlockInfo, Immutables, OrderHash, Result, Stage,
    constants::MIN_PARTS_AMOUNT,
};

use crate::address::escrow_address;
use crate::escrow::Escrow;
use crate::hook::{FillContext, PostFillHook};
use crate::ledger::{Ledger, Transfer};
use crate::merkle::{ValidationData, ValidationStore};
use crate::partial_fill::is_valid_partial_fill;
use crate::payload::SrcPayload;

/// Deploys and owns escrows on one ledger.
#[derive(Debug)]
pub struct EscrowFactory {
    config: FactoryConfig,
    escrows: HashMap<AccountId, Escrow>,
    validations: ValidationStore,
}

impl EscrowFactory {
    #[must_use]
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            config,
            escrows: HashMap::new(),
            validations: ValidationStore::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Deterministic address of the source escrow for `immutables`.
    #[must_use]
    pub fn address_of_src(&self, immutables: &Immutables) -> AccountId {
        escrow_address(&self.config.factory_id, EscrowKind::Src, immutables)
    }

    /// Deterministic address of the destination escrow for `immutables`.
    #[must_use]
    pub fn address_of_dst(&self, immutables: &Immutables) -> AccountId {
        escrow_address(&self.config.factory_id, EscrowKind::Dst, immutables)
    }

    #[must_use]
    pub fn escrow(&self, address: &AccountId) -> Option<&Escrow> {
        self.escrows.get(address)
    }

    /// Mutable access for withdraw / cancel / rescue calls.
    ///
    /// # Errors
    /// Returns `EscrowNotFound` if nothing is deployed at `address`.
    pub fn escrow_mut(&mut self, address: &AccountId) -> Result<&mut Escrow> {
        self.escrows
            .get_mut(address)
            .ok_or(CrosslockError::EscrowNotFound(*address))
    }

    #[must_use]
    pub fn escrow_count(&self) -> usize {
        self.escrows.len()
    }

    /// Last validated secret for a multi-fill order.
    #[must_use]
    pub fn validation(&self, order_hash: OrderHash, info: &HashlockInfo) -> Option<ValidationData> {
        self.validations.get(order_hash, info)
    }

    // -----------------------------------------------------------------
    // Destination escrows
    // -----------------------------------------------------------------

    /// Deploy a destination escrow funded by the caller.
    ///
    /// The attached value must equal the safety deposit, plus the amount
    /// when the locked asset is native. A token amount is pulled from the
    /// caller's balance.
    ///
    /// # Errors
    /// - `InvalidTimelocks` if the offsets are not monotonic
    /// - `InsufficientEscrowBalance` if the attached value is wrong
    /// - `InvalidCreationTime` if destination cancellation would start after
    ///   `src_cancellation_timestamp`
    /// - `EscrowAlreadyDeployed` if the address is taken
    /// - `NativeTransferFailed` / `InsufficientBalance` if the caller cannot pay
    pub fn create_dst_escrow(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        immutables: Immutables,
        src_cancellation_timestamp: u64,
    ) -> Result<AccountId> {
        immutables.timelocks.validate()?;

        let native_needed = if immutables.asset.is_native() {
            immutables
                .amount
                .checked_add(immutables.safety_deposit)
                .ok_or(CrosslockError::AmountOverflow)?
        } else {
            immutables.safety_deposit
        };
        if ctx.value != native_needed {
            return Err(CrosslockError::InsufficientEscrowBalance {
                needed: native_needed,
                available: ctx.value,
            });
        }

        let immutables = immutables.deployed_at(ctx.timestamp);
        let dst_cancellation = immutables.timelocks.get(Stage::DstCancellation);
        if dst_cancellation > src_cancellation_timestamp {
            tracing::warn!(
                dst_cancellation,
                src_cancellation = src_cancellation_timestamp,
                "Destination escrow would outlive source escrow"
            );
            return Err(CrosslockError::InvalidCreationTime {
                dst_cancellation,
                src_cancellation: src_cancellation_timestamp,
            });
        }

        let address = self.address_of_dst(&immutables);
        if self.escrows.contains_key(&address) {
            return Err(CrosslockError::EscrowAlreadyDeployed(address));
        }

        let mut transfers = vec![Transfer::new(
            ctx.caller,
            address,
            AssetId::NATIVE,
            ctx.value,
        )];
        if !immutables.asset.is_native() {
            transfers.push(Transfer::new(
                ctx.caller,
                address,
                immutables.asset,
                immutables.amount,
            ));
        }
        ledger.transfer_all(&transfers)?;

        self.escrows.insert(
            address,
            Escrow::new(
                address,
                EscrowKind::Dst,
                &immutables,
                self.config.rescue_delay_dst,
                self.config.access_token,
            ),
        );
        ledger.emit(
            ctx.timestamp,
            EscrowEvent::DstEscrowCreated {
                escrow: address,
                hashlock: immutables.hashlock,
                taker: immutables.taker,
            },
        );
        tracing::info!(
            escrow = %address,
            order_hash = %immutables.order_hash,
            taker = %immutables.taker,
            amount = immutables.amount,
            "Destination escrow created"
        );
        Ok(address)
    }

    // -----------------------------------------------------------------
    // Source escrow helpers
    // -----------------------------------------------------------------

    /// Resolve the hashlock for this fill. For multi-fill orders also
    /// returns the validation entry to store on success.
    fn resolve_hashlock(
        &self,
        fill: &FillContext<'_>,
        info: &HashlockInfo,
    ) -> Result<(Hashlock, Option<ValidationData>)> {
        if !fill.order.maker_traits.allow_multiple_fills {
            return Ok((info.as_hashlock(), None));
        }

        let parts_amount = info.parts_amount();
        if parts_amount < MIN_PARTS_AMOUNT {
            return Err(CrosslockError::InvalidSecretsAmount { parts_amount });
        }

        let candidate = fill
            .taker_proof
            .map(|proof| {
                self.validations
                    .validate_secret_proof(fill.order_hash, info, proof)
            })
            .transpose()?;
        let validated = candidate
            .or_else(|| self.validations.get(fill.order_hash, info))
            .ok_or(CrosslockError::InvalidPartialFill {
                order_hash: fill.order_hash,
            })?;

        if !is_valid_partial_fill(
            fill.making_amount,
            fill.remaining_making_amount,
            fill.order.making_amount,
            parts_amount,
            validated.index,
        ) {
            tracing::warn!(
                order_hash = %fill.order_hash,
                making_amount = fill.making_amount,
                remaining = fill.remaining_making_amount,
                validated_index = validated.index,
                "Partial fill not authorized by validated secret"
            );
            return Err(CrosslockError::InvalidPartialFill {
                order_hash: fill.order_hash,
            });
        }
        tracing::debug!(
            order_hash = %fill.order_hash,
            validated_index = validated.index,
            "Partial fill authorized"
        );
        Ok((validated.leaf, candidate))
    }
}

fn check_funding(ledger: &Ledger, address: AccountId, immutables: &Immutables) -> Result<()> {
    let native_needed = if immutables.asset.is_native() {
        immutables
            .safety_deposit
            .checked_add(immutables.amount)
            .ok_or(CrosslockError::AmountOverflow)?
    } else {
        immutables.safety_deposit
    };
    let native = ledger.balance_of(address, AssetId::NATIVE);
    if native < native_needed {
        return Err(CrosslockError::InsufficientEscrowBalance {
            needed: native_needed,
            available: native,
        });
    }
    if !immutables.asset.is_native() {
        let locked = ledger.balance_of(address, immutables.asset);
        if locked < immutables.amount {
            return Err(CrosslockError::InsufficientEscrowBalance {
                needed: immutables.amount,
                available: locked,
            });
        }
    }
    Ok(())
}

impl PostFillHook for EscrowFactory {
    fn on_order_filled(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        fill: &FillContext<'_>,
        extension: &[u8],
    ) -> Result<()> {
        let payload = SrcPayload::decode(extension)?;
        payload.timelocks.validate()?;

        let (hashlock, validation) = self.resolve_hashlock(fill, &payload.hashlock_info)?;

        let immutables = Immutables {
            order_hash: fill.order_hash,
            hashlock,
            maker: fill.order.maker,
            taker: fill.taker,
            asset: fill.order.maker_asset,
            amount: fill.making_amount,
            safety_deposit: payload.src_safety_deposit,
            timelocks: payload.timelocks.with_deployed_at(ctx.timestamp),
        };
        let complement = DstImmutablesComplement {
            maker: fill.order.effective_receiver(),
            amount: fill.taking_amount,
            asset: payload.dst_asset,
            safety_deposit: payload.dst_safety_deposit,
            chain_id: payload.dst_chain_id,
        };

        let address = self.address_of_src(&immutables);
        if self.escrows.contains_key(&address) {
            return Err(CrosslockError::EscrowAlreadyDeployed(address));
        }
        if let Err(err) = check_funding(ledger, address, &immutables) {
            tracing::warn!(escrow = %address, error = %err, "Source escrow not pre-funded");
            return Err(err);
        }

        if let Some(data) = validation {
            self.validations
                .record(fill.order_hash, &payload.hashlock_info, data);
        }
        self.escrows.insert(
            address,
            Escrow::new(
                address,
                EscrowKind::Src,
                &immutables,
                self.config.rescue_delay_src,
                self.config.access_token,
            ),
        );
        ledger.emit(
            ctx.timestamp,
            EscrowEvent::SrcEscrowCreated {
                escrow: address,
                immutables,
                complement,
            },
        );
        tracing::info!(
            escrow = %address,
            order_hash = %fill.order_hash,
            taker = %fill.taker,
            amount = fill.making_amount,
            dst_chain = %payload.dst_chain_id,
            "Source escrow created"
        );
        Ok(())
    }
}
