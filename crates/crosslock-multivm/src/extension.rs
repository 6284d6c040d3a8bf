//! Multi-VM resolver extension.
//!
//! Wraps any [`PostFillHook`] (normally the escrow factory) and lets a fill
//! name a destination on another VM family without changing the settlement
//! engine or the wrapped hook:
//!
//! ```text
//!   extension = routing prefix ‖ inner payload
//!
//!   vm_type == source VM  ──▶ inner hook (inner payload)
//!   vm_type != source VM  ──▶ resolver registered?  address valid?
//!                             same route as earlier fills?
//!                             ──▶ inner hook ──▶ record CrossVmOrder (Pending)
//! ```
//!
//! The cross-VM record is written only after the inner hook succeeds, so a
//! failed fill leaves no trace. Later status changes go through
//! [`MultiVmExtension::update_cross_vm_status`], which is the only writer of
//! a record's status.

use std::collections::HashMap;

use crosslock_escrow::{FillContext, Ledger, PostFillHook};
use crosslock_types::{
    CallContext, CrossVmOrder, CrossVmStatus, CrosslockError, EscrowEvent, OrderHash, Result,
    VmType,
};

use crate::address_validator::{AddressValidator, ValidatorSet};
use crate::registry::ResolverRegistry;
use crate::routing::RoutingPrefix;

/// A post-fill hook that routes fills to non-source VM families.
#[derive(Debug)]
pub struct MultiVmExtension<H: PostFillHook> {
    inner: H,
    source_vm: VmType,
    registry: ResolverRegistry,
    validators: ValidatorSet,
    orders: HashMap<OrderHash, CrossVmOrder>,
}

impl<H: PostFillHook> MultiVmExtension<H> {
    /// Wrap `inner` with the default EVM / Stellar / Solana validators.
    #[must_use]
    pub fn new(inner: H, source_vm: VmType) -> Self {
        Self::with_validators(inner, source_vm, ValidatorSet::with_defaults())
    }

    #[must_use]
    pub fn with_validators(inner: H, source_vm: VmType, validators: ValidatorSet) -> Self {
        Self {
            inner,
            source_vm,
            registry: ResolverRegistry::new(),
            validators,
            orders: HashMap::new(),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    #[must_use]
    pub fn source_vm(&self) -> VmType {
        self.source_vm
    }

    #[must_use]
    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    /// Add or replace the address validator for a VM family.
    pub fn add_validator(&mut self, validator: Box<dyn AddressValidator>) {
        self.validators.register(validator);
    }

    /// Register the caller's destination addresses.
    ///
    /// See [`ResolverRegistry::register_resolver`].
    pub fn register_resolver(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        vm_types: &[VmType],
        addresses: &[String],
    ) -> Result<()> {
        self.registry
            .register_resolver(ledger, ctx, &self.validators, vm_types, addresses)
    }

    /// The cross-VM record for `order_hash`, if the order was routed.
    #[must_use]
    pub fn cross_vm_order(&self, order_hash: &OrderHash) -> Option<&CrossVmOrder> {
        self.orders.get(order_hash)
    }

    /// Every cross-VM record, in no particular order.
    pub fn cross_vm_orders(&self) -> impl Iterator<Item = &CrossVmOrder> {
        self.orders.values()
    }

    /// Move the cross-VM record for `order_hash` to `status`.
    ///
    /// # Errors
    /// - `OrderNotFound` if the order was never routed cross-VM
    /// - `InvalidStatusTransition` if the move is not allowed
    pub fn update_cross_vm_status(
        &mut self,
        order_hash: &OrderHash,
        status: CrossVmStatus,
    ) -> Result<&CrossVmOrder> {
        let record = self
            .orders
            .get_mut(order_hash)
            .ok_or(CrosslockError::OrderNotFound(*order_hash))?;
        let from = record.status;
        if !from.can_transition_to(status) {
            return Err(CrosslockError::InvalidStatusTransition { from, to: status });
        }
        record.status = status;
        tracing::info!(%order_hash, %from, to = %status, "Cross-VM status updated");
        Ok(&*record)
    }
}

impl<H: PostFillHook> PostFillHook for MultiVmExtension<H> {
    fn on_order_filled(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        fill: &FillContext<'_>,
        extension: &[u8],
    ) -> Result<()> {
        let (route, inner_payload) = RoutingPrefix::decode(extension)?;

        if route.vm_type == self.source_vm {
            return self.inner.on_order_filled(ledger, ctx, fill, inner_payload);
        }

        if !self.registry.is_registered(fill.taker, route.vm_type) {
            tracing::warn!(
                resolver = %fill.taker,
                vm_type = %route.vm_type,
                "Fill routed to VM the resolver is not registered for"
            );
            return Err(CrosslockError::ResolverNotRegistered {
                resolver: fill.taker,
                vm_type: route.vm_type,
            });
        }
        self.validators.validate(route.vm_type, &route.dst_address)?;

        let existing = self.orders.get(&fill.order_hash);
        if existing.is_some_and(|o| {
            !o.same_route(route.vm_type, route.dst_chain_id, &route.dst_address)
        }) {
            tracing::warn!(order_hash = %fill.order_hash, "Repeat fill changed its route");
            return Err(CrosslockError::RouteMismatch(fill.order_hash));
        }
        let is_new = existing.is_none();

        self.inner.on_order_filled(ledger, ctx, fill, inner_payload)?;

        if is_new {
            ledger.emit(
                ctx.timestamp,
                EscrowEvent::CrossVmOrderCreated {
                    order_hash: fill.order_hash,
                    vm_type: route.vm_type,
                    dst_chain_id: route.dst_chain_id,
                    dst_address: route.dst_address.clone(),
                },
            );
            tracing::info!(
                order_hash = %fill.order_hash,
                vm_type = %route.vm_type,
                dst_chain = %route.dst_chain_id,
                dst_address = %route.dst_address,
                "Cross-VM order created"
            );
            self.orders.insert(
                fill.order_hash,
                CrossVmOrder {
                    order_hash: fill.order_hash,
                    vm_type: route.vm_type,
                    dst_chain_id: route.dst_chain_id,
                    dst_address: route.dst_address,
                    created_at: ctx.timestamp,
                    status: CrossVmStatus::Pending,
                },
            );
        }
        Ok(())
    }
}
