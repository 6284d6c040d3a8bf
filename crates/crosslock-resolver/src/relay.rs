//! Cross-VM relay.
//!
//! Tails the source ledger's event log for `CrossVmOrderCreated` and drives
//! every later status change of the orders it picks up:
//!
//! ```text
//!   poll(ledger) ──▶ new PENDING records
//!   advance(extension, order, PROCESSING | COMPLETED | FAILED)
//!            └──▶ MultiVmExtension::update_cross_vm_status
//! ```
//!
//! The extension holds the authoritative record; the relay's copy is
//! refreshed from it after every transition. A relay restricted to one VM
//! family ignores orders routed elsewhere.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crosslock_escrow::{Ledger, PostFillHook};
use crosslock_multivm::MultiVmExtension;
use crosslock_types::{
    CrossVmOrder, CrossVmStatus, CrosslockError, EscrowEvent, OrderHash, Result, VmType,
};

/// A cross-VM order as seen by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedOrder {
    pub order: CrossVmOrder,
    /// Sequence of the event that announced the order.
    pub source_sequence: u64,
    pub observed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Off-chain observer driving cross-VM orders to completion.
#[derive(Debug, Default)]
pub struct CrossVmRelay {
    vm_filter: Option<VmType>,
    /// Next event sequence to read.
    cursor: u64,
    orders: HashMap<OrderHash, TrackedOrder>,
}

impl CrossVmRelay {
    /// A relay for every VM family.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A relay that only tracks orders routed to `vm_type`.
    #[must_use]
    pub fn for_vm(vm_type: VmType) -> Self {
        Self {
            vm_filter: Some(vm_type),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Read events since the last poll. Returns how many new orders were
    /// picked up.
    pub fn poll(&mut self, ledger: &Ledger) -> usize {
        let mut picked_up = 0;
        for record in ledger.events_since(self.cursor) {
            self.cursor = record.sequence + 1;
            let EscrowEvent::CrossVmOrderCreated {
                order_hash,
                vm_type,
                dst_chain_id,
                dst_address,
            } = &record.event
            else {
                continue;
            };
            if self.vm_filter.is_some_and(|vm| vm != *vm_type) {
                continue;
            }
            if self.orders.contains_key(order_hash) {
                continue;
            }

            let now = Utc::now();
            self.orders.insert(
                *order_hash,
                TrackedOrder {
                    order: CrossVmOrder {
                        order_hash: *order_hash,
                        vm_type: *vm_type,
                        dst_chain_id: *dst_chain_id,
                        dst_address: dst_address.clone(),
                        created_at: record.timestamp,
                        status: CrossVmStatus::Pending,
                    },
                    source_sequence: record.sequence,
                    observed_at: now,
                    updated_at: now,
                },
            );
            tracing::info!(
                %order_hash,
                %vm_type,
                dst_chain = %dst_chain_id,
                sequence = record.sequence,
                "Relay picked up cross-VM order"
            );
            picked_up += 1;
        }
        picked_up
    }

    /// Move `order_hash` to `status` on the extension that recorded it.
    ///
    /// # Errors
    /// - `OrderNotFound` if the relay or the extension does not know the order
    /// - `InvalidStatusTransition` if the move is not allowed
    pub fn advance<H: PostFillHook>(
        &mut self,
        extension: &mut MultiVmExtension<H>,
        order_hash: &OrderHash,
        status: CrossVmStatus,
    ) -> Result<()> {
        let tracked = self
            .orders
            .get_mut(order_hash)
            .ok_or(CrosslockError::OrderNotFound(*order_hash))?;
        let from = tracked.order.status;
        tracked.order = extension.update_cross_vm_status(order_hash, status)?.clone();
        tracked.updated_at = Utc::now();
        tracing::info!(%order_hash, %from, to = %status, "Cross-VM order advanced");
        Ok(())
    }

    #[must_use]
    pub fn order(&self, order_hash: &OrderHash) -> Option<&TrackedOrder> {
        self.orders.get(order_hash)
    }

    /// Orders in `status`, oldest announcement first.
    #[must_use]
    pub fn orders_with_status(&self, status: CrossVmStatus) -> Vec<&TrackedOrder> {
        let mut found: Vec<_> = self
            .orders
            .values()
            .filter(|t| t.order.status == status)
            .collect();
        found.sort_by_key(|t| t.source_sequence);
        found
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslock_escrow::FillContext;
    use crosslock_multivm::RoutingPrefix;
    use crosslock_types::{AccountId, CallContext, ChainId, Order};

    const STELLAR_ADDR: &str = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
    const SOLANA_ADDR: &str = "7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV";

    struct Accept;

    impl PostFillHook for Accept {
        fn on_order_filled(
            &mut self,
            _ledger: &mut Ledger,
            _ctx: &CallContext,
            _fill: &FillContext<'_>,
            _extension: &[u8],
        ) -> Result<()> {
            Ok(())
        }
    }

    fn resolver() -> AccountId {
        AccountId::from_label("resolver")
    }

    /// Extension on an EVM source with the resolver registered for Stellar
    /// and Solana. Registration emits events 0 and 1.
    fn setup() -> (MultiVmExtension<Accept>, Ledger) {
        let mut ext = MultiVmExtension::new(Accept, VmType::EVM);
        let mut ledger = Ledger::new();
        ext.register_resolver(
            &mut ledger,
            &CallContext::new(resolver(), 1),
            &[VmType::STELLAR, VmType::SOLANA],
            &[STELLAR_ADDR.into(), SOLANA_ADDR.into()],
        )
        .unwrap();
        (ext, ledger)
    }

    fn announce(
        ext: &mut MultiVmExtension<Accept>,
        ledger: &mut Ledger,
        n: u8,
        vm_type: VmType,
    ) -> OrderHash {
        let order = Order::dummy(AccountId::from_label("maker"));
        let order_hash = OrderHash([n; 32]);
        let address = if vm_type == VmType::SOLANA {
            SOLANA_ADDR
        } else {
            STELLAR_ADDR
        };
        let extension = RoutingPrefix::new(vm_type, ChainId(148), address)
            .encode_with(&[])
            .unwrap();
        let fill = FillContext {
            order: &order,
            order_hash,
            taker: resolver(),
            making_amount: 100,
            taking_amount: 99,
            remaining_making_amount: 100,
            taker_proof: None,
        };
        ext.on_order_filled(
            ledger,
            &CallContext::new(resolver(), u64::from(n) * 10),
            &fill,
            &extension,
        )
        .unwrap();
        order_hash
    }

    #[test]
    fn poll_picks_up_new_orders_once() {
        let (mut ext, mut ledger) = setup();
        ledger.emit(
            1,
            EscrowEvent::EscrowCancelled {
                escrow: AccountId::from_label("escrow"),
            },
        );
        let first = announce(&mut ext, &mut ledger, 1, VmType::STELLAR);

        let mut relay = CrossVmRelay::new();
        assert_eq!(relay.poll(&ledger), 1);
        assert_eq!(relay.cursor(), 4);
        assert_eq!(relay.poll(&ledger), 0);

        let tracked = relay.order(&first).unwrap();
        assert_eq!(tracked.order.status, CrossVmStatus::Pending);
        assert_eq!(tracked.order.created_at, 10);
        assert_eq!(tracked.source_sequence, 3);

        announce(&mut ext, &mut ledger, 2, VmType::SOLANA);
        assert_eq!(relay.poll(&ledger), 1);
        assert_eq!(relay.len(), 2);
    }

    #[test]
    fn vm_filter_skips_other_families() {
        let (mut ext, mut ledger) = setup();
        announce(&mut ext, &mut ledger, 1, VmType::STELLAR);
        let solana = announce(&mut ext, &mut ledger, 2, VmType::SOLANA);

        let mut relay = CrossVmRelay::for_vm(VmType::SOLANA);
        assert_eq!(relay.poll(&ledger), 1);
        assert!(relay.order(&solana).is_some());
        assert_eq!(relay.cursor(), 4);
    }

    #[test]
    fn advance_writes_through_to_extension() {
        let (mut ext, mut ledger) = setup();
        let order_hash = announce(&mut ext, &mut ledger, 1, VmType::STELLAR);
        let mut relay = CrossVmRelay::new();
        relay.poll(&ledger);

        relay
            .advance(&mut ext, &order_hash, CrossVmStatus::Processing)
            .unwrap();
        assert_eq!(
            ext.cross_vm_order(&order_hash).unwrap().status,
            CrossVmStatus::Processing
        );
        relay
            .advance(&mut ext, &order_hash, CrossVmStatus::Completed)
            .unwrap();
        assert_eq!(
            ext.cross_vm_order(&order_hash).unwrap(),
            &relay.order(&order_hash).unwrap().order
        );

        let err = relay
            .advance(&mut ext, &order_hash, CrossVmStatus::Pending)
            .unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::InvalidStatusTransition {
                from: CrossVmStatus::Completed,
                to: CrossVmStatus::Pending
            }
        ));
        assert_eq!(
            ext.cross_vm_order(&order_hash).unwrap().status,
            CrossVmStatus::Completed
        );
        assert_eq!(
            relay.order(&order_hash).unwrap().order.status,
            CrossVmStatus::Completed
        );
    }

    #[test]
    fn pending_can_fail_directly() {
        let (mut ext, mut ledger) = setup();
        let order_hash = announce(&mut ext, &mut ledger, 1, VmType::STELLAR);
        let mut relay = CrossVmRelay::new();
        relay.poll(&ledger);

        assert!(
            relay
                .advance(&mut ext, &order_hash, CrossVmStatus::Completed)
                .is_err()
        );
        relay
            .advance(&mut ext, &order_hash, CrossVmStatus::Failed)
            .unwrap();
        assert!(relay.orders_with_status(CrossVmStatus::Pending).is_empty());
        assert_eq!(relay.orders_with_status(CrossVmStatus::Failed).len(), 1);
        assert_eq!(
            ext.cross_vm_order(&order_hash).unwrap().status,
            CrossVmStatus::Failed
        );
    }

    #[test]
    fn unknown_order_is_not_found() {
        let (mut ext, _) = setup();
        let mut relay = CrossVmRelay::new();
        let err = relay
            .advance(&mut ext, &OrderHash([7u8; 32]), CrossVmStatus::Processing)
            .unwrap_err();
        assert!(matches!(err, CrosslockError::OrderNotFound(_)));
    }

    #[test]
    fn order_from_another_extension_is_not_found() {
        let (mut ext, mut ledger) = setup();
        let order_hash = announce(&mut ext, &mut ledger, 1, VmType::STELLAR);
        let mut relay = CrossVmRelay::new();
        relay.poll(&ledger);

        let (mut other, _) = setup();
        let err = relay
            .advance(&mut other, &order_hash, CrossVmStatus::Processing)
            .unwrap_err();
        assert!(matches!(err, CrosslockError::OrderNotFound(_)));
        assert_eq!(
            relay.order(&order_hash).unwrap().order.status,
            CrossVmStatus::Pending
        );
    }

    #[test]
    fn pending_orders_come_oldest_first() {
        let (mut ext, mut ledger) = setup();
        let a = announce(&mut ext, &mut ledger, 3, VmType::STELLAR);
        let b = announce(&mut ext, &mut ledger, 1, VmType::STELLAR);
        let mut relay = CrossVmRelay::new();
        relay.poll(&ledger);

        let pending: Vec<_> = relay
            .orders_with_status(CrossVmStatus::Pending)
            .into_iter()
            .map(|t| t.order.order_hash)
            .collect();
        assert_eq!(pending, vec![a, b]);
    }
}
