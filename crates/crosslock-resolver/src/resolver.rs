//! Resolver orchestrator.
//!
//! A resolver is the taker of cross-chain orders. For each swap it:
//!
//! 1. **deploy_src**: pre-funds the source escrow's deterministic address
//!    with the safety deposit and fills the order through the settlement
//!    engine, naming that address as the fill target
//! 2. **deploy_dst**: locks the taker side on the destination ledger with
//!    the exact value the factory expects
//! 3. **withdraw**: once the maker's secret is shared, withdraws on both
//!    legs (or **cancel** after the cancellation stage)
//!
//! A failed fill returns the pre-funded deposit, so the resolver's balance
//! is unchanged whenever `deploy_src` errors.

use crosslock_escrow::{
    EscrowFactory, FillRequest, Ledger, PostFillHook, SettlementEngine, TakerProof, Transfer,
};
use crosslock_multivm::{MultiVmExtension, RoutingPrefix};
use crosslock_types::{
    AccountId, AssetId, CallContext, CrosslockError, Hashlock, Immutables, Order, OrderHash,
    ResolverConfig, Result, Secret, VmType,
};

use crate::secret_manager::SecretManager;

/// A post-fill hook backed by an escrow factory, so the resolver can
/// predict the source escrow address before filling.
pub trait FactoryHook: PostFillHook {
    fn factory(&self) -> &EscrowFactory;
}

impl FactoryHook for EscrowFactory {
    fn factory(&self) -> &EscrowFactory {
        self
    }
}

impl FactoryHook for MultiVmExtension<EscrowFactory> {
    fn factory(&self) -> &EscrowFactory {
        self.inner()
    }
}

/// One source-side fill the resolver wants to make.
#[derive(Debug, Clone)]
pub struct SrcDeployment<'a> {
    pub order: &'a Order,
    /// Expected escrow parameters; `deployed_at` is stamped on deploy.
    pub immutables: Immutables,
    /// Payload for the post-fill hook (routing prefix and/or `SrcPayload`).
    pub extension: Vec<u8>,
    pub taker_proof: Option<TakerProof>,
}

/// Drives both legs of a swap on behalf of its owner.
#[derive(Debug)]
pub struct Resolver {
    config: ResolverConfig,
    secrets: SecretManager,
}

impl Resolver {
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            secrets: SecretManager::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    #[must_use]
    pub fn owner(&self) -> AccountId {
        self.config.owner
    }

    #[must_use]
    pub fn secrets(&self) -> &SecretManager {
        &self.secrets
    }

    /// Routing prefix to `dst_address` on the configured destination chain.
    #[must_use]
    pub fn route(&self, vm_type: VmType, dst_address: impl Into<String>) -> RoutingPrefix {
        RoutingPrefix::new(vm_type, self.config.dst_chain_id, dst_address)
    }

    fn ctx(&self, now: u64) -> CallContext {
        CallContext::new(self.config.owner, now)
    }

    // -----------------------------------------------------------------
    // Source leg
    // -----------------------------------------------------------------

    /// Pre-fund the source escrow address and fill the order into it.
    ///
    /// Returns the source escrow address.
    ///
    /// # Errors
    /// - `InvalidCaller` if the immutables name a different taker
    /// - any ledger, engine or hook error; the deposit is returned first
    pub fn deploy_src<H: FactoryHook>(
        &self,
        ledger: &mut Ledger,
        engine: &mut dyn SettlementEngine,
        hook: &mut H,
        now: u64,
        deployment: SrcDeployment<'_>,
    ) -> Result<AccountId> {
        let immutables = deployment.immutables.deployed_at(now);
        if immutables.taker != self.config.owner {
            return Err(CrosslockError::InvalidCaller {
                caller: self.config.owner,
            });
        }
        let address = hook.factory().address_of_src(&immutables);

        let deposit = Transfer::new(
            self.config.owner,
            address,
            AssetId::NATIVE,
            immutables.safety_deposit,
        );
        ledger.transfer_all(&[deposit])?;

        let mut request =
            FillRequest::new(immutables.amount, address).with_extension(deployment.extension);
        if let Some(proof) = deployment.taker_proof {
            request = request.with_taker_proof(proof);
        }

        match engine.fill_order(ledger, &self.ctx(now), deployment.order, request, hook) {
            Ok(order_hash) => {
                tracing::info!(
                    %order_hash,
                    escrow = %address,
                    amount = immutables.amount,
                    "Source escrow deployed"
                );
                Ok(address)
            }
            Err(err) => {
                tracing::warn!(escrow = %address, error = %err, "Fill failed, returning deposit");
                ledger.transfer_all(&[deposit.reversed()])?;
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------
    // Destination leg
    // -----------------------------------------------------------------

    /// Lock the taker side on the destination ledger.
    ///
    /// Attaches the safety deposit, plus the amount when the locked asset is
    /// native, and lets the factory pull any token amount.
    ///
    /// # Errors
    /// `ChainMismatch` if `factory` is not on the configured destination
    /// chain; otherwise whatever `create_dst_escrow` rejects.
    pub fn deploy_dst(
        &self,
        ledger: &mut Ledger,
        factory: &mut EscrowFactory,
        now: u64,
        immutables: Immutables,
        src_cancellation_timestamp: u64,
    ) -> Result<AccountId> {
        let actual = factory.config().chain_id;
        if actual != self.config.dst_chain_id {
            return Err(CrosslockError::ChainMismatch {
                expected: self.config.dst_chain_id,
                actual,
            });
        }
        let value = if immutables.asset.is_native() {
            immutables
                .safety_deposit
                .checked_add(immutables.amount)
                .ok_or(CrosslockError::AmountOverflow)?
        } else {
            immutables.safety_deposit
        };
        let ctx = self.ctx(now).with_value(value);
        factory.create_dst_escrow(ledger, &ctx, immutables, src_cancellation_timestamp)
    }

    // -----------------------------------------------------------------
    // Secrets
    // -----------------------------------------------------------------

    /// Accept the maker's secret for `order_hash`.
    pub fn submit_order_and_secret(
        &mut self,
        order_hash: OrderHash,
        hash: Hashlock,
        secret: Secret,
    ) -> Result<()> {
        self.secrets.submit(order_hash, hash, secret)
    }

    // -----------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------

    pub fn withdraw(
        &self,
        ledger: &mut Ledger,
        factory: &mut EscrowFactory,
        now: u64,
        escrow: AccountId,
        secret: &Secret,
        immutables: &Immutables,
    ) -> Result<()> {
        factory
            .escrow_mut(&escrow)?
            .withdraw(ledger, &self.ctx(now), secret, immutables)
    }

    /// Withdraw using the secret stored for the escrow's order.
    ///
    /// # Errors
    /// Returns `SecretNotFound` if no secret was submitted for the order.
    pub fn withdraw_with_stored_secret(
        &self,
        ledger: &mut Ledger,
        factory: &mut EscrowFactory,
        now: u64,
        escrow: AccountId,
        immutables: &Immutables,
    ) -> Result<()> {
        let secret = self.secrets.reveal(&immutables.order_hash)?;
        self.withdraw(ledger, factory, now, escrow, &secret, immutables)
    }

    pub fn cancel(
        &self,
        ledger: &mut Ledger,
        factory: &mut EscrowFactory,
        now: u64,
        escrow: AccountId,
        immutables: &Immutables,
    ) -> Result<()> {
        factory
            .escrow_mut(&escrow)?
            .cancel(ledger, &self.ctx(now), immutables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslock_escrow::{EscrowState, LocalSettlement, SrcPayload};
    use crosslock_types::{ChainId, FactoryConfig, HashlockInfo, Stage, Timelocks};

    const DEPOSIT: u128 = 10;
    const NOW: u64 = 1_000;

    struct Fixture {
        ledger: Ledger,
        factory: EscrowFactory,
        engine: LocalSettlement,
        resolver: Resolver,
        maker: AccountId,
        secret: Secret,
    }

    fn fixture() -> Fixture {
        let maker = AccountId::from_label("maker");
        let owner = AccountId::from_label("resolver");
        let mut ledger = Ledger::new();
        ledger
            .credit(maker, AssetId::from_symbol("USDC"), 1_000)
            .unwrap();
        ledger.credit(owner, AssetId::NATIVE, 1_000).unwrap();
        Fixture {
            ledger,
            factory: EscrowFactory::new(FactoryConfig::default()),
            engine: LocalSettlement::new(),
            resolver: Resolver::new(ResolverConfig {
                owner,
                dst_chain_id: ChainId(137),
            }),
            maker,
            secret: Secret([9u8; 32]),
        }
    }

    fn deployment<'a>(f: &Fixture, order: &'a Order, deposit: u128) -> SrcDeployment<'a> {
        let extension = SrcPayload {
            hashlock_info: HashlockInfo::single(f.secret.hashlock()),
            dst_chain_id: ChainId(137),
            dst_asset: AssetId::from_symbol("DAI"),
            src_safety_deposit: DEPOSIT,
            dst_safety_deposit: 5,
            timelocks: Timelocks::dummy(),
        }
        .encode()
        .unwrap();
        let mut immutables = Immutables::dummy(order.maker, f.resolver.owner(), f.secret.hashlock());
        immutables.order_hash = order.hash();
        immutables.safety_deposit = deposit;
        SrcDeployment {
            order,
            immutables,
            extension,
            taker_proof: None,
        }
    }

    #[test]
    fn deploy_src_funds_and_fills() {
        let mut f = fixture();
        let order = Order::dummy(f.maker);
        let d = deployment(&f, &order, DEPOSIT);
        let immutables = d.immutables.deployed_at(NOW);

        let address = f
            .resolver
            .deploy_src(&mut f.ledger, &mut f.engine, &mut f.factory, NOW, d)
            .unwrap();

        assert_eq!(address, f.factory.address_of_src(&immutables));
        assert_eq!(f.factory.escrow(&address).unwrap().state(), EscrowState::Funded);
        assert_eq!(f.ledger.balance_of(address, AssetId::NATIVE), DEPOSIT);
        assert_eq!(f.ledger.balance_of(address, order.maker_asset), 100);
    }

    #[test]
    fn failed_fill_returns_deposit() {
        let mut f = fixture();
        let order = Order::dummy(f.maker);
        // Immutables promise a deposit the payload does not: the address
        // the resolver funds is not the one the factory checks.
        let d = deployment(&f, &order, DEPOSIT + 1);

        let err = f
            .resolver
            .deploy_src(&mut f.ledger, &mut f.engine, &mut f.factory, NOW, d)
            .unwrap_err();

        assert!(matches!(err, CrosslockError::InsufficientEscrowBalance { .. }));
        assert_eq!(
            f.ledger.balance_of(f.resolver.owner(), AssetId::NATIVE),
            1_000
        );
        assert_eq!(f.ledger.balance_of(f.maker, order.maker_asset), 1_000);
        assert_eq!(f.factory.escrow_count(), 0);
    }

    #[test]
    fn foreign_taker_is_rejected_before_funding() {
        let mut f = fixture();
        let order = Order::dummy(f.maker);
        let mut d = deployment(&f, &order, DEPOSIT);
        d.immutables.taker = AccountId::from_label("someone-else");

        let err = f
            .resolver
            .deploy_src(&mut f.ledger, &mut f.engine, &mut f.factory, NOW, d)
            .unwrap_err();
        assert!(matches!(err, CrosslockError::InvalidCaller { .. }));
        assert_eq!(
            f.ledger.balance_of(f.resolver.owner(), AssetId::NATIVE),
            1_000
        );
    }

    #[test]
    fn stored_secret_withdraws_source_leg() {
        let mut f = fixture();
        let order = Order::dummy(f.maker);
        let d = deployment(&f, &order, DEPOSIT);
        let immutables = d.immutables.deployed_at(NOW);
        let address = f
            .resolver
            .deploy_src(&mut f.ledger, &mut f.engine, &mut f.factory, NOW, d)
            .unwrap();

        let at = immutables.timelocks.get(Stage::SrcWithdrawal);
        let err = f
            .resolver
            .withdraw_with_stored_secret(&mut f.ledger, &mut f.factory, at, address, &immutables)
            .unwrap_err();
        assert!(matches!(err, CrosslockError::SecretNotFound(_)));

        f.resolver
            .submit_order_and_secret(order.hash(), f.secret.hashlock(), f.secret)
            .unwrap();
        f.resolver
            .withdraw_with_stored_secret(&mut f.ledger, &mut f.factory, at, address, &immutables)
            .unwrap();

        assert_eq!(f.factory.escrow(&address).unwrap().state(), EscrowState::Withdrawn);
        assert_eq!(
            f.ledger.balance_of(f.resolver.owner(), order.maker_asset),
            100
        );
    }

    fn dst_factory() -> EscrowFactory {
        EscrowFactory::new(FactoryConfig {
            chain_id: ChainId(137),
            ..FactoryConfig::default()
        })
    }

    #[test]
    fn deploy_dst_attaches_exact_value() {
        let mut f = fixture();
        let mut dst = dst_factory();
        let owner = f.resolver.owner();
        f.ledger
            .credit(owner, AssetId::from_symbol("DAI"), 500)
            .unwrap();
        let mut immutables = Immutables::dummy(f.maker, owner, f.secret.hashlock());
        immutables.asset = AssetId::from_symbol("DAI");

        let src_cancellation = NOW + u64::from(immutables.timelocks.offset(Stage::SrcCancellation));
        let address = f
            .resolver
            .deploy_dst(&mut f.ledger, &mut dst, NOW, immutables, src_cancellation)
            .unwrap();

        assert_eq!(
            f.ledger.balance_of(address, AssetId::NATIVE),
            immutables.safety_deposit
        );
        assert_eq!(
            f.ledger.balance_of(address, AssetId::from_symbol("DAI")),
            immutables.amount
        );
    }

    #[test]
    fn deploy_dst_refuses_factory_on_other_chain() {
        let mut f = fixture();
        let owner = f.resolver.owner();
        let immutables = Immutables::dummy(f.maker, owner, f.secret.hashlock());
        let src_cancellation = NOW + u64::from(immutables.timelocks.offset(Stage::SrcCancellation));
        let native_before = f.ledger.balance_of(owner, AssetId::NATIVE);

        // The fixture factory runs on chain 1; the resolver targets 137.
        let err = f
            .resolver
            .deploy_dst(&mut f.ledger, &mut f.factory, NOW, immutables, src_cancellation)
            .unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::ChainMismatch {
                expected: ChainId(137),
                actual: ChainId(1)
            }
        ));
        assert_eq!(f.ledger.balance_of(owner, AssetId::NATIVE), native_before);
    }

    #[test]
    fn route_defaults_to_configured_chain() {
        let f = fixture();
        let route = f.resolver.route(VmType::STELLAR, "GADDR");
        assert_eq!(route.dst_chain_id, ChainId(137));
        assert_eq!(route.vm_type, VmType::STELLAR);
        assert_eq!(route.dst_address, "GADDR");
    }

    #[test]
    fn cancel_refunds_maker_after_deadline() {
        let mut f = fixture();
        let order = Order::dummy(f.maker);
        let d = deployment(&f, &order, DEPOSIT);
        let immutables = d.immutables.deployed_at(NOW);
        let address = f
            .resolver
            .deploy_src(&mut f.ledger, &mut f.engine, &mut f.factory, NOW, d)
            .unwrap();

        let early = immutables.timelocks.get(Stage::SrcCancellation) - 1;
        assert!(
            f.resolver
                .cancel(&mut f.ledger, &mut f.factory, early, address, &immutables)
                .is_err()
        );

        let at = immutables.timelocks.get(Stage::SrcCancellation);
        f.resolver
            .cancel(&mut f.ledger, &mut f.factory, at, address, &immutables)
            .unwrap();
        assert_eq!(f.ledger.balance_of(f.maker, order.maker_asset), 1_000);
    }
}
