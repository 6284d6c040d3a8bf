//! Escrow lifecycle integration tests.
//!
//! These drive the factory through the local settlement engine the way a
//! resolver would: pre-fund the deterministic source address, fill the
//! order, then withdraw or cancel. They cover single-secret swaps,
//! multi-part fills with Merkle-validated secrets, and atomic rollback of
//! failed fills.

use crosslock_escrow::{
    EscrowFactory, EscrowState, FillRequest, Ledger, LocalSettlement, MerkleTree, SettlementEngine,
    SrcPayload, TakerProof, Transfer,
};
use crosslock_types::{
    AccountId, AssetId, CallContext, ChainId, CrosslockError, EscrowEvent, FactoryConfig, Hashlock,
    HashlockInfo, Immutables, Order, Secret, Stage, Timelocks,
};

const SRC_DEPOSIT: u128 = 10;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct World {
    ledger: Ledger,
    factory: EscrowFactory,
    engine: LocalSettlement,
    maker: AccountId,
    taker: AccountId,
}

impl World {
    fn new() -> Self {
        init_tracing();
        let maker = AccountId::from_label("maker");
        let taker = AccountId::from_label("resolver");
        let mut ledger = Ledger::new();
        ledger
            .credit(maker, AssetId::from_symbol("USDC"), 1_000)
            .unwrap();
        ledger.credit(taker, AssetId::NATIVE, 1_000).unwrap();
        Self {
            ledger,
            factory: EscrowFactory::new(FactoryConfig::default()),
            engine: LocalSettlement::new(),
            maker,
            taker,
        }
    }

    fn payload(info: HashlockInfo) -> Vec<u8> {
        SrcPayload {
            hashlock_info: info,
            dst_chain_id: ChainId(137),
            dst_asset: AssetId::from_symbol("DAI"),
            src_safety_deposit: SRC_DEPOSIT,
            dst_safety_deposit: 5,
            timelocks: Timelocks::dummy(),
        }
        .encode()
        .unwrap()
    }

    fn immutables(&self, order: &Order, hashlock: Hashlock, amount: u128, now: u64) -> Immutables {
        Immutables {
            order_hash: order.hash(),
            hashlock,
            maker: order.maker,
            taker: self.taker,
            asset: order.maker_asset,
            amount,
            safety_deposit: SRC_DEPOSIT,
            timelocks: Timelocks::dummy().with_deployed_at(now),
        }
    }

    /// Pre-fund the deposit and fill. Refunds the deposit if the fill fails.
    fn fill(
        &mut self,
        order: &Order,
        hashlock: Hashlock,
        info: HashlockInfo,
        amount: u128,
        proof: Option<TakerProof>,
        now: u64,
    ) -> Result<AccountId, CrosslockError> {
        let immutables = self.immutables(order, hashlock, amount, now);
        let address = self.factory.address_of_src(&immutables);
        let deposit = Transfer::new(self.taker, address, AssetId::NATIVE, SRC_DEPOSIT);
        self.ledger.transfer_all(&[deposit]).unwrap();

        let mut request = FillRequest::new(amount, address).with_extension(Self::payload(info));
        if let Some(proof) = proof {
            request = request.with_taker_proof(proof);
        }
        match self.engine.fill_order(
            &mut self.ledger,
            &CallContext::new(self.taker, now),
            order,
            request,
            &mut self.factory,
        ) {
            Ok(_) => Ok(address),
            Err(err) => {
                self.ledger.transfer_all(&[deposit.reversed()]).unwrap();
                Err(err)
            }
        }
    }
}

#[test]
fn single_secret_swap_withdraws_to_taker() {
    let mut w = World::new();
    let order = Order::dummy(w.maker);
    let secret = Secret([7u8; 32]);
    let now = 1_000;

    let address = w
        .fill(
            &order,
            secret.hashlock(),
            HashlockInfo::single(secret.hashlock()),
            100,
            None,
            now,
        )
        .unwrap();
    let immutables = w.immutables(&order, secret.hashlock(), 100, now);

    w.factory
        .escrow_mut(&address)
        .unwrap()
        .withdraw(
            &mut w.ledger,
            &CallContext::new(w.taker, immutables.timelocks.get(Stage::SrcWithdrawal)),
            &secret,
            &immutables,
        )
        .unwrap();

    assert_eq!(w.factory.escrow(&address).unwrap().state(), EscrowState::Withdrawn);
    assert_eq!(w.ledger.balance_of(w.taker, order.maker_asset), 100);
    assert_eq!(w.ledger.balance_of(w.taker, AssetId::NATIVE), 1_000);
    w.ledger.verify_supply(order.maker_asset).unwrap();
    w.ledger.verify_supply(AssetId::NATIVE).unwrap();

    let names: Vec<_> = w.ledger.events().iter().map(|r| r.event.name()).collect();
    assert_eq!(names, vec!["SrcEscrowCreated", "EscrowWithdrawal"]);
}

#[test]
fn cancelled_swap_refunds_maker() {
    let mut w = World::new();
    let order = Order::dummy(w.maker);
    let secret = Secret([7u8; 32]);
    let now = 1_000;

    let address = w
        .fill(
            &order,
            secret.hashlock(),
            HashlockInfo::single(secret.hashlock()),
            100,
            None,
            now,
        )
        .unwrap();
    let immutables = w.immutables(&order, secret.hashlock(), 100, now);

    w.factory
        .escrow_mut(&address)
        .unwrap()
        .cancel(
            &mut w.ledger,
            &CallContext::new(w.taker, immutables.timelocks.get(Stage::SrcCancellation)),
            &immutables,
        )
        .unwrap();
    assert_eq!(w.ledger.balance_of(w.maker, order.maker_asset), 1_000);
    assert!(matches!(
        w.ledger.events().last().unwrap().event,
        EscrowEvent::EscrowCancelled { .. }
    ));
}

#[test]
fn unfunded_fill_is_rolled_back() {
    let mut w = World::new();
    let order = Order::dummy(w.maker);
    let secret = Secret([7u8; 32]);
    let now = 1_000;
    let immutables = w.immutables(&order, secret.hashlock(), 100, now);
    let address = w.factory.address_of_src(&immutables);

    // No safety deposit sent.
    let err = w
        .engine
        .fill_order(
            &mut w.ledger,
            &CallContext::new(w.taker, now),
            &order,
            FillRequest::new(100, address)
                .with_extension(World::payload(HashlockInfo::single(secret.hashlock()))),
            &mut w.factory,
        )
        .unwrap_err();
    assert!(matches!(err, CrosslockError::InsufficientEscrowBalance { .. }));
    assert_eq!(w.ledger.balance_of(w.maker, order.maker_asset), 1_000);
    assert_eq!(w.ledger.balance_of(address, order.maker_asset), 0);
    assert_eq!(w.engine.remaining(&order), 100);
    assert_eq!(w.factory.escrow_count(), 0);
    assert!(w.ledger.events().is_empty());
}

#[test]
fn multi_part_fills_follow_secret_indices() {
    // parts = 4, order = 100: five secrets, the last completes the order.
    let mut w = World::new();
    let order = Order::dummy_multi_fill(w.maker);
    let secrets: Vec<Secret> = (0..5u8).map(|i| Secret([i + 1; 32])).collect();
    let hashes: Vec<Hashlock> = secrets.iter().map(Secret::hashlock).collect();
    let tree = MerkleTree::from_secret_hashes(&hashes).unwrap();
    let info = HashlockInfo::multi_part(4, &tree.root());
    let proof = |i: usize| TakerProof {
        index: i as u64,
        secret_hash: hashes[i],
        proof: tree.proof(i).unwrap(),
    };

    // First fill of 25 must present validated index 1 (leaf 0).
    w.fill(&order, hashes[0], info, 25, Some(proof(0)), 1_000).unwrap();
    assert_eq!(w.factory.validation(order.hash(), &info).unwrap().index, 1);

    // Second quarter with the wrong secret is rejected and reverted.
    let err = w
        .fill(&order, hashes[2], info, 25, Some(proof(2)), 1_001)
        .unwrap_err();
    assert!(matches!(err, CrosslockError::InvalidPartialFill { .. }));
    assert_eq!(w.engine.remaining(&order), 75);
    assert_eq!(w.factory.validation(order.hash(), &info).unwrap().index, 1);

    w.fill(&order, hashes[1], info, 25, Some(proof(1)), 1_002).unwrap();

    // The completing fill takes calc + 2 = 5 (leaf 4), not leaf 3.
    let err = w
        .fill(&order, hashes[3], info, 50, Some(proof(3)), 1_003)
        .unwrap_err();
    assert!(matches!(err, CrosslockError::InvalidPartialFill { .. }));

    w.fill(&order, hashes[4], info, 50, Some(proof(4)), 1_004).unwrap();
    assert_eq!(w.engine.remaining(&order), 0);
    assert_eq!(w.factory.escrow_count(), 3);
    assert_eq!(w.ledger.balance_of(w.maker, order.maker_asset), 900);
}

#[test]
fn multi_part_fill_with_foreign_proof_is_rejected() {
    let mut w = World::new();
    let order = Order::dummy_multi_fill(w.maker);
    let hashes: Vec<Hashlock> = (0..5u8).map(|i| Secret([i + 1; 32]).hashlock()).collect();
    let tree = MerkleTree::from_secret_hashes(&hashes).unwrap();
    let info = HashlockInfo::multi_part(4, &tree.root());

    let foreign: Vec<Hashlock> = (0..5u8).map(|i| Secret([i + 50; 32]).hashlock()).collect();
    let foreign_tree = MerkleTree::from_secret_hashes(&foreign).unwrap();
    let proof = TakerProof {
        index: 0,
        secret_hash: foreign[0],
        proof: foreign_tree.proof(0).unwrap(),
    };

    let err = w
        .fill(&order, foreign[0], info, 25, Some(proof), 1_000)
        .unwrap_err();
    assert!(matches!(err, CrosslockError::InvalidProof { .. }));
    assert!(w.factory.validation(order.hash(), &info).is_none());
}
