//! Escrow parameters fixed at creation.
//!
//! The content hash of [`Immutables`] is both the escrow's lookup key and the
//! salt of its deterministic address. Every call on an escrow presents the
//! full immutables again; a presentation that hashes differently is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, AssetId, ChainId, Hashlock, OrderHash, Stage, Timelocks, constants};

/// Which leg of the swap an escrow holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowKind {
    /// Holds the maker's asset on the source ledger; released to the taker.
    Src,
    /// Holds the taker's asset on the destination ledger; released to the maker.
    Dst,
}

impl fmt::Display for EscrowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Src => write!(f, "SRC"),
            Self::Dst => write!(f, "DST"),
        }
    }
}

/// Parameters of one escrow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Immutables {
    pub order_hash: OrderHash,
    pub hashlock: Hashlock,
    pub maker: AccountId,
    pub taker: AccountId,
    /// Locked asset (may be [`AssetId::NATIVE`]).
    pub asset: AssetId,
    pub amount: u128,
    /// Native-currency incentive paid to whoever completes the escrow.
    pub safety_deposit: u128,
    pub timelocks: Timelocks,
}

impl Immutables {
    /// Content hash; the deterministic-deployment salt.
    #[must_use]
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(constants::IMMUTABLES_HASH_DOMAIN);
        hasher.update(self.order_hash.as_bytes());
        hasher.update(self.hashlock.as_bytes());
        hasher.update(self.maker.as_bytes());
        hasher.update(self.taker.as_bytes());
        hasher.update(self.asset.as_bytes());
        hasher.update(self.amount.to_be_bytes());
        hasher.update(self.safety_deposit.to_be_bytes());
        hasher.update(self.timelocks.deployed_at.to_be_bytes());
        for stage in Stage::ALL {
            hasher.update(self.timelocks.offset(stage).to_be_bytes());
        }
        hasher.finalize().into()
    }

    /// Copy with `deployed_at` stamped on the timelocks.
    #[must_use]
    pub fn deployed_at(mut self, timestamp: u64) -> Self {
        self.timelocks = self.timelocks.with_deployed_at(timestamp);
        self
    }
}

/// Destination-side parameters announced with a source escrow's creation,
/// for off-chain relays to build the matching destination escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DstImmutablesComplement {
    /// Effective receiver of the destination funds.
    pub maker: AccountId,
    pub amount: u128,
    pub asset: AssetId,
    pub safety_deposit: u128,
    pub chain_id: ChainId,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Immutables {
    pub fn dummy(maker: AccountId, taker: AccountId, hashlock: Hashlock) -> Self {
        Self {
            order_hash: OrderHash([1u8; 32]),
            hashlock,
            maker,
            taker,
            asset: AssetId::from_symbol("USDC"),
            amount: 100,
            safety_deposit: 10,
            timelocks: Timelocks::dummy(),
        }
    }
}
