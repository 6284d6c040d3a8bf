//! # crosslock-escrow
//!
//! **Escrow core**: hash-time-locked escrows, the factory that deploys them,
//! and the verification machinery run on every fill.
//!
//! ## Architecture
//!
//! The settlement engine fills an order, moves the maker's asset to the
//! deterministic source-escrow address, then calls the factory's
//! [`PostFillHook`]:
//! 1. Decodes the fixed-layout [`SrcPayload`]
//! 2. Resolves the hashlock (single secret, or Merkle-validated part secret)
//! 3. Checks the partial fill against the validated secret index
//! 4. Derives the escrow address and verifies it was pre-funded
//! 5. Deploys the [`Escrow`] and emits `SrcEscrowCreated`
//!
//! Destination escrows are created directly by the resolver via
//! [`EscrowFactory::create_dst_escrow`]. Both legs are completed by
//! revealing the secret or refunded after their cancellation stage.
//!
//! All value lives in a [`Ledger`]; every entry point is atomic.

pub mod address;
pub mod escrow;
pub mod factory;
pub mod hook;
pub mod ledger;
pub mod merkle;
pub mod partial_fill;
pub mod payload;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use escrow::{Escrow, EscrowState};
pub use factory::EscrowFactory;
pub use hook::{FillContext, FillRequest, PostFillHook, SettlementEngine};
pub use ledger::{Ledger, Transfer};
pub use merkle::{MerkleTree, TakerProof, ValidationData, ValidationStore};
pub use partial_fill::is_valid_partial_fill;
pub use payload::SrcPayload;
#[cfg(any(test, feature = "test-helpers"))]
pub use testing::LocalSettlement;
