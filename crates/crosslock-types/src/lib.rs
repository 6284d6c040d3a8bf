//! # crosslock-types
//!
//! Shared types, errors, and configuration for **crosslock** cross-chain
//! hash-time-locked escrows.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AssetId`], [`OrderHash`], [`ChainId`], [`EventId`]
//! - **Order model**: [`Order`], [`MakerTraits`]
//! - **Hashlocks**: [`Secret`], [`Hashlock`], [`HashlockInfo`]
//! - **Timelocks**: [`Timelocks`], [`Stage`]
//! - **Escrow parameters**: [`Immutables`], [`DstImmutablesComplement`], [`EscrowKind`]
//! - **Call context**: [`CallContext`]
//! - **Multi-VM model**: [`VmType`], [`CrossVmOrder`], [`CrossVmStatus`]
//! - **Events**: [`EscrowEvent`], [`EventRecord`]
//! - **Configuration**: [`FactoryConfig`], [`ResolverConfig`]
//! - **Errors**: [`CrosslockError`] with `CL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod event;
pub mod hashlock;
pub mod ids;
pub mod immutables;
pub mod order;
pub mod timelocks;
pub mod vm;

// Re-export all primary types at crate root for ergonomic imports:
//   use crosslock_types::{Immutables, Timelocks, Stage, ...};

pub use config::*;
pub use context::*;
pub use error::*;
pub use event::*;
pub use hashlock::*;
pub use ids::*;
pub use immutables::*;
pub use order::*;
pub use timelocks::*;
pub use vm::*;

// Constants are accessed via `crosslock_types::constants::FOO`
// (not re-exported to avoid name collisions).
