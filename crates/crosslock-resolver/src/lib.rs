//! # crosslock-resolver
//!
//! **Off-chain collaborators** of the escrow core.
//!
//! - [`Resolver`]: pre-funds and fills source escrows, locks destination
//!   escrows, withdraws or cancels both legs
//! - [`SecretManager`] / [`SecretTree`]: generate, store and verify swap
//!   secrets, including the Merkle-committed secrets of multi-fill orders
//! - [`CrossVmRelay`]: tails the event log for cross-VM orders and drives
//!   their status lifecycle
//!
//! None of these hold value themselves; every balance change goes through
//! the escrow crate's [`Ledger`](crosslock_escrow::Ledger).

pub mod relay;
pub mod resolver;
pub mod secret_manager;

pub use relay::{CrossVmRelay, TrackedOrder};
pub use resolver::{FactoryHook, Resolver, SrcDeployment};
pub use secret_manager::{SecretManager, SecretTree, SwapSecret, random_secret};
