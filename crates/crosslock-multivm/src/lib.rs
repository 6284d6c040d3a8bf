//! # crosslock-multivm
//!
//! **Multi-VM resolver extension**: lets one order fan out to destination
//! ledgers running a different virtual machine.
//!
//! ## Architecture
//!
//! [`MultiVmExtension`] wraps the escrow factory's post-fill hook. Each
//! fill's extension payload starts with a [`RoutingPrefix`] naming the
//! destination VM family, chain and address:
//! - Source VM: the prefix is stripped and the fill passes straight through
//! - Other VM: the resolver must have registered an address for that family
//!   in the [`ResolverRegistry`], the destination address must pass the
//!   family's [`AddressValidator`], and a pending [`CrossVmOrder`] is
//!   recorded once the wrapped hook succeeds
//!
//! Off-chain relays pick up the `CrossVmOrderCreated` event and drive the
//! order's status from there.
//!
//! [`CrossVmOrder`]: crosslock_types::CrossVmOrder

pub mod address_validator;
pub mod extension;
pub mod registry;
pub mod routing;

pub use address_validator::{
    AddressValidator, EvmAddressValidator, SolanaAddressValidator, StellarAddressValidator,
    ValidatorSet,
};
pub use extension::MultiVmExtension;
pub use registry::ResolverRegistry;
pub use routing::RoutingPrefix;
