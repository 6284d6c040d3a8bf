//! Deterministic escrow addresses.
//!
//! ```text
//! address = SHA-256(domain ‖ factory id ‖ implementation hash ‖ H(immutables))
//! ```
//!
//! The address is known before the escrow exists, so a resolver can fund it
//! ahead of the fill that deploys it.

use sha2::{Digest, Sha256};

use crosslock_types::{AccountId, EscrowKind, Immutables, constants, sha256};

const SRC_IMPLEMENTATION: &[u8] = b"crosslock:escrow-src:v1";
const DST_IMPLEMENTATION: &[u8] = b"crosslock:escrow-dst:v1";

/// Identity of the escrow code for one leg.
#[must_use]
pub fn implementation_hash(kind: EscrowKind) -> [u8; 32] {
    match kind {
        EscrowKind::Src => sha256(SRC_IMPLEMENTATION),
        EscrowKind::Dst => sha256(DST_IMPLEMENTATION),
    }
}

/// Address of the `kind` escrow with `immutables` deployed by `factory_id`.
#[must_use]
pub fn escrow_address(factory_id: &AccountId, kind: EscrowKind, immutables: &Immutables) -> AccountId {
    let mut hasher = Sha256::new();
    hasher.update(constants::ESCROW_ADDRESS_DOMAIN);
    hasher.update(factory_id.as_bytes());
    hasher.update(implementation_hash(kind));
    hasher.update(immutables.hash());
    AccountId(hasher.finalize().into())
}
