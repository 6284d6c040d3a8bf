//! Hashlock primitives: secrets, their commitments, and the packed
//! hashlock info word used by multi-fill orders.
//!
//! ```text
//!   HashlockInfo (32 bytes, big-endian)
//!   ┌──────────────┬──────────────────────────────────────┐
//!   │ parts (u16)  │ Merkle root tag (low 240 bits)       │
//!   └──────────────┴──────────────────────────────────────┘
//! ```
//!
//! For single-fill orders the whole word is the hashlock itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// A 32-byte swap secret. Revealing it releases the escrowed funds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Secret(pub [u8; 32]);

impl Secret {
    /// The commitment this secret opens.
    #[must_use]
    pub fn hashlock(&self) -> Hashlock {
        Hashlock(sha256(&self.0))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({}..)", hex::encode(&self.0[..2]))
    }
}

/// Commitment `H(secret)` gating an escrow's release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Hashlock(pub [u8; 32]);

impl Hashlock {
    /// Whether `secret` opens this hashlock.
    #[must_use]
    pub fn matches(&self, secret: &Secret) -> bool {
        is_valid_secret(secret, self)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hashlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// `H(secret) == hashlock`.
#[must_use]
pub fn is_valid_secret(secret: &Secret, hashlock: &Hashlock) -> bool {
    sha256(&secret.0) == hashlock.0
}

/// Raw hashlock word from the post-fill payload.
///
/// Interpreted either as a single [`Hashlock`] or as `{parts_amount, root tag}`
/// depending on the order's multiple-fills trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashlockInfo(pub [u8; 32]);

impl HashlockInfo {
    /// Single-secret commitment.
    #[must_use]
    pub fn single(hashlock: Hashlock) -> Self {
        Self(hashlock.0)
    }

    /// Multi-part commitment: `parts_amount` in the top 16 bits, the low
    /// 240 bits of `root` below it.
    #[must_use]
    pub fn multi_part(parts_amount: u16, root: &[u8; 32]) -> Self {
        let mut word = *root;
        word[..2].copy_from_slice(&parts_amount.to_be_bytes());
        Self(word)
    }

    /// Interpret the whole word as a single hashlock.
    #[must_use]
    pub fn as_hashlock(&self) -> Hashlock {
        Hashlock(self.0)
    }

    /// Number of parts the order was split into.
    #[must_use]
    pub fn parts_amount(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    /// Low 240 bits of the Merkle root over the order's secrets.
    #[must_use]
    pub fn root_tag(&self) -> [u8; 30] {
        let mut tag = [0u8; 30];
        tag.copy_from_slice(&self.0[2..]);
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_opens_its_own_hashlock() {
        let secret = Secret([7u8; 32]);
        let hashlock = secret.hashlock();
        assert!(hashlock.matches(&secret));
        assert!(is_valid_secret(&secret, &hashlock));
    }

    #[test]
    fn wrong_secret_rejected() {
        let hashlock = Secret([7u8; 32]).hashlock();
        assert!(!hashlock.matches(&Secret([8u8; 32])));
    }

    #[test]
    fn multi_part_info_packs_parts_and_root() {
        let root = sha256(b"root");
        let info = HashlockInfo::multi_part(4, &root);
        assert_eq!(info.parts_amount(), 4);
        assert_eq!(info.root_tag()[..], root[2..]);
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret([0xab; 32]);
        assert_eq!(format!("{secret:?}"), "Secret(abab..)");
    }
}
