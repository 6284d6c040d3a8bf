//! Merkle commitments over an order's secrets.
//!
//! Leaves are `H(index_be8 ‖ secret_hash)` and inner nodes hash the sorted
//! pair of their children, so a proof is just the list of siblings.
//!
//! A taker proves it may use secret `index` by presenting the secret hash,
//! the index and a proof that resolves to the order's committed root. The
//! result is kept as [`ValidationData`] keyed by `(order hash, root tag)` and
//! consulted by the partial-fill check on every subsequent fill.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crosslock_types::{CrosslockError, Hashlock, HashlockInfo, OrderHash, Result};

/// Leaf for secret `index` with hash `secret_hash`.
#[must_use]
pub fn leaf(index: u64, secret_hash: &Hashlock) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(index.to_be_bytes());
    hasher.update(secret_hash.as_bytes());
    hasher.finalize().into()
}

/// Hash of two siblings, order-independent.
#[must_use]
pub fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

/// Fold `proof` onto `leaf` and return the resulting root.
#[must_use]
pub fn process_proof(leaf: [u8; 32], proof: &[[u8; 32]]) -> [u8; 32] {
    proof.iter().fold(leaf, |node, sibling| hash_pair(&node, sibling))
}

// ---------------------------------------------------------------------------
// Tree builder
// ---------------------------------------------------------------------------

/// A complete tree over a list of leaves. An odd node at the end of a layer
/// is carried up unchanged.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree over `leaves`.
    ///
    /// # Errors
    /// Returns `Internal` for an empty leaf list.
    pub fn new(leaves: Vec<[u8; 32]>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(CrosslockError::Internal("merkle tree needs leaves".into()));
        }
        let mut layers = vec![leaves];
        while let Some(last) = layers.last().filter(|l| l.len() > 1) {
            let next = last
                .chunks(2)
                .filter_map(|pair| pair.iter().copied().reduce(|a, b| hash_pair(&a, &b)))
                .collect();
            layers.push(next);
        }
        Ok(Self { layers })
    }

    /// Build the tree over the secret hashes of one order, in index order.
    pub fn from_secret_hashes(hashes: &[Hashlock]) -> Result<Self> {
        Self::new(
            hashes
                .iter()
                .enumerate()
                .map(|(i, h)| leaf(i as u64, h))
                .collect(),
        )
    }

    #[must_use]
    pub fn root(&self) -> [u8; 32] {
        // Construction guarantees a non-empty top layer.
        self.layers
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Sibling path for leaf `index`, or `None` if out of range.
    #[must_use]
    pub fn proof(&self, index: usize) -> Option<Vec<[u8; 32]>> {
        if index >= self.leaf_count() {
            return None;
        }
        let mut proof = Vec::new();
        let mut i = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = i ^ 1;
            if let Some(node) = layer.get(sibling) {
                proof.push(*node);
            }
            i /= 2;
        }
        Some(proof)
    }
}

// ---------------------------------------------------------------------------
// Validation store
// ---------------------------------------------------------------------------

/// A taker's claim that `secret_hash` is leaf `index` of the order's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakerProof {
    pub index: u64,
    pub secret_hash: Hashlock,
    pub proof: Vec<[u8; 32]>,
}

/// The last secret validated for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationData {
    /// Leaf position plus one; zero never validates.
    pub index: u64,
    pub leaf: Hashlock,
}

/// Validated secrets per `(order hash, root tag)`.
#[derive(Debug, Default)]
pub struct ValidationStore {
    entries: HashMap<(OrderHash, [u8; 30]), ValidationData>,
}

impl ValidationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `proof` against the root committed in `info` without storing.
    ///
    /// # Errors
    /// Returns `InvalidProof` if the proof does not resolve to the root tag.
    pub fn validate_secret_proof(
        &self,
        order_hash: OrderHash,
        info: &HashlockInfo,
        proof: &TakerProof,
    ) -> Result<ValidationData> {
        let root = process_proof(leaf(proof.index, &proof.secret_hash), &proof.proof);
        if root[2..] != info.root_tag() {
            tracing::debug!(
                %order_hash,
                index = proof.index,
                root = %hex::encode(root),
                "Secret proof rejected"
            );
            return Err(CrosslockError::InvalidProof { order_hash });
        }
        let index = proof
            .index
            .checked_add(1)
            .ok_or(CrosslockError::InvalidProof { order_hash })?;
        Ok(ValidationData {
            index,
            leaf: proof.secret_hash,
        })
    }

    /// Store a validated entry, replacing the previous one.
    pub fn record(&mut self, order_hash: OrderHash, info: &HashlockInfo, data: ValidationData) {
        self.entries.insert((order_hash, info.root_tag()), data);
    }

    #[must_use]
    pub fn get(&self, order_hash: OrderHash, info: &HashlockInfo) -> Option<ValidationData> {
        self.entries.get(&(order_hash, info.root_tag())).copied()
    }
}
