//! Off-chain secret manager.
//!
//! Holds the `(secret, hash)` pair that unlocks each order's escrows until
//! the withdrawal windows open. One secret is active per order hash; a
//! second submission is rejected until the first is replaced or removed.
//!
//! Multi-fill orders commit to a [`SecretTree`] instead: `parts + 1`
//! secrets whose hashes form the Merkle tree behind the order's
//! [`HashlockInfo`]. Fill `k` of the order reveals the secret the partial
//! fill rules select for it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crosslock_escrow::{MerkleTree, TakerProof, is_valid_partial_fill};
use crosslock_types::{
    CrosslockError, Hashlock, HashlockInfo, OrderHash, Result, Secret, constants::MIN_PARTS_AMOUNT,
};

/// Fresh random secret.
#[must_use]
pub fn random_secret() -> Secret {
    Secret(rand::random::<[u8; 32]>())
}

/// A stored secret and the order it unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSecret {
    pub secret: Secret,
    pub hash: Hashlock,
    pub order_hash: OrderHash,
    pub created_at: DateTime<Utc>,
}

/// `order hash → active secret`.
#[derive(Debug, Default)]
pub struct SecretManager {
    secrets: HashMap<OrderHash, SwapSecret>,
}

impl SecretManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and store a fresh secret for `order_hash`.
    ///
    /// # Errors
    /// Returns `SecretAlreadyStored` if the order already has one.
    pub fn generate(&mut self, order_hash: OrderHash) -> Result<Hashlock> {
        let secret = random_secret();
        let hash = secret.hashlock();
        self.submit(order_hash, hash, secret)?;
        Ok(hash)
    }

    /// Store a `(secret, hash)` pair supplied out of band.
    ///
    /// # Errors
    /// - `InvalidSecret` if `secret` does not hash to `hash`
    /// - `SecretAlreadyStored` if the order already has an active secret
    pub fn submit(&mut self, order_hash: OrderHash, hash: Hashlock, secret: Secret) -> Result<()> {
        if !hash.matches(&secret) {
            return Err(CrosslockError::InvalidSecret);
        }
        if self.secrets.contains_key(&order_hash) {
            return Err(CrosslockError::SecretAlreadyStored(order_hash));
        }
        self.secrets
            .insert(order_hash, Self::entry(order_hash, hash, secret));
        tracing::info!(%order_hash, %hash, "Secret stored");
        Ok(())
    }

    /// Store a pair, replacing any active secret. Returns the replaced one.
    ///
    /// # Errors
    /// Returns `InvalidSecret` if `secret` does not hash to `hash`.
    pub fn replace(
        &mut self,
        order_hash: OrderHash,
        hash: Hashlock,
        secret: Secret,
    ) -> Result<Option<SwapSecret>> {
        if !hash.matches(&secret) {
            return Err(CrosslockError::InvalidSecret);
        }
        let previous = self
            .secrets
            .insert(order_hash, Self::entry(order_hash, hash, secret));
        tracing::info!(%order_hash, %hash, replaced = previous.is_some(), "Secret replaced");
        Ok(previous)
    }

    /// Drop the order's secret, returning it if there was one.
    pub fn remove(&mut self, order_hash: &OrderHash) -> Option<SwapSecret> {
        self.secrets.remove(order_hash)
    }

    /// The stored entry for `order_hash`.
    ///
    /// # Errors
    /// Returns `SecretNotFound` if nothing is stored.
    pub fn get(&self, order_hash: &OrderHash) -> Result<&SwapSecret> {
        self.secrets
            .get(order_hash)
            .ok_or(CrosslockError::SecretNotFound(*order_hash))
    }

    /// The secret to reveal for `order_hash`.
    pub fn reveal(&self, order_hash: &OrderHash) -> Result<Secret> {
        self.get(order_hash).map(|entry| entry.secret)
    }

    /// Whether `secret` is the active secret for `order_hash`.
    #[must_use]
    pub fn verify(&self, order_hash: &OrderHash, secret: &Secret) -> bool {
        self.secrets
            .get(order_hash)
            .is_some_and(|entry| entry.hash.matches(secret) && entry.secret == *secret)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    fn entry(order_hash: OrderHash, hash: Hashlock, secret: Secret) -> SwapSecret {
        SwapSecret {
            secret,
            hash,
            order_hash,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Multi-part secrets
// ---------------------------------------------------------------------------

/// The `parts + 1` secrets of a multi-fill order and their Merkle tree.
#[derive(Debug, Clone)]
pub struct SecretTree {
    parts_amount: u16,
    secrets: Vec<Secret>,
    hashes: Vec<Hashlock>,
    tree: MerkleTree,
}

impl SecretTree {
    /// Random secrets for an order split into `parts_amount` parts.
    ///
    /// # Errors
    /// Returns `InvalidSecretsAmount` if `parts_amount < 2`.
    pub fn generate(parts_amount: u16) -> Result<Self> {
        let secrets = (0..=parts_amount).map(|_| random_secret()).collect();
        Self::from_secrets(parts_amount, secrets)
    }

    /// Build from known secrets; there must be exactly `parts_amount + 1`.
    ///
    /// # Errors
    /// Returns `InvalidSecretsAmount` on a bad part count or secret count.
    pub fn from_secrets(parts_amount: u16, secrets: Vec<Secret>) -> Result<Self> {
        if parts_amount < MIN_PARTS_AMOUNT || secrets.len() != usize::from(parts_amount) + 1 {
            return Err(CrosslockError::InvalidSecretsAmount { parts_amount });
        }
        let hashes: Vec<Hashlock> = secrets.iter().map(Secret::hashlock).collect();
        let tree = MerkleTree::from_secret_hashes(&hashes)?;
        Ok(Self {
            parts_amount,
            secrets,
            hashes,
            tree,
        })
    }

    #[must_use]
    pub fn parts_amount(&self) -> u16 {
        self.parts_amount
    }

    /// The hashlock word the maker signs into the order payload.
    #[must_use]
    pub fn hashlock_info(&self) -> HashlockInfo {
        HashlockInfo::multi_part(self.parts_amount, &self.tree.root())
    }

    #[must_use]
    pub fn secret(&self, index: usize) -> Option<Secret> {
        self.secrets.get(index).copied()
    }

    #[must_use]
    pub fn hashlock(&self, index: usize) -> Option<Hashlock> {
        self.hashes.get(index).copied()
    }

    /// Proof the taker attaches to a fill using secret `index`.
    #[must_use]
    pub fn proof(&self, index: usize) -> Option<TakerProof> {
        Some(TakerProof {
            index: u64::try_from(index).ok()?,
            secret_hash: *self.hashes.get(index)?,
            proof: self.tree.proof(index)?,
        })
    }

    /// Index of the secret that authorizes filling `fill_amount` out of
    /// `remaining_before`, or `None` if no secret can (a second fill inside
    /// an already-used part).
    #[must_use]
    pub fn index_for_fill(
        &self,
        order_amount: u128,
        remaining_before: u128,
        fill_amount: u128,
    ) -> Option<usize> {
        (0..self.secrets.len()).find(|&i| {
            is_valid_partial_fill(
                fill_amount,
                remaining_before,
                order_amount,
                self.parts_amount,
                i as u64 + 1,
            )
        })
    }
}
