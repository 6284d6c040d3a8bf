//! Order types.
//!
//! An [`Order`] is signed by its maker and never changes afterwards; its
//! identity is the content hash [`OrderHash`]. The packed maker-traits word
//! is decoded once at the boundary into [`MakerTraits`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, AssetId, OrderHash, constants};

// ---------------------------------------------------------------------------
// MakerTraits
// ---------------------------------------------------------------------------

const NO_PARTIAL_FILLS_BIT: usize = 255;
const ALLOW_MULTIPLE_FILLS_BIT: usize = 254;
const PRE_INTERACTION_BIT: usize = 252;
const POST_INTERACTION_BIT: usize = 251;
const NEED_EPOCH_CHECK_BIT: usize = 250;
const HAS_EXTENSION_BIT: usize = 249;
const USE_PERMIT2_BIT: usize = 248;
const UNWRAP_NATIVE_BIT: usize = 247;

const ALLOWED_SENDER_BITS: usize = 80;
const EXPIRATION_OFFSET: usize = 80;
const NONCE_OR_EPOCH_OFFSET: usize = 120;
const SERIES_OFFSET: usize = 160;
const FORTY_BITS: usize = 40;

/// Maker-chosen order options, decoded from the 256-bit traits word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MakerTraits {
    /// The order must be filled in one go.
    pub no_partial_fills: bool,
    /// The order may be filled by several fills (one secret per part).
    pub allow_multiple_fills: bool,
    pub need_pre_interaction: bool,
    pub need_post_interaction: bool,
    pub need_epoch_check: bool,
    pub has_extension: bool,
    pub use_permit2: bool,
    pub unwrap_native: bool,
    /// Expiration timestamp (40 bits); zero means no expiration.
    pub expiration: u64,
    /// Nonce or epoch (40 bits).
    pub nonce_or_epoch: u64,
    /// Epoch series (40 bits).
    pub series: u64,
    /// Low 80 bits of the only sender allowed to fill; all-zero means anyone.
    pub allowed_sender: [u8; 10],
}

impl MakerTraits {
    /// Decode the packed big-endian traits word.
    #[must_use]
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut allowed_sender = [0u8; 10];
        allowed_sender.copy_from_slice(&word[32 - ALLOWED_SENDER_BITS / 8..]);
        Self {
            no_partial_fills: bit(word, NO_PARTIAL_FILLS_BIT),
            allow_multiple_fills: bit(word, ALLOW_MULTIPLE_FILLS_BIT),
            need_pre_interaction: bit(word, PRE_INTERACTION_BIT),
            need_post_interaction: bit(word, POST_INTERACTION_BIT),
            need_epoch_check: bit(word, NEED_EPOCH_CHECK_BIT),
            has_extension: bit(word, HAS_EXTENSION_BIT),
            use_permit2: bit(word, USE_PERMIT2_BIT),
            unwrap_native: bit(word, UNWRAP_NATIVE_BIT),
            expiration: read_bits(word, EXPIRATION_OFFSET, FORTY_BITS),
            nonce_or_epoch: read_bits(word, NONCE_OR_EPOCH_OFFSET, FORTY_BITS),
            series: read_bits(word, SERIES_OFFSET, FORTY_BITS),
            allowed_sender,
        }
    }

    /// Encode back into the packed word. Numeric fields are truncated to 40 bits.
    #[must_use]
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[32 - ALLOWED_SENDER_BITS / 8..].copy_from_slice(&self.allowed_sender);
        set_bit(&mut word, NO_PARTIAL_FILLS_BIT, self.no_partial_fills);
        set_bit(&mut word, ALLOW_MULTIPLE_FILLS_BIT, self.allow_multiple_fills);
        set_bit(&mut word, PRE_INTERACTION_BIT, self.need_pre_interaction);
        set_bit(&mut word, POST_INTERACTION_BIT, self.need_post_interaction);
        set_bit(&mut word, NEED_EPOCH_CHECK_BIT, self.need_epoch_check);
        set_bit(&mut word, HAS_EXTENSION_BIT, self.has_extension);
        set_bit(&mut word, USE_PERMIT2_BIT, self.use_permit2);
        set_bit(&mut word, UNWRAP_NATIVE_BIT, self.unwrap_native);
        write_bits(&mut word, EXPIRATION_OFFSET, FORTY_BITS, self.expiration);
        write_bits(&mut word, NONCE_OR_EPOCH_OFFSET, FORTY_BITS, self.nonce_or_epoch);
        write_bits(&mut word, SERIES_OFFSET, FORTY_BITS, self.series);
        word
    }

    /// Whether the order may be filled for less than its full amount.
    #[must_use]
    pub fn allow_partial_fills(&self) -> bool {
        !self.no_partial_fills
    }

    /// Whether the order has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration != 0 && self.expiration <= now
    }

    /// Whether `sender` may fill this order.
    #[must_use]
    pub fn is_allowed_sender(&self, sender: &AccountId) -> bool {
        self.allowed_sender == [0u8; 10] || sender.as_bytes()[22..] == self.allowed_sender
    }
}

fn bit(word: &[u8; 32], n: usize) -> bool {
    word[31 - n / 8] & (1 << (n % 8)) != 0
}

fn set_bit(word: &mut [u8; 32], n: usize, value: bool) {
    if value {
        word[31 - n / 8] |= 1 << (n % 8);
    } else {
        word[31 - n / 8] &= !(1 << (n % 8));
    }
}

fn read_bits(word: &[u8; 32], offset: usize, width: usize) -> u64 {
    (0..width)
        .filter(|i| bit(word, offset + i))
        .fold(0u64, |acc, i| acc | (1u64 << i))
}

fn write_bits(word: &mut [u8; 32], offset: usize, width: usize, value: u64) {
    for i in 0..width {
        set_bit(word, offset + i, value & (1u64 << i) != 0);
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A maker's signed intent to swap `making_amount` of `maker_asset` on the
/// source ledger for `taking_amount` of `taker_asset` on the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub salt: u128,
    pub maker: AccountId,
    /// Who receives the taker asset; `None` means the maker.
    pub receiver: Option<AccountId>,
    pub maker_asset: AssetId,
    pub taker_asset: AssetId,
    pub making_amount: u128,
    pub taking_amount: u128,
    pub maker_traits: MakerTraits,
}

impl Order {
    /// Content hash over the canonical encoding of every field.
    #[must_use]
    pub fn hash(&self) -> OrderHash {
        let mut hasher = Sha256::new();
        hasher.update(constants::ORDER_HASH_DOMAIN);
        hasher.update(self.salt.to_be_bytes());
        hasher.update(self.maker.as_bytes());
        hasher.update(self.receiver.unwrap_or(AccountId::ZERO).as_bytes());
        hasher.update(self.maker_asset.as_bytes());
        hasher.update(self.taker_asset.as_bytes());
        hasher.update(self.making_amount.to_be_bytes());
        hasher.update(self.taking_amount.to_be_bytes());
        hasher.update(self.maker_traits.to_word());
        OrderHash(hasher.finalize().into())
    }

    /// The account that receives the taker asset.
    #[must_use]
    pub fn effective_receiver(&self) -> AccountId {
        self.receiver.unwrap_or(self.maker)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// A single-fill order: 100 USDC on the source for 99 DAI on the destination.
    pub fn dummy(maker: AccountId) -> Self {
        Self {
            salt: 1,
            maker,
            receiver: None,
            maker_asset: AssetId::from_symbol("USDC"),
            taker_asset: AssetId::from_symbol("DAI"),
            making_amount: 100,
            taking_amount: 99,
            maker_traits: MakerTraits {
                need_post_interaction: true,
                has_extension: true,
                ..MakerTraits::default()
            },
        }
    }

    /// Same as [`Order::dummy`] but allowing multiple fills.
    pub fn dummy_multi_fill(maker: AccountId) -> Self {
        let mut order = Self::dummy(maker);
        order.maker_traits.allow_multiple_fills = true;
        order
    }
}
