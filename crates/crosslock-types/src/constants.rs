//! System-wide constants for crosslock.

/// Default rescue delay for source escrows, in seconds (8 days).
pub const DEFAULT_RESCUE_DELAY_SRC: u32 = 691_200;

/// Default rescue delay for destination escrows, in seconds (8 days).
pub const DEFAULT_RESCUE_DELAY_DST: u32 = 691_200;

/// Default chain id of the source ledger.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Minimum number of parts for an order that allows multiple fills.
pub const MIN_PARTS_AMOUNT: u16 = 2;

/// Size of one packed word in the post-fill payload.
pub const WORD_LEN: usize = 32;

/// Length of the factory's fixed-layout post-fill payload (five words).
pub const SRC_PAYLOAD_LEN: usize = 5 * WORD_LEN;

/// Length of the fixed routing header: vm type (1) + chain id (8) + address length (2).
pub const ROUTING_HEADER_LEN: usize = 11;

/// Maximum accepted length of a destination address string.
pub const MAX_DESTINATION_ADDRESS_LEN: usize = 128;

/// Number of timelock stages packed into a [`crate::Timelocks`] word.
pub const TIMELOCK_STAGES: usize = 7;

/// Domain tag for order hashes.
pub const ORDER_HASH_DOMAIN: &[u8] = b"crosslock:order:v1:";

/// Domain tag for immutables hashes (the deployment salt).
pub const IMMUTABLES_HASH_DOMAIN: &[u8] = b"crosslock:immutables:v1:";

/// Domain tag for deterministic escrow addresses.
pub const ESCROW_ADDRESS_DOMAIN: &[u8] = b"crosslock:escrow-address:v1:";

/// Domain tag for labelled account ids.
pub const ACCOUNT_LABEL_DOMAIN: &[u8] = b"crosslock:account:v1:";
