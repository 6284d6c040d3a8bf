//! Timelocks: a deployment timestamp plus seven relative stage offsets.
//!
//! ```text
//!  source leg:       deployed_at ─┬─ SrcWithdrawal ─ SrcPublicWithdrawal ─ SrcCancellation ─ SrcPublicCancellation
//!  destination leg:  deployed_at ─┴─ DstWithdrawal ─ DstPublicWithdrawal ─ DstCancellation
//! ```
//!
//! Wire form is a single 32-byte big-endian word: stage `i` occupies bits
//! `32*i .. 32*i + 32`, `deployed_at` the top 32 bits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CrosslockError, Result, constants::TIMELOCK_STAGES};

/// A timelock stage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Stage {
    SrcWithdrawal,
    SrcPublicWithdrawal,
    SrcCancellation,
    SrcPublicCancellation,
    DstWithdrawal,
    DstPublicWithdrawal,
    DstCancellation,
}

impl Stage {
    /// All stages in wire order.
    pub const ALL: [Self; TIMELOCK_STAGES] = [
        Self::SrcWithdrawal,
        Self::SrcPublicWithdrawal,
        Self::SrcCancellation,
        Self::SrcPublicCancellation,
        Self::DstWithdrawal,
        Self::DstPublicWithdrawal,
        Self::DstCancellation,
    ];

    /// Source-leg stages, in required increasing order.
    pub const SRC: [Self; 4] = [
        Self::SrcWithdrawal,
        Self::SrcPublicWithdrawal,
        Self::SrcCancellation,
        Self::SrcPublicCancellation,
    ];

    /// Destination-leg stages, in required increasing order.
    pub const DST: [Self; 3] = [
        Self::DstWithdrawal,
        Self::DstPublicWithdrawal,
        Self::DstCancellation,
    ];

    /// Position of this stage in the packed word.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SrcWithdrawal => write!(f, "SRC_WITHDRAWAL"),
            Self::SrcPublicWithdrawal => write!(f, "SRC_PUBLIC_WITHDRAWAL"),
            Self::SrcCancellation => write!(f, "SRC_CANCELLATION"),
            Self::SrcPublicCancellation => write!(f, "SRC_PUBLIC_CANCELLATION"),
            Self::DstWithdrawal => write!(f, "DST_WITHDRAWAL"),
            Self::DstPublicWithdrawal => write!(f, "DST_PUBLIC_WITHDRAWAL"),
            Self::DstCancellation => write!(f, "DST_CANCELLATION"),
        }
    }
}

/// Deadline schedule of one escrow.
///
/// `deployed_at` is zero until the factory stamps it at creation; offsets are
/// seconds relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timelocks {
    pub deployed_at: u64,
    offsets: [u32; TIMELOCK_STAGES],
}

impl Timelocks {
    /// Build from offsets in [`Stage::ALL`] order, not yet deployed.
    #[must_use]
    pub fn from_offsets(offsets: [u32; TIMELOCK_STAGES]) -> Self {
        Self {
            deployed_at: 0,
            offsets,
        }
    }

    /// Copy with the deployment timestamp stamped.
    #[must_use]
    pub fn with_deployed_at(mut self, timestamp: u64) -> Self {
        self.deployed_at = timestamp;
        self
    }

    /// Relative offset of `stage`.
    #[must_use]
    pub fn offset(&self, stage: Stage) -> u32 {
        self.offsets[stage.index()]
    }

    /// Absolute deadline of `stage`: `deployed_at + offset[stage]`,
    /// saturating at `u64::MAX`.
    #[must_use]
    pub fn get(&self, stage: Stage) -> u64 {
        self.deployed_at.saturating_add(u64::from(self.offset(stage)))
    }

    /// Timestamp after which stray funds can be rescued.
    #[must_use]
    pub fn rescue_start(&self, rescue_delay: u32) -> u64 {
        self.deployed_at.saturating_add(u64::from(rescue_delay))
    }

    /// Check that offsets strictly increase on each leg.
    pub fn validate(&self) -> Result<()> {
        for leg in [&Stage::SRC[..], &Stage::DST[..]] {
            for pair in leg.windows(2) {
                if self.offset(pair[1]) <= self.offset(pair[0]) {
                    return Err(CrosslockError::InvalidTimelocks { stage: pair[1] });
                }
            }
        }
        Ok(())
    }

    /// Pack into the 32-byte wire word.
    pub fn to_word(&self) -> Result<[u8; 32]> {
        let deployed_at = u32::try_from(self.deployed_at).map_err(|_| {
            CrosslockError::InvalidPayload {
                reason: format!("deployed_at {} does not fit 32 bits", self.deployed_at),
            }
        })?;
        let mut word = [0u8; 32];
        word[..4].copy_from_slice(&deployed_at.to_be_bytes());
        for stage in Stage::ALL {
            let end = 32 - 4 * stage.index();
            word[end - 4..end].copy_from_slice(&self.offset(stage).to_be_bytes());
        }
        Ok(word)
    }

    /// Unpack from the 32-byte wire word.
    #[must_use]
    pub fn from_word(word: &[u8; 32]) -> Self {
        let read = |end: usize| {
            u32::from_be_bytes([word[end - 4], word[end - 3], word[end - 2], word[end - 1]])
        };
        let mut offsets = [0u32; TIMELOCK_STAGES];
        for stage in Stage::ALL {
            offsets[stage.index()] = read(32 - 4 * stage.index());
        }
        Self {
            deployed_at: u64::from(read(4)),
            offsets,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Timelocks {
    /// Schedule used throughout the tests:
    /// src 10 / 120 / 121 / 122, dst 10 / 100 / 101.
    pub fn dummy() -> Self {
        Self::from_offsets([10, 120, 121, 122, 10, 100, 101])
    }
}
