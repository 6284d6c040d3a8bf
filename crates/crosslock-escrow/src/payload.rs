//! The factory's fixed-layout post-fill payload.
//!
//! ```text
//!   offset  len  field
//!   ------  ---  -----------------------------------------------
//!        0   32  hashlock info (single hashlock or parts | root)
//!       32   32  destination chain id (big-endian, must fit u64)
//!       64   32  destination asset id
//!       96   32  safety deposits: src (high 128) | dst (low 128)
//!      128   32  timelocks word
//! ```

use crosslock_types::{
    AssetId, ChainId, CrosslockError, HashlockInfo, Result, Timelocks, constants::SRC_PAYLOAD_LEN,
    constants::WORD_LEN,
};

/// Decoded post-fill payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrcPayload {
    pub hashlock_info: HashlockInfo,
    pub dst_chain_id: ChainId,
    pub dst_asset: AssetId,
    pub src_safety_deposit: u128,
    pub dst_safety_deposit: u128,
    pub timelocks: Timelocks,
}

impl SrcPayload {
    /// Decode exactly [`SRC_PAYLOAD_LEN`] bytes.
    ///
    /// # Errors
    /// Returns `InvalidPayload` on a length mismatch or a chain id wider
    /// than 64 bits.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SRC_PAYLOAD_LEN {
            return Err(CrosslockError::InvalidPayload {
                reason: format!("expected {SRC_PAYLOAD_LEN} bytes, got {}", bytes.len()),
            });
        }
        let word = |i: usize| -> [u8; 32] {
            let mut w = [0u8; WORD_LEN];
            w.copy_from_slice(&bytes[i * WORD_LEN..(i + 1) * WORD_LEN]);
            w
        };

        let chain_word = word(1);
        if chain_word[..24].iter().any(|b| *b != 0) {
            return Err(CrosslockError::InvalidPayload {
                reason: "destination chain id does not fit 64 bits".into(),
            });
        }
        let mut chain = [0u8; 8];
        chain.copy_from_slice(&chain_word[24..]);

        let deposits = word(3);
        let mut src = [0u8; 16];
        let mut dst = [0u8; 16];
        src.copy_from_slice(&deposits[..16]);
        dst.copy_from_slice(&deposits[16..]);

        Ok(Self {
            hashlock_info: HashlockInfo(word(0)),
            dst_chain_id: ChainId(u64::from_be_bytes(chain)),
            dst_asset: AssetId(word(2)),
            src_safety_deposit: u128::from_be_bytes(src),
            dst_safety_deposit: u128::from_be_bytes(dst),
            timelocks: Timelocks::from_word(&word(4)),
        })
    }

    /// Encode into the fixed layout.
    ///
    /// # Errors
    /// Returns `InvalidPayload` if the timelocks cannot be packed.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(SRC_PAYLOAD_LEN);
        out.extend_from_slice(&self.hashlock_info.0);
        out.extend_from_slice(&[0u8; 24]);
        out.extend_from_slice(&self.dst_chain_id.0.to_be_bytes());
        out.extend_from_slice(self.dst_asset.as_bytes());
        out.extend_from_slice(&self.src_safety_deposit.to_be_bytes());
        out.extend_from_slice(&self.dst_safety_deposit.to_be_bytes());
        out.extend_from_slice(&self.timelocks.to_word()?);
        Ok(out)
    }
}
