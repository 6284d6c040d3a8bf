//! Routing prefix prepended to the factory payload by multi-VM orders.
//!
//! ```text
//!   offset  len            field
//!   ------  -------------  ---------------------------------
//!        0  1              vm type
//!        1  8              destination chain id (big-endian)
//!        9  2              address length (big-endian)
//!       11  address length destination address (UTF-8)
//!        …  rest           inner payload, handed on unchanged
//! ```

use serde::{Deserialize, Serialize};

use crosslock_types::{
    ChainId, CrosslockError, Result, VmType,
    constants::{MAX_DESTINATION_ADDRESS_LEN, ROUTING_HEADER_LEN},
};

/// Where the destination leg of a fill lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPrefix {
    pub vm_type: VmType,
    pub dst_chain_id: ChainId,
    pub dst_address: String,
}

impl RoutingPrefix {
    #[must_use]
    pub fn new(vm_type: VmType, dst_chain_id: ChainId, dst_address: impl Into<String>) -> Self {
        Self {
            vm_type,
            dst_chain_id,
            dst_address: dst_address.into(),
        }
    }

    /// Split `bytes` into the prefix and the inner payload that follows it.
    ///
    /// # Errors
    /// Returns `InvalidPayload` if the header is truncated, the address is
    /// empty, too long or not UTF-8.
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        if bytes.len() < ROUTING_HEADER_LEN {
            return Err(invalid(format!(
                "routing header needs {ROUTING_HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let vm_type = VmType(bytes[0]);
        let mut chain = [0u8; 8];
        chain.copy_from_slice(&bytes[1..9]);
        let address_len = usize::from(u16::from_be_bytes([bytes[9], bytes[10]]));

        if address_len == 0 || address_len > MAX_DESTINATION_ADDRESS_LEN {
            return Err(invalid(format!("address length {address_len} out of range")));
        }
        let end = ROUTING_HEADER_LEN + address_len;
        let Some(address_bytes) = bytes.get(ROUTING_HEADER_LEN..end) else {
            return Err(invalid(format!(
                "address needs {address_len} bytes, got {}",
                bytes.len() - ROUTING_HEADER_LEN
            )));
        };
        let dst_address = std::str::from_utf8(address_bytes)
            .map_err(|e| invalid(format!("address is not UTF-8: {e}")))?
            .to_owned();

        Ok((
            Self {
                vm_type,
                dst_chain_id: ChainId(u64::from_be_bytes(chain)),
                dst_address,
            },
            &bytes[end..],
        ))
    }

    /// Encode the prefix followed by `inner`.
    ///
    /// # Errors
    /// Returns `InvalidPayload` if the address is empty or too long.
    pub fn encode_with(&self, inner: &[u8]) -> Result<Vec<u8>> {
        let address = self.dst_address.as_bytes();
        if address.is_empty() || address.len() > MAX_DESTINATION_ADDRESS_LEN {
            return Err(invalid(format!(
                "address length {} out of range",
                address.len()
            )));
        }
        let address_len = u16::try_from(address.len())
            .map_err(|_| invalid("address length does not fit 16 bits"))?;

        let mut out = Vec::with_capacity(ROUTING_HEADER_LEN + address.len() + inner.len());
        out.push(self.vm_type.0);
        out.extend_from_slice(&self.dst_chain_id.0.to_be_bytes());
        out.extend_from_slice(&address_len.to_be_bytes());
        out.extend_from_slice(address);
        out.extend_from_slice(inner);
        Ok(out)
    }
}

fn invalid(reason: impl Into<String>) -> CrosslockError {
    CrosslockError::InvalidPayload {
        reason: reason.into(),
    }
}
