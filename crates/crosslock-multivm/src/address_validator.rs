//! Destination address validators, one per VM family.
//!
//! Validators decode the address and verify its length and checksum where
//! the format carries one; they cannot tell whether the account exists. A VM type without a registered validator is
//! rejected.

use std::collections::HashMap;
use std::fmt;

use crosslock_types::{CrosslockError, Result, VmType};

/// Format check for one VM family's address strings.
pub trait AddressValidator: Send + Sync {
    /// The VM family this validator handles.
    fn vm_type(&self) -> VmType;

    /// `Ok(())` if `address` is well-formed for this family.
    fn validate(&self, address: &str) -> Result<()>;
}

fn rejected(vm_type: VmType, reason: impl Into<String>) -> CrosslockError {
    CrosslockError::InvalidDestinationAddress {
        vm_type,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// EVM
// ---------------------------------------------------------------------------

/// `0x` followed by 40 hex digits (20 bytes).
#[derive(Debug, Clone, Copy, Default)]
pub struct EvmAddressValidator;

impl AddressValidator for EvmAddressValidator {
    fn vm_type(&self) -> VmType {
        VmType::EVM
    }

    fn validate(&self, address: &str) -> Result<()> {
        let Some(hex) = address.strip_prefix("0x") else {
            return Err(rejected(VmType::EVM, "missing 0x prefix"));
        };
        if hex.len() != 40 {
            return Err(rejected(
                VmType::EVM,
                format!("expected 40 hex digits, got {}", hex.len()),
            ));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(rejected(VmType::EVM, "non-hex character"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stellar
// ---------------------------------------------------------------------------

/// Version byte of an ed25519 account strkey (`G...`).
const STRKEY_ACCOUNT_VERSION: u8 = 6 << 3;
/// Version byte of a contract strkey (`C...`).
const STRKEY_CONTRACT_VERSION: u8 = 2 << 3;
/// Version byte + 32-byte key + CRC16.
const STRKEY_DECODED_LEN: usize = 35;

const STRKEY_CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_XMODEM);

/// Stellar strkey: unpadded base32 of `version || key || crc16`, accepting
/// account (`G`) and contract (`C`) keys only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StellarAddressValidator;

impl AddressValidator for StellarAddressValidator {
    fn vm_type(&self) -> VmType {
        VmType::STELLAR
    }

    fn validate(&self, address: &str) -> Result<()> {
        let raw = data_encoding::BASE32_NOPAD
            .decode(address.as_bytes())
            .map_err(|e| rejected(VmType::STELLAR, format!("invalid base32: {e}")))?;
        if raw.len() != STRKEY_DECODED_LEN {
            return Err(rejected(
                VmType::STELLAR,
                format!(
                    "expected {STRKEY_DECODED_LEN} decoded bytes, got {}",
                    raw.len()
                ),
            ));
        }

        let (body, checksum) = raw.split_at(STRKEY_DECODED_LEN - 2);
        if STRKEY_CRC.checksum(body).to_le_bytes() != checksum {
            return Err(rejected(VmType::STELLAR, "checksum mismatch"));
        }
        match body[0] {
            STRKEY_ACCOUNT_VERSION | STRKEY_CONTRACT_VERSION => Ok(()),
            other => Err(rejected(
                VmType::STELLAR,
                format!("unsupported version byte {other:#04x}"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Solana
// ---------------------------------------------------------------------------

const SOLANA_PUBKEY_LEN: usize = 32;

/// Base58 public key decoding to exactly 32 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolanaAddressValidator;

impl AddressValidator for SolanaAddressValidator {
    fn vm_type(&self) -> VmType {
        VmType::SOLANA
    }

    fn validate(&self, address: &str) -> Result<()> {
        let raw = bs58::decode(address)
            .into_vec()
            .map_err(|e| rejected(VmType::SOLANA, format!("invalid base58: {e}")))?;
        if raw.len() != SOLANA_PUBKEY_LEN {
            return Err(rejected(
                VmType::SOLANA,
                format!("expected {SOLANA_PUBKEY_LEN} decoded bytes, got {}", raw.len()),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validator set
// ---------------------------------------------------------------------------

/// Validators keyed by VM type.
pub struct ValidatorSet {
    validators: HashMap<VmType, Box<dyn AddressValidator>>,
}

impl ValidatorSet {
    /// A set with no validators; every address is rejected.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// EVM, Stellar and Solana validators.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut set = Self::empty();
        set.register(Box::new(EvmAddressValidator));
        set.register(Box::new(StellarAddressValidator));
        set.register(Box::new(SolanaAddressValidator));
        set
    }

    /// Add or replace the validator for its VM type.
    pub fn register(&mut self, validator: Box<dyn AddressValidator>) {
        self.validators.insert(validator.vm_type(), validator);
    }

    #[must_use]
    pub fn supports(&self, vm_type: VmType) -> bool {
        self.validators.contains_key(&vm_type)
    }

    /// Validate `address` for `vm_type`.
    ///
    /// # Errors
    /// - `UnsupportedVmType` if no validator is registered
    /// - `InvalidDestinationAddress` if the address is malformed
    pub fn validate(&self, vm_type: VmType, address: &str) -> Result<()> {
        self.validators
            .get(&vm_type)
            .ok_or(CrosslockError::UnsupportedVmType(vm_type))?
            .validate(address)
    }
}

impl Default for ValidatorSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ValidatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut vm_types: Vec<_> = self.validators.keys().copied().collect();
        vm_types.sort();
        f.debug_struct("ValidatorSet")
            .field("vm_types", &vm_types)
            .finish()
    }
}
