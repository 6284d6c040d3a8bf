//! Configuration types for the escrow factory and the resolver.

use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, ChainId, CrosslockError, Result, VmType, constants};

/// Configuration of one escrow factory deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// The factory's own identity; mixed into every escrow address.
    pub factory_id: AccountId,
    /// Chain id of the ledger the factory runs on.
    pub chain_id: ChainId,
    /// VM family of the ledger the factory runs on.
    pub source_vm: VmType,
    /// Holding any amount of this asset grants access to public
    /// withdraw / cancel.
    pub access_token: AssetId,
    /// Delay after deployment before a source escrow's funds can be rescued.
    pub rescue_delay_src: u32,
    /// Delay after deployment before a destination escrow's funds can be rescued.
    pub rescue_delay_dst: u32,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            factory_id: AccountId::from_label("crosslock:factory"),
            chain_id: ChainId(constants::DEFAULT_CHAIN_ID),
            source_vm: VmType::EVM,
            access_token: AssetId::from_symbol("ACCESS"),
            rescue_delay_src: constants::DEFAULT_RESCUE_DELAY_SRC,
            rescue_delay_dst: constants::DEFAULT_RESCUE_DELAY_DST,
        }
    }
}

impl FactoryConfig {
    /// Parse from a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CrosslockError::Configuration(e.to_string()))
    }
}

/// Configuration of a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// The resolver's on-ledger identity (the taker of its fills).
    pub owner: AccountId,
    /// Chain the resolver locks destination legs on; routes default to it
    /// and destination factories must run on it.
    pub dst_chain_id: ChainId,
}

impl ResolverConfig {
    /// Parse from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CrosslockError::Configuration(e.to_string()))
    }
}
