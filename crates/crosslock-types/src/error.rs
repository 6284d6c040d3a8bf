//! Error types for crosslock.
//!
//! All errors use the `CL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Secret / hashlock errors
//! - 2xx: Timelock errors
//! - 3xx: Escrow and funding errors
//! - 4xx: Multi-VM routing errors
//! - 5xx: Off-chain collaborator errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, AssetId, ChainId, CrossVmStatus, EscrowKind, OrderHash, Stage, VmType};

/// Central error enum for all crosslock operations.
#[derive(Debug, Error)]
pub enum CrosslockError {
    // =================================================================
    // Secret / Hashlock Errors (1xx)
    // =================================================================
    /// The presented secret does not hash to the escrow's hashlock.
    #[error("CL_ERR_100: Invalid secret")]
    InvalidSecret,

    /// A multi-fill order committed to fewer than two secrets.
    #[error("CL_ERR_101: Invalid secrets amount: {parts_amount} (need at least 2)")]
    InvalidSecretsAmount { parts_amount: u16 },

    /// The validated secret index does not authorize this fill.
    #[error("CL_ERR_102: Invalid partial fill for order {order_hash}")]
    InvalidPartialFill { order_hash: OrderHash },

    /// The Merkle proof does not resolve to the committed root.
    #[error("CL_ERR_103: Invalid secret proof for order {order_hash}")]
    InvalidProof { order_hash: OrderHash },

    // =================================================================
    // Timelock Errors (2xx)
    // =================================================================
    /// The call was made outside the permitted time window.
    #[error("CL_ERR_200: Invalid time: now {now}, window [{lower}, {upper})")]
    InvalidTime { now: u64, lower: u64, upper: u64 },

    /// The destination cancellation would start after the source cancellation.
    #[error("CL_ERR_201: Invalid creation time: dst cancellation {dst_cancellation} > src cancellation {src_cancellation}")]
    InvalidCreationTime {
        dst_cancellation: u64,
        src_cancellation: u64,
    },

    /// Timelock offsets are not monotonically increasing.
    #[error("CL_ERR_202: Invalid timelocks: {stage} offset out of order")]
    InvalidTimelocks { stage: Stage },

    // =================================================================
    // Escrow / Funding Errors (3xx)
    // =================================================================
    /// The caller is not permitted to perform this operation.
    #[error("CL_ERR_300: Invalid caller: {caller}")]
    InvalidCaller { caller: AccountId },

    /// The presented immutables do not match the escrow's deployment hash.
    #[error("CL_ERR_301: Invalid immutables for escrow {escrow}")]
    InvalidImmutables { escrow: AccountId },

    /// No escrow is deployed at the given address.
    #[error("CL_ERR_302: Escrow not found: {0}")]
    EscrowNotFound(AccountId),

    /// An escrow already exists at the deterministic address.
    #[error("CL_ERR_303: Escrow already deployed: {0}")]
    EscrowAlreadyDeployed(AccountId),

    /// The escrow already reached a terminal state.
    #[error("CL_ERR_304: Escrow {0} is not active")]
    EscrowNotActive(AccountId),

    /// The escrow was not pre-funded (or the attached value is wrong).
    #[error("CL_ERR_305: Insufficient escrow balance: need {needed}, have {available}")]
    InsufficientEscrowBalance { needed: u128, available: u128 },

    /// A native-currency transfer could not be performed.
    #[error("CL_ERR_306: Native transfer failed from {from}: need {needed}, have {available}")]
    NativeTransferFailed {
        from: AccountId,
        needed: u128,
        available: u128,
    },

    /// A token transfer could not be performed.
    #[error("CL_ERR_307: Insufficient {asset} balance for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        needed: u128,
        available: u128,
    },

    /// An amount computation overflowed.
    #[error("CL_ERR_308: Amount overflow")]
    AmountOverflow,

    /// The operation does not exist on this leg of the swap.
    #[error("CL_ERR_309: {operation} is not available on {kind} escrows")]
    NotSupportedOnLeg {
        operation: &'static str,
        kind: EscrowKind,
    },

    /// Ledger balances no longer add up to the minted supply.
    #[error("CL_ERR_310: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// The destination factory runs on a chain the resolver does not target.
    #[error("CL_ERR_311: Chain mismatch: expected {expected}, factory runs on {actual}")]
    ChainMismatch { expected: ChainId, actual: ChainId },

    // =================================================================
    // Multi-VM Errors (4xx)
    // =================================================================
    /// `vm_types` and `addresses` have different lengths.
    #[error("CL_ERR_400: Array length mismatch: {vm_types} vm types, {addresses} addresses")]
    ArrayLengthMismatch { vm_types: usize, addresses: usize },

    /// No address validator is registered for this VM type.
    #[error("CL_ERR_401: Unsupported VM type: {0}")]
    UnsupportedVmType(VmType),

    /// The destination address is malformed for its VM family.
    #[error("CL_ERR_402: Invalid destination address for {vm_type}: {reason}")]
    InvalidDestinationAddress { vm_type: VmType, reason: String },

    /// The resolver has no registered address for the VM type.
    #[error("CL_ERR_403: Resolver {resolver} not registered for {vm_type}")]
    ResolverNotRegistered { resolver: AccountId, vm_type: VmType },

    /// A repeat fill of an order carried a different cross-VM route.
    #[error("CL_ERR_404: Route mismatch for order {0}")]
    RouteMismatch(OrderHash),

    // =================================================================
    // Off-chain Collaborator Errors (5xx)
    // =================================================================
    /// No secret is stored for the order.
    #[error("CL_ERR_500: Secret not found for order {0}")]
    SecretNotFound(OrderHash),

    /// A cross-VM order status transition is not allowed.
    #[error("CL_ERR_501: Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: CrossVmStatus, to: CrossVmStatus },

    /// The order is unknown to the collaborator.
    #[error("CL_ERR_502: Order not found: {0}")]
    OrderNotFound(OrderHash),

    /// The fill violates the order's own constraints.
    #[error("CL_ERR_503: Invalid fill: {reason}")]
    InvalidFill { reason: String },

    /// A secret is already active for the order; replace or remove it first.
    #[error("CL_ERR_504: Secret already stored for order {0}")]
    SecretAlreadyStored(OrderHash),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// A fixed-layout payload could not be decoded.
    #[error("CL_ERR_900: Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    /// Serialization / deserialization error.
    #[error("CL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config document, missing fields, etc.).
    #[error("CL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Unrecoverable internal error.
    #[error("CL_ERR_903: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CrosslockError>;

impl From<serde_json::Error> for CrosslockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = CrosslockError::EscrowNotFound(AccountId::ZERO);
        let msg = format!("{err}");
        assert!(msg.starts_with("CL_ERR_302"), "Got: {msg}");
    }

    #[test]
    fn invalid_time_display() {
        let err = CrosslockError::InvalidTime {
            now: 5,
            lower: 10,
            upper: 20,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CL_ERR_200"));
        assert!(msg.contains("[10, 20)"));
    }

    #[test]
    fn status_transition_display() {
        let err = CrosslockError::InvalidStatusTransition {
            from: CrossVmStatus::Completed,
            to: CrossVmStatus::Pending,
        };
        let msg = format!("{err}");
        assert!(msg.contains("COMPLETED -> PENDING"), "Got: {msg}");
    }

    #[test]
    fn all_errors_have_cl_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(CrosslockError::InvalidSecret),
            Box::new(CrosslockError::InvalidSecretsAmount { parts_amount: 1 }),
            Box::new(CrosslockError::AmountOverflow),
            Box::new(CrosslockError::ChainMismatch {
                expected: ChainId(148),
                actual: ChainId(1),
            }),
            Box::new(CrosslockError::UnsupportedVmType(VmType(9))),
            Box::new(CrosslockError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("CL_ERR_"),
                "Error missing CL_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn serde_json_error_maps_to_serialization() {
        let err: CrosslockError = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert!(matches!(err, CrosslockError::Serialization(_)));
    }
}
