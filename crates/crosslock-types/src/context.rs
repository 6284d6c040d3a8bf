//! Per-call execution context.

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Who is calling, how much native value they attached, and the ledger
/// timestamp the call executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: AccountId,
    /// Native currency attached to the call.
    pub value: u128,
    pub timestamp: u64,
}

impl CallContext {
    /// A call with no attached value.
    #[must_use]
    pub fn new(caller: AccountId, timestamp: u64) -> Self {
        Self {
            caller,
            value: 0,
            timestamp,
        }
    }

    /// Copy with `value` attached.
    #[must_use]
    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}
