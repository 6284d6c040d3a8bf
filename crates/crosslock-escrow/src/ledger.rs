//! In-process ledger: balances per `(account, asset)` plus the append-only
//! event log.
//!
//! Value only moves through [`Ledger::transfer_all`], which validates every
//! leg of a batch against running balances before applying any of them. A
//! batch either commits completely or leaves the ledger untouched.
//!
//! Supply conservation holds at all times:
//! ```text
//! ∀ asset: Σ balances == Σ credited
//! ```

use std::collections::HashMap;

use crosslock_types::{
    AccountId, AssetId, CrosslockError, EscrowEvent, EventId, EventRecord, Result,
};

/// One movement of value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: AccountId,
    pub to: AccountId,
    pub asset: AssetId,
    pub amount: u128,
}

impl Transfer {
    #[must_use]
    pub fn new(from: AccountId, to: AccountId, asset: AssetId, amount: u128) -> Self {
        Self {
            from,
            to,
            asset,
            amount,
        }
    }

    /// The same movement in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.to, self.from, self.asset, self.amount)
    }
}

/// Balances and events of one ledger.
#[derive(Debug, Default)]
pub struct Ledger {
    balances: HashMap<(AccountId, AssetId), u128>,
    /// Total credited per asset since genesis.
    supply: HashMap<AssetId, u128>,
    events: Vec<EventRecord>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit new funds to an account (genesis / bridge-in).
    pub fn credit(&mut self, account: AccountId, asset: AssetId, amount: u128) -> Result<()> {
        let supply = self.supply.entry(asset).or_insert(0);
        let new_supply = supply.checked_add(amount).ok_or(CrosslockError::AmountOverflow)?;
        let balance = self.balances.entry((account, asset)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(CrosslockError::AmountOverflow)?;
        *supply = new_supply;
        Ok(())
    }

    /// Current balance of `account` in `asset`.
    #[must_use]
    pub fn balance_of(&self, account: AccountId, asset: AssetId) -> u128 {
        self.balances.get(&(account, asset)).copied().unwrap_or(0)
    }

    /// Apply a batch of transfers atomically.
    ///
    /// Legs are checked in order against running balances, so several legs
    /// drawing on the same account must be covered together.
    ///
    /// # Errors
    /// - `NativeTransferFailed` if a native leg is not covered
    /// - `InsufficientBalance` if a token leg is not covered
    /// - `AmountOverflow` if a credit would overflow
    pub fn transfer_all(&mut self, transfers: &[Transfer]) -> Result<()> {
        let mut staged: HashMap<(AccountId, AssetId), u128> = HashMap::new();

        for t in transfers {
            if t.amount == 0 {
                continue;
            }
            let from_key = (t.from, t.asset);
            let available = staged
                .get(&from_key)
                .copied()
                .unwrap_or_else(|| self.balance_of(t.from, t.asset));
            let Some(remaining) = available.checked_sub(t.amount) else {
                return Err(if t.asset.is_native() {
                    CrosslockError::NativeTransferFailed {
                        from: t.from,
                        needed: t.amount,
                        available,
                    }
                } else {
                    CrosslockError::InsufficientBalance {
                        account: t.from,
                        asset: t.asset,
                        needed: t.amount,
                        available,
                    }
                });
            };
            staged.insert(from_key, remaining);

            let to_key = (t.to, t.asset);
            let current = staged
                .get(&to_key)
                .copied()
                .unwrap_or_else(|| self.balance_of(t.to, t.asset));
            let credited = current
                .checked_add(t.amount)
                .ok_or(CrosslockError::AmountOverflow)?;
            staged.insert(to_key, credited);
        }

        for (key, balance) in staged {
            self.balances.insert(key, balance);
        }
        Ok(())
    }

    /// Verify that balances of `asset` still sum to its credited supply.
    pub fn verify_supply(&self, asset: AssetId) -> Result<()> {
        let expected = self.supply.get(&asset).copied().unwrap_or(0);
        let actual = self
            .balances
            .iter()
            .filter(|((_, a), _)| *a == asset)
            .try_fold(0u128, |acc, (_, b)| acc.checked_add(*b))
            .ok_or(CrosslockError::AmountOverflow)?;
        if actual != expected {
            return Err(CrosslockError::SupplyInvariantViolation {
                reason: format!("{asset}: balances sum to {actual}, credited {expected}"),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Event log
    // -----------------------------------------------------------------

    /// Append an event to the log.
    pub fn emit(&mut self, timestamp: u64, event: EscrowEvent) {
        tracing::debug!(
            sequence = self.events.len(),
            event = event.name(),
            "Event emitted"
        );
        self.events.push(EventRecord {
            id: EventId::new(),
            sequence: self.events.len() as u64,
            timestamp,
            event,
        });
    }

    /// Every event emitted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Events with `sequence >= cursor`.
    #[must_use]
    pub fn events_since(&self, cursor: u64) -> &[EventRecord] {
        let start = usize::try_from(cursor).map_or(self.events.len(), |c| c.min(self.events.len()));
        &self.events[start..]
    }

    /// Export the log as JSON lines for off-chain consumers.
    pub fn export_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for record in &self.events {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }
}
