//! Resolver registry: where each resolver receives funds on each VM family.

use std::collections::HashMap;

use crosslock_escrow::Ledger;
use crosslock_types::{AccountId, CallContext, CrosslockError, EscrowEvent, Result, VmType};

use crate::address_validator::ValidatorSet;

/// `(resolver, vm type) → destination address`.
#[derive(Debug, Default)]
pub struct ResolverRegistry {
    entries: HashMap<(AccountId, VmType), String>,
}

impl ResolverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the caller's addresses, one per VM type. Existing entries
    /// are overwritten.
    ///
    /// All entries are validated before any is stored.
    ///
    /// # Errors
    /// - `ArrayLengthMismatch` if the slices differ in length
    /// - `UnsupportedVmType` / `InvalidDestinationAddress` from the validators
    pub fn register_resolver(
        &mut self,
        ledger: &mut Ledger,
        ctx: &CallContext,
        validators: &ValidatorSet,
        vm_types: &[VmType],
        addresses: &[String],
    ) -> Result<()> {
        if vm_types.len() != addresses.len() {
            return Err(CrosslockError::ArrayLengthMismatch {
                vm_types: vm_types.len(),
                addresses: addresses.len(),
            });
        }
        for (vm_type, address) in vm_types.iter().zip(addresses) {
            validators.validate(*vm_type, address)?;
        }

        for (vm_type, address) in vm_types.iter().zip(addresses) {
            self.entries.insert((ctx.caller, *vm_type), address.clone());
            ledger.emit(
                ctx.timestamp,
                EscrowEvent::ResolverRegistered {
                    resolver: ctx.caller,
                    vm_type: *vm_type,
                    address: address.clone(),
                },
            );
            tracing::info!(resolver = %ctx.caller, %vm_type, %address, "Resolver registered");
        }
        Ok(())
    }

    /// Registered address of `resolver` on `vm_type`.
    #[must_use]
    pub fn address_of(&self, resolver: AccountId, vm_type: VmType) -> Option<&str> {
        self.entries.get(&(resolver, vm_type)).map(String::as_str)
    }

    #[must_use]
    pub fn is_registered(&self, resolver: AccountId, vm_type: VmType) -> bool {
        self.entries.contains_key(&(resolver, vm_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STELLAR_ADDR: &str = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
    const SOLANA_ADDR: &str = "7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV";

    fn resolver() -> AccountId {
        AccountId::from_label("resolver")
    }

    #[test]
    fn registers_caller_addresses() {
        let mut registry = ResolverRegistry::new();
        let mut ledger = Ledger::new();
        registry
            .register_resolver(
                &mut ledger,
                &CallContext::new(resolver(), 5),
                &ValidatorSet::with_defaults(),
                &[VmType::STELLAR, VmType::SOLANA],
                &[STELLAR_ADDR.into(), SOLANA_ADDR.into()],
            )
            .unwrap();

        assert_eq!(registry.address_of(resolver(), VmType::STELLAR), Some(STELLAR_ADDR));
        assert_eq!(registry.address_of(resolver(), VmType::SOLANA), Some(SOLANA_ADDR));
        assert!(!registry.is_registered(resolver(), VmType::EVM));
        assert!(!registry.is_registered(AccountId::from_label("other"), VmType::STELLAR));
        assert_eq!(ledger.events().len(), 2);
    }

    #[test]
    fn later_registration_overwrites() {
        let mut registry = ResolverRegistry::new();
        let mut ledger = Ledger::new();
        let validators = ValidatorSet::with_defaults();
        let ctx = CallContext::new(resolver(), 5);
        let replacement = "CAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCDSIG";

        registry
            .register_resolver(
                &mut ledger,
                &ctx,
                &validators,
                &[VmType::STELLAR],
                &[STELLAR_ADDR.into()],
            )
            .unwrap();
        registry
            .register_resolver(
                &mut ledger,
                &ctx,
                &validators,
                &[VmType::STELLAR],
                &[replacement.into()],
            )
            .unwrap();
        assert_eq!(registry.address_of(resolver(), VmType::STELLAR), Some(replacement));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = ResolverRegistry::new()
            .register_resolver(
                &mut Ledger::new(),
                &CallContext::new(resolver(), 5),
                &ValidatorSet::with_defaults(),
                &[VmType::STELLAR, VmType::SOLANA],
                &[STELLAR_ADDR.into()],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CrosslockError::ArrayLengthMismatch {
                vm_types: 2,
                addresses: 1
            }
        ));
    }

    #[test]
    fn one_bad_address_stores_nothing() {
        let mut registry = ResolverRegistry::new();
        let mut ledger = Ledger::new();
        let err = registry
            .register_resolver(
                &mut ledger,
                &CallContext::new(resolver(), 5),
                &ValidatorSet::with_defaults(),
                &[VmType::STELLAR, VmType::SOLANA],
                &[STELLAR_ADDR.into(), "not-base58-0OIl".into()],
            )
            .unwrap_err();
        assert!(matches!(err, CrosslockError::InvalidDestinationAddress { .. }));
        assert!(!registry.is_registered(resolver(), VmType::STELLAR));
        assert!(ledger.events().is_empty());
    }
}
