//! Payment ledger: single source of truth for the account balances used to
//! settle star sales. The notary consumes it through the [`ValueTransfer`]
//! trait so an alternative settlement backend can be injected; [`Ledger`] is
//! the in-memory implementation shipped with the crate.
//!
//! # Determinism
//! Same transfer sequence yields the same final balances. No randomness or
//! system time is used; iteration over accounts is sorted before exposure.
//!
//! # Invariants
//! - A transfer either fully applies (debit and credit together) or not at
//!   all; a failed transfer leaves every balance unchanged.
//! - Balances never go negative: the debit side is validated before any
//!   mutation.
//! - The sum of all balances is unchanged by `transfer`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::error::NotaryError;

/// Account identity (alias for String). Supplied by the invocation context;
/// the ledger does not create or validate identities.
pub type Address = String;

/// Monetary amount in the ledger's minimal units.
pub type Amount = u128;

/// Errors produced by ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    #[error("Ledger error: {0}")]
    Other(String),
}

impl From<LedgerError> for NotaryError {
    fn from(err: LedgerError) -> Self {
        NotaryError::Ledger(err.to_string())
    }
}

/// Atomic debit/credit capability consumed by the notary when settling a
/// sale. Implementations must be all-or-nothing: on error no balance may
/// have changed.
pub trait ValueTransfer {
    /// Moves `amount` from `from` to `to`.
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError>;
}

/// Immutable snapshot of ledger balances. Creation is O(1) via `Arc`; the
/// snapshot shares data with the live ledger until the ledger is modified
/// (copy-on-write).
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    balances: Arc<HashMap<Address, Amount>>,
}

impl LedgerSnapshot {
    /// Returns the balance for the address, or 0 if absent.
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Returns all balances, sorted by address for deterministic ordering.
    pub fn get_all_balances(&self) -> Vec<(Address, Amount)> {
        let mut v: Vec<_> = self
            .balances
            .iter()
            .map(|(a, b)| (a.clone(), *b))
            .collect();
        v.sort_by(|a, b| a.0.cmp(&b.0));
        v
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn account_count(&self) -> usize {
        self.balances.len()
    }
}

impl PartialEq for LedgerSnapshot {
    fn eq(&self, other: &Self) -> bool {
        *self.balances == *other.balances
    }
}

impl Eq for LedgerSnapshot {}

/// In-memory payment ledger: account balances keyed by address. Missing
/// accounts read as zero; crediting an unknown address creates it.
#[derive(Debug)]
pub struct Ledger {
    balances: RwLock<Arc<HashMap<Address, Amount>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Balance in minimal units. Returns 0 if the account is unknown.
    pub fn balance_of(&self, address: &Address) -> Amount {
        let balances = self.balances.read().unwrap();
        balances.get(address).copied().unwrap_or(0)
    }

    /// Sets a balance directly (for initialization/testing).
    pub fn set_balance(&self, address: &Address, amount: Amount) {
        let mut balances = self.balances.write().unwrap();
        Arc::make_mut(&mut balances).insert(address.clone(), amount);
    }

    /// Returns all balances, sorted by address for deterministic ordering.
    pub fn get_all_balances(&self) -> Vec<(Address, Amount)> {
        let balances = self.balances.read().unwrap();
        let mut v: Vec<_> = balances.iter().map(|(a, b)| (a.clone(), *b)).collect();
        v.sort_by(|a, b| a.0.cmp(&b.0));
        v
    }

    /// Sum of all balances. Unchanged by `transfer`.
    pub fn total_balance(&self) -> Amount {
        let balances = self.balances.read().unwrap();
        balances.values().sum()
    }

    /// Creates an immutable snapshot of the current balances. O(1): only the
    /// `Arc` is cloned; data is shared until the ledger is next modified.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let balances = self.balances.read().unwrap();
        LedgerSnapshot {
            balances: balances.clone(),
        }
    }

    /// Restores all balances from a snapshot. Atomic: the whole map is
    /// replaced under a single write lock. The snapshot is not modified.
    pub fn restore(&self, snapshot: &LedgerSnapshot) {
        let mut balances = self.balances.write().unwrap();
        *balances = snapshot.balances.clone();
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueTransfer for Ledger {
    /// Applies a transfer under a single write lock: validate the debit
    /// side, then move the amount. Order matters for `from == to`: the
    /// credit side is re-read after the debit so a self-transfer nets zero.
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let mut balances = self.balances.write().unwrap();
        let b = Arc::make_mut(&mut balances);

        let from_balance = b.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: from_balance,
            });
        }

        b.insert(from.clone(), from_balance - amount);
        let to_balance = b.get(to).copied().unwrap_or(0);
        b.insert(to.clone(), to_balance + amount);

        tracing::debug!(%from, %to, %amount, "ledger transfer applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ledger_zero_balances() {
        let ledger = Ledger::new();
        assert_eq!(ledger.balance_of(&"alice".to_string()), 0);
        assert_eq!(ledger.total_balance(), 0);
        assert!(ledger.snapshot().is_empty());
    }

    #[test]
    fn test_set_and_get_balance() {
        let ledger = Ledger::new();
        let addr = "alice".to_string();
        ledger.set_balance(&addr, 1000);
        assert_eq!(ledger.balance_of(&addr), 1000);
    }

    #[test]
    fn test_transfer_success() {
        let ledger = Ledger::new();
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        ledger.set_balance(&alice, 1000);

        let result = ledger.transfer(&alice, &bob, 400);
        assert!(result.is_ok());
        assert_eq!(ledger.balance_of(&alice), 600);
        assert_eq!(ledger.balance_of(&bob), 400);
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let ledger = Ledger::new();
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        ledger.set_balance(&alice, 50);

        let result = ledger.transfer(&alice, &bob, 100);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                required: 100,
                available: 50,
            })
        );

        // Nothing moved.
        assert_eq!(ledger.balance_of(&alice), 50);
        assert_eq!(ledger.balance_of(&bob), 0);
    }

    #[test]
    fn test_transfer_exact_balance() {
        let ledger = Ledger::new();
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        ledger.set_balance(&alice, 100);

        ledger.transfer(&alice, &bob, 100).unwrap();
        assert_eq!(ledger.balance_of(&alice), 0);
        assert_eq!(ledger.balance_of(&bob), 100);
    }

    #[test]
    fn test_transfer_to_self_nets_zero() {
        let ledger = Ledger::new();
        let alice = "alice".to_string();
        ledger.set_balance(&alice, 500);

        ledger.transfer(&alice, &alice, 200).unwrap();
        assert_eq!(ledger.balance_of(&alice), 500);
    }

    #[test]
    fn test_transfer_preserves_total() {
        let ledger = Ledger::new();
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        ledger.set_balance(&alice, 700);
        ledger.set_balance(&bob, 300);

        ledger.transfer(&alice, &bob, 250).unwrap();
        assert_eq!(ledger.total_balance(), 1000);
    }

    #[test]
    fn test_transfer_unknown_sender_fails() {
        let ledger = Ledger::new();
        let result = ledger.transfer(&"ghost".to_string(), &"bob".to_string(), 1);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds { required: 1, available: 0 })
        ));
    }

    #[test]
    fn test_snapshot_immutable_after_mutation() {
        let ledger = Ledger::new();
        let alice = "alice".to_string();
        ledger.set_balance(&alice, 1000);

        let snapshot = ledger.snapshot();
        ledger.set_balance(&alice, 2000);

        assert_eq!(snapshot.balance_of(&alice), 1000);
        assert_eq!(ledger.balance_of(&alice), 2000);
    }

    #[test]
    fn test_restore_rolls_back() {
        let ledger = Ledger::new();
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        ledger.set_balance(&alice, 1000);

        let snapshot = ledger.snapshot();
        ledger.transfer(&alice, &bob, 600).unwrap();
        assert_eq!(ledger.balance_of(&alice), 400);

        ledger.restore(&snapshot);
        assert_eq!(ledger.balance_of(&alice), 1000);
        assert_eq!(ledger.balance_of(&bob), 0);
        // Restore is repeatable and does not consume the snapshot.
        ledger.restore(&snapshot);
        assert_eq!(snapshot.balance_of(&alice), 1000);
    }

    #[test]
    fn test_get_all_balances_sorted() {
        let ledger = Ledger::new();
        ledger.set_balance(&"zeta".to_string(), 1);
        ledger.set_balance(&"alpha".to_string(), 2);
        ledger.set_balance(&"mid".to_string(), 3);

        let all = ledger.get_all_balances();
        assert_eq!(
            all,
            vec![
                ("alpha".to_string(), 2),
                ("mid".to_string(), 3),
                ("zeta".to_string(), 1),
            ]
        );
        // Same contents yield the same order.
        assert_eq!(all, ledger.get_all_balances());
    }

    #[test]
    fn test_error_message_shape() {
        let err = LedgerError::InsufficientFunds {
            required: 10,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Insufficient funds"));
        assert!(msg.contains("required 10"));
        assert!(msg.contains("available 3"));
    }
}
