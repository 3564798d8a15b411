// Core module for the star notary
// Combines the star registry with a payment ledger behind one facade
//
// DETERMINISM GUARANTEES:
// =======================
// This module guarantees deterministic execution:
// 1. Same operation order → same final registry state and event log
// 2. No randomness: all operations are deterministic
// 3. No system time: no timestamps or time-dependent logic
// 4. Deterministic digests: stores are iterated in sorted order before hashing
//
// INVARIANTS:
// - A failed operation leaves the registry and the ledger unchanged
// - A purchase moves exactly the listed price, never the attached excess
// - Ownership and listing changes are applied atomically
// - Facade mutations serialize on a write gate: a purchase commits its
//   payment and its settlement as one unit

pub mod context;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod star;

use std::sync::Mutex;

use crate::core::context::CallContext;
use crate::core::ledger::{Address, Amount, Ledger, ValueTransfer};
use crate::core::registry::{Purchase, Registry, RegistryError};
use crate::core::star::StarId;
use crate::error::{NotaryError, Result};

/// Star notary facade
/// This is the main entry point for notary operations
/// Combines the Registry and a ValueTransfer ledger into a single interface
///
/// DETERMINISM: applying the same sequence of operations in the same order
/// always produces the same registry state, event log and balances.
#[derive(Debug)]
pub struct Notary<L: ValueTransfer = Ledger> {
    /// Star and listing stores with the event log
    /// INVARIANT: mutations are validated under exclusive locks
    registry: Registry,

    /// Payment ledger used only by `buy_star`
    /// INVARIANT: transfers are atomic (validate debit, then apply)
    ledger: L,

    /// Serializes the mutating facade operations
    /// INVARIANT: held across the whole of `buy_star` (validate, pay,
    /// settle), so no other facade mutation can interleave mid-purchase
    write_gate: Mutex<()>,
}

impl Notary<Ledger> {
    /// Creates a new notary with an empty registry and an empty in-memory ledger
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            ledger: Ledger::new(),
            write_gate: Mutex::new(()),
        }
    }
}

impl<L: ValueTransfer> Notary<L> {
    /// Creates a notary over a caller-supplied ledger implementation
    pub fn with_ledger(ledger: L) -> Self {
        Self {
            registry: Registry::new(),
            ledger,
            write_gate: Mutex::new(()),
        }
    }

    /// Mints a new star owned by the caller
    pub fn create_star(
        &self,
        id: StarId,
        name: String,
        symbol: Option<String>,
        ctx: &CallContext,
    ) -> Result<()> {
        let _gate = self.write_gate.lock().unwrap();
        self.registry.create_star(id, name, symbol, ctx)?;
        Ok(())
    }

    /// Lists a star for sale at the given price
    pub fn put_up_for_sale(&self, id: StarId, price: Amount, ctx: &CallContext) -> Result<()> {
        let _gate = self.write_gate.lock().unwrap();
        self.registry.put_up_for_sale(id, price, ctx)?;
        Ok(())
    }

    /// Buys a listed star
    ///
    /// Flow:
    /// 1. Validates the purchase against the registry (listing, owner, payment)
    /// 2. Moves exactly the listed price from buyer to seller
    /// 3. Settles the purchase: ownership flips, the listing is retired,
    ///    a Purchased event is recorded
    ///
    /// The whole flow runs under the write gate, so no other facade
    /// operation can mutate the registry between validation, payment and
    /// settlement. If payment fails, settlement never runs and the registry
    /// is untouched. If settlement is rejected because the registry was
    /// mutated directly (bypassing the facade), the payment is refunded
    /// before the error is returned.
    ///
    /// Returns the settled purchase receipt on success
    pub fn buy_star(&self, id: StarId, ctx: &CallContext) -> Result<Purchase> {
        let _gate = self.write_gate.lock().unwrap();
        let purchase = self.registry.buy_star(id, ctx)?;

        self.ledger
            .transfer(&purchase.buyer, &purchase.seller, purchase.price)?;

        if let Err(e) = self.registry.settle_purchase(&purchase) {
            return Err(self.refund_payment(&purchase, e));
        }

        Ok(purchase)
    }

    /// Returns the buyer's payment after a failed settlement. If the refund
    /// itself fails, the buyer's money is stranded with the seller and the
    /// returned error reports both failures.
    fn refund_payment(&self, purchase: &Purchase, settle_err: RegistryError) -> NotaryError {
        match self
            .ledger
            .transfer(&purchase.seller, &purchase.buyer, purchase.price)
        {
            Ok(()) => settle_err.into(),
            Err(refund_err) => {
                tracing::error!(
                    id = purchase.id,
                    buyer = %purchase.buyer,
                    seller = %purchase.seller,
                    price = %purchase.price,
                    %refund_err,
                    "settlement failed and the payment could not be refunded"
                );
                NotaryError::Registry(format!(
                    "{}; payment of {} from {} is stranded with {}: {}",
                    settle_err, purchase.price, purchase.buyer, purchase.seller, refund_err
                ))
            }
        }
    }

    /// Moves a star to a new owner without payment
    pub fn transfer_star(&self, id: StarId, to: Address, ctx: &CallContext) -> Result<()> {
        let _gate = self.write_gate.lock().unwrap();
        self.registry.transfer_star(id, to, ctx)?;
        Ok(())
    }

    /// Swaps the owners of two stars; either owner may trigger the swap
    pub fn exchange_stars(&self, id_a: StarId, id_b: StarId, ctx: &CallContext) -> Result<()> {
        let _gate = self.write_gate.lock().unwrap();
        self.registry.exchange_stars(id_a, id_b, ctx)?;
        Ok(())
    }

    /// Returns the name of the star with the given id
    pub fn look_up(&self, id: StarId) -> Result<String> {
        let name = self.registry.look_up(id)?;
        Ok(name)
    }

    /// Gets the registry (for direct access if needed)
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Gets the ledger (for direct access if needed)
    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}

impl Default for Notary<Ledger> {
    fn default() -> Self {
        Self::new()
    }
}
