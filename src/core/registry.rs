//! Star registry: the notary's core state machine. Mints uniquely
//! identified stars and tracks their ownership, sale listings and
//! settlement.
//!
//! # Concurrency
//! Three `RwLock`-guarded stores: stars, listings, events. Guards are
//! acquired in that fixed order; mutating operations validate while holding
//! every guard they need, so a failed call mutates nothing and readers
//! never observe a half-applied change.
//!
//! # Invariants
//! - Every listed id refers to an existing star.
//! - A listing never survives an ownership change: settlement, transfer and
//!   exchange all retire the affected listings.
//! - Every successful mutation appends exactly one event.
//!
//! # Determinism
//! `state_root` folds stars and listings in sorted id order; registries
//! with identical contents produce identical roots. No system time or
//! randomness anywhere.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::core::context::CallContext;
use crate::core::events::RegistryEvent;
use crate::core::ledger::{Address, Amount};
use crate::core::star::{Star, StarId};
use crate::error::NotaryError;

const STATE_DOMAIN: &str = "StarNotaryState:";

/// Errors produced by registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Star not found: {0}")]
    NotFound(StarId),

    #[error("Star not for sale: {0}")]
    NotForSale(StarId),

    #[error("Caller {caller} does not own star {id}")]
    NotOwner { id: StarId, caller: Address },

    #[error("Star already exists: {0}")]
    DuplicateStar(StarId),

    #[error("Insufficient payment: price {price}, offered {offered}")]
    InsufficientPayment { price: Amount, offered: Amount },

    #[error("Caller already owns star {0}")]
    SelfPurchase(StarId),
}

impl From<RegistryError> for NotaryError {
    fn from(e: RegistryError) -> Self {
        NotaryError::Registry(e.to_string())
    }
}

/// Settlement instruction produced by a validated purchase attempt. The
/// caller moves `price` from `buyer` to `seller` and then applies the
/// instruction via [`Registry::settle_purchase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: StarId,
    pub seller: Address,
    pub buyer: Address,
    pub price: Amount,
}

/// Thread-safe star registry with sale listings and an append-only event log.
#[derive(Debug)]
pub struct Registry {
    stars: RwLock<HashMap<StarId, Star>>,
    listings: RwLock<HashMap<StarId, Amount>>,
    events: RwLock<Vec<RegistryEvent>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            stars: RwLock::new(HashMap::new()),
            listings: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
        }
    }

    /// Mints a new star owned by the caller. Ids are caller-supplied; the
    /// registry never allocates them.
    pub fn create_star(
        &self,
        id: StarId,
        name: String,
        symbol: Option<String>,
        ctx: &CallContext,
    ) -> Result<(), RegistryError> {
        if id == 0 {
            return Err(RegistryError::InvalidInput(
                "star id must be positive".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(RegistryError::InvalidInput(
                "star name must not be empty".to_string(),
            ));
        }

        let mut stars = self.stars.write().unwrap();
        let mut events = self.events.write().unwrap();
        if stars.contains_key(&id) {
            return Err(RegistryError::DuplicateStar(id));
        }

        stars.insert(id, Star::new(id, name, symbol, ctx.caller.clone()));
        tracing::debug!(id, owner = %ctx.caller, "star minted");
        events.push(RegistryEvent::Minted {
            id,
            owner: ctx.caller.clone(),
        });
        Ok(())
    }

    /// Lists a star for sale at `price`. Only the current owner may list;
    /// listing an already-listed star overwrites the previous price.
    pub fn put_up_for_sale(
        &self,
        id: StarId,
        price: Amount,
        ctx: &CallContext,
    ) -> Result<(), RegistryError> {
        let stars = self.stars.read().unwrap();
        let mut listings = self.listings.write().unwrap();
        let mut events = self.events.write().unwrap();

        let star = stars.get(&id).ok_or(RegistryError::NotFound(id))?;
        if star.owner != ctx.caller {
            return Err(RegistryError::NotOwner {
                id,
                caller: ctx.caller.clone(),
            });
        }
        if price == 0 {
            return Err(RegistryError::InvalidInput(
                "sale price must be positive".to_string(),
            ));
        }

        listings.insert(id, price);
        tracing::debug!(id, %price, "star listed for sale");
        events.push(RegistryEvent::Listed { id, price });
        Ok(())
    }

    /// Validates a purchase attempt without mutating anything. On success
    /// the returned [`Purchase`] states exactly what the buyer owes;
    /// settlement is applied separately once payment has cleared.
    pub fn buy_star(&self, id: StarId, ctx: &CallContext) -> Result<Purchase, RegistryError> {
        let stars = self.stars.read().unwrap();
        let listings = self.listings.read().unwrap();

        let price = *listings.get(&id).ok_or(RegistryError::NotForSale(id))?;
        let star = stars.get(&id).ok_or(RegistryError::NotFound(id))?;
        if ctx.caller == star.owner {
            return Err(RegistryError::SelfPurchase(id));
        }
        if ctx.value < price {
            return Err(RegistryError::InsufficientPayment {
                price,
                offered: ctx.value,
            });
        }

        Ok(Purchase {
            id,
            seller: star.owner.clone(),
            buyer: ctx.caller.clone(),
            price,
        })
    }

    /// Applies a validated purchase: flips ownership to the buyer, retires
    /// the listing and records a `Purchased` event. Fails without mutating
    /// if the registry no longer matches the instruction (the star is gone,
    /// changed owner, or was relisted at a different price since
    /// validation).
    pub fn settle_purchase(&self, purchase: &Purchase) -> Result<(), RegistryError> {
        let mut stars = self.stars.write().unwrap();
        let mut listings = self.listings.write().unwrap();
        let mut events = self.events.write().unwrap();

        let star = stars
            .get_mut(&purchase.id)
            .ok_or(RegistryError::NotFound(purchase.id))?;
        if star.owner != purchase.seller {
            return Err(RegistryError::NotOwner {
                id: purchase.id,
                caller: purchase.seller.clone(),
            });
        }
        if listings.get(&purchase.id) != Some(&purchase.price) {
            return Err(RegistryError::NotForSale(purchase.id));
        }

        star.owner = purchase.buyer.clone();
        listings.remove(&purchase.id);
        tracing::debug!(id = purchase.id, buyer = %purchase.buyer, "purchase settled");
        events.push(RegistryEvent::Purchased {
            id: purchase.id,
            seller: purchase.seller.clone(),
            buyer: purchase.buyer.clone(),
            price: purchase.price,
        });
        Ok(())
    }

    /// Moves a star to `to` without payment. Only the current owner may
    /// transfer; any active listing for the star is retired.
    pub fn transfer_star(
        &self,
        id: StarId,
        to: Address,
        ctx: &CallContext,
    ) -> Result<(), RegistryError> {
        let mut stars = self.stars.write().unwrap();
        let mut listings = self.listings.write().unwrap();
        let mut events = self.events.write().unwrap();

        let star = stars.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        if star.owner != ctx.caller {
            return Err(RegistryError::NotOwner {
                id,
                caller: ctx.caller.clone(),
            });
        }
        if to.is_empty() {
            return Err(RegistryError::InvalidInput(
                "recipient must not be empty".to_string(),
            ));
        }

        let from = star.owner.clone();
        star.owner = to.clone();
        listings.remove(&id);
        tracing::debug!(id, %from, %to, "star transferred");
        events.push(RegistryEvent::Transferred { id, from, to });
        Ok(())
    }

    /// Swaps the owners of two stars. Either current owner may trigger the
    /// swap; the counterparty's consent is implicit. Both-or-neither: a
    /// failed exchange changes no ownership. Active listings on either star
    /// are retired.
    pub fn exchange_stars(
        &self,
        id_a: StarId,
        id_b: StarId,
        ctx: &CallContext,
    ) -> Result<(), RegistryError> {
        if id_a == id_b {
            return Err(RegistryError::InvalidInput(
                "cannot exchange a star with itself".to_string(),
            ));
        }

        let mut stars = self.stars.write().unwrap();
        let mut listings = self.listings.write().unwrap();
        let mut events = self.events.write().unwrap();

        let prev_owner_a = stars
            .get(&id_a)
            .ok_or(RegistryError::NotFound(id_a))?
            .owner
            .clone();
        let prev_owner_b = stars
            .get(&id_b)
            .ok_or(RegistryError::NotFound(id_b))?
            .owner
            .clone();
        if ctx.caller != prev_owner_a && ctx.caller != prev_owner_b {
            return Err(RegistryError::NotOwner {
                id: id_a,
                caller: ctx.caller.clone(),
            });
        }

        let star_a = stars.get_mut(&id_a).ok_or(RegistryError::NotFound(id_a))?;
        star_a.owner = prev_owner_b.clone();
        let star_b = stars.get_mut(&id_b).ok_or(RegistryError::NotFound(id_b))?;
        star_b.owner = prev_owner_a.clone();
        listings.remove(&id_a);
        listings.remove(&id_b);
        tracing::debug!(id_a, id_b, "stars exchanged");
        events.push(RegistryEvent::Exchanged {
            id_a,
            id_b,
            owner_a: prev_owner_b,
            owner_b: prev_owner_a,
        });
        Ok(())
    }

    /// Returns the name of the star with the given id.
    pub fn look_up(&self, id: StarId) -> Result<String, RegistryError> {
        let stars = self.stars.read().unwrap();
        let star = stars.get(&id).ok_or(RegistryError::NotFound(id))?;
        Ok(star.name.clone())
    }

    /// Returns the current owner of the star with the given id.
    pub fn owner_of(&self, id: StarId) -> Result<Address, RegistryError> {
        let stars = self.stars.read().unwrap();
        let star = stars.get(&id).ok_or(RegistryError::NotFound(id))?;
        Ok(star.owner.clone())
    }

    /// Returns the active sale price for the star, if listed.
    pub fn sale_price_of(&self, id: StarId) -> Option<Amount> {
        let listings = self.listings.read().unwrap();
        listings.get(&id).copied()
    }

    /// Returns the full star record, if minted.
    pub fn star_info(&self, id: StarId) -> Option<Star> {
        let stars = self.stars.read().unwrap();
        stars.get(&id).cloned()
    }

    /// Returns all stars sorted by id for deterministic ordering.
    pub fn get_all_stars(&self) -> Vec<Star> {
        let stars = self.stars.read().unwrap();
        let mut v: Vec<Star> = stars.values().cloned().collect();
        v.sort_by_key(|s| s.id);
        v
    }

    /// Returns the recorded events in append order.
    pub fn events(&self) -> Vec<RegistryEvent> {
        let events = self.events.read().unwrap();
        events.clone()
    }

    /// Returns the events that concern the given star, in append order.
    pub fn events_for(&self, id: StarId) -> Vec<RegistryEvent> {
        let events = self.events.read().unwrap();
        events.iter().filter(|e| e.involves(id)).cloned().collect()
    }

    /// Deterministic digest of the full registry contents. Stars and
    /// listings are folded in sorted id order, so registries with the same
    /// contents produce the same root regardless of insertion order.
    pub fn state_root(&self) -> String {
        let stars = self.stars.read().unwrap();
        let listings = self.listings.read().unwrap();

        let mut hasher = Sha256::new();
        hasher.update(STATE_DOMAIN.as_bytes());

        let mut star_ids: Vec<StarId> = stars.keys().copied().collect();
        star_ids.sort_unstable();
        for id in &star_ids {
            if let Some(star) = stars.get(id) {
                hasher.update(star.canonical_form());
                hasher.update(b"\n");
            }
        }

        let mut listed_ids: Vec<StarId> = listings.keys().copied().collect();
        listed_ids.sort_unstable();
        for id in &listed_ids {
            if let Some(price) = listings.get(id) {
                hasher.update(format!("listing:{}:{}\n", id, price));
            }
        }

        hex::encode(hasher.finalize())
    }

    /// Returns the number of minted stars.
    pub fn len(&self) -> usize {
        let stars = self.stars.read().unwrap();
        stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
