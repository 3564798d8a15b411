//! Star record model: the collectible asset tracked by the registry.
//! `id`, `name` and `symbol` are fixed at mint; only `owner` ever changes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::ledger::Address;

/// Star identifier: caller-assigned positive integer key. The registry never
/// auto-generates ids, and `0` is rejected as invalid input.
pub type StarId = u64;

/// A registered star.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    pub id: StarId,
    pub name: String,
    /// Short text tag; optional, some callers mint without one.
    pub symbol: Option<String>,
    /// Identity of the current holder; mutable only via transfer, buy, or
    /// exchange.
    pub owner: Address,
}

impl Star {
    pub fn new(id: StarId, name: String, symbol: Option<String>, owner: Address) -> Self {
        Self {
            id,
            name,
            symbol,
            owner,
        }
    }

    /// Canonical single-line form folded into registry digests. A missing
    /// symbol renders as an empty field so the layout stays fixed.
    pub fn canonical_form(&self) -> String {
        format!(
            "star:{}:{}:{}:{}",
            self.id,
            self.name,
            self.symbol.as_deref().unwrap_or(""),
            self.owner
        )
    }
}

impl fmt::Display for Star {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(
                f,
                "star {} \"{}\" ({}) owned by {}",
                self.id, self.name, symbol, self.owner
            ),
            None => write!(
                f,
                "star {} \"{}\" owned by {}",
                self.id, self.name, self.owner
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_fields() {
        let star = Star::new(1, "Vega".to_string(), Some("STR".to_string()), "alice".to_string());
        assert_eq!(star.id, 1);
        assert_eq!(star.name, "Vega");
        assert_eq!(star.symbol.as_deref(), Some("STR"));
        assert_eq!(star.owner, "alice");
    }

    #[test]
    fn test_star_display_with_symbol() {
        let star = Star::new(7, "Polaris".to_string(), Some("PLR".to_string()), "bob".to_string());
        assert_eq!(star.to_string(), "star 7 \"Polaris\" (PLR) owned by bob");
    }

    #[test]
    fn test_star_display_without_symbol() {
        let star = Star::new(7, "Polaris".to_string(), None, "bob".to_string());
        assert_eq!(star.to_string(), "star 7 \"Polaris\" owned by bob");
    }

    #[test]
    fn test_canonical_form() {
        let star = Star::new(1, "Vega".to_string(), Some("VG".to_string()), "alice".to_string());
        assert_eq!(star.canonical_form(), "star:1:Vega:VG:alice");

        let bare = Star::new(2, "Sirius".to_string(), None, "bob".to_string());
        assert_eq!(bare.canonical_form(), "star:2:Sirius::bob");
    }

    #[test]
    fn test_star_equality() {
        let a = Star::new(1, "Vega".to_string(), None, "alice".to_string());
        let b = a.clone();
        assert_eq!(a, b);

        let mut c = a.clone();
        c.owner = "bob".to_string();
        assert_ne!(a, c);
    }
}
