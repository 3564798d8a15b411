//! Registry event log entries. Every successful mutation appends exactly one
//! event, so the log is a complete, ordered history of ownership and listing
//! changes. Events are value objects; digests are computed on demand.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::core::ledger::{Address, Amount};
use crate::core::star::StarId;
use crate::error::{NotaryError, Result};

const DOMAIN_SEPARATOR: &str = "StarNotaryEvent:";

/// One recorded registry mutation.
///
/// Externally tagged in JSON (`{"listed":{"id":1,"price":100}}`): serde's
/// internally tagged form buffers fields through an intermediate tree that
/// cannot carry the `u128` amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryEvent {
    Minted {
        id: StarId,
        owner: Address,
    },
    Listed {
        id: StarId,
        price: Amount,
    },
    Purchased {
        id: StarId,
        seller: Address,
        buyer: Address,
        price: Amount,
    },
    Transferred {
        id: StarId,
        from: Address,
        to: Address,
    },
    /// Owners after the swap: `owner_a` now holds `id_a`.
    Exchanged {
        id_a: StarId,
        id_b: StarId,
        owner_a: Address,
        owner_b: Address,
    },
}

impl RegistryEvent {
    /// Whether the event concerns the given star (either side of an
    /// exchange counts).
    pub fn involves(&self, id: StarId) -> bool {
        match self {
            RegistryEvent::Minted { id: subject, .. }
            | RegistryEvent::Listed { id: subject, .. }
            | RegistryEvent::Purchased { id: subject, .. }
            | RegistryEvent::Transferred { id: subject, .. } => *subject == id,
            RegistryEvent::Exchanged { id_a, id_b, .. } => *id_a == id || *id_b == id,
        }
    }

    /// Deterministic digest: SHA-256 over a domain separator and the
    /// canonical JSON form. Same event data yields the same digest; no
    /// randomness or system time.
    pub fn digest(&self) -> Result<String> {
        let json = serde_json::to_string(self)
            .map_err(|e| NotaryError::Validation(format!("Failed to serialize event: {}", e)))?;

        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_SEPARATOR.as_bytes());
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEvent::Minted { id, owner } => {
                write!(f, "minted star {} to {}", id, owner)
            }
            RegistryEvent::Listed { id, price } => {
                write!(f, "listed star {} for {}", id, price)
            }
            RegistryEvent::Purchased {
                id,
                seller,
                buyer,
                price,
            } => write!(f, "star {} sold by {} to {} for {}", id, seller, buyer, price),
            RegistryEvent::Transferred { id, from, to } => {
                write!(f, "transferred star {} from {} to {}", id, from, to)
            }
            RegistryEvent::Exchanged {
                id_a,
                id_b,
                owner_a,
                owner_b,
            } => write!(
                f,
                "exchanged stars {} and {}; {} now owns {}, {} now owns {}",
                id_a, id_b, owner_a, id_a, owner_b, id_b
            ),
        }
    }
}
