pub mod error;
pub mod core;

pub use error::{NotaryError, Result};

// Core API exports
pub use core::Notary;
pub use core::context::CallContext;
pub use core::events::RegistryEvent;
pub use core::ledger::{Address, Amount, Ledger, LedgerError, LedgerSnapshot, ValueTransfer};
pub use core::registry::{Purchase, Registry, RegistryError};
pub use core::star::{Star, StarId};
