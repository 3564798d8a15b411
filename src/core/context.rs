//! Typed invocation context: who is calling and how much payment is
//! attached. Every registry operation receives one explicitly; there is no
//! ambient caller or implicit value threading.

use serde::{Deserialize, Serialize};

use crate::core::ledger::{Address, Amount};

/// Invocation metadata for a single registry call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Caller identity (opaque, comparable). Supplied by the invocation
    /// environment; the core never derives or validates it beyond equality.
    pub caller: Address,
    /// Payment attached to the call, in ledger minimal units. Only `buy`
    /// consumes it; every other operation ignores it.
    #[serde(default)]
    pub value: Amount,
}

impl CallContext {
    /// Context with no attached payment.
    pub fn new(caller: impl Into<Address>) -> Self {
        Self {
            caller: caller.into(),
            value: 0,
        }
    }

    /// Attaches a payment to the call.
    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}
