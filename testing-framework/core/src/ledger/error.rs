use std::time::Duration;

use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::scenario::DynError;

/// Failures surfaced by a [`LedgerClient`](super::LedgerClient).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{operation}: network request failed")]
    Network {
        operation: &'static str,
        #[source]
        source: DynError,
    },
    #[error("{operation}: faucet rate limit reached: {message}")]
    RateLimited {
        operation: &'static str,
        message: String,
    },
    #[error("{operation}: rejected by the ledger: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },
    #[error("transaction {signature} not confirmed after {timeout:?}")]
    ConfirmationTimeout {
        signature: Signature,
        timeout: Duration,
    },
    #[error("transaction {signature} failed: {message}")]
    TransactionFailed {
        signature: Signature,
        message: String,
    },
}

impl LedgerError {
    pub fn rejected(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
