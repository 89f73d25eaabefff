use thiserror::Error;

use crate::{
    fees::FeeError,
    helpers::CallbackSignatureError,
    party::{MissingToken, PartyResolutionError},
    traits::{GatewayError, StoreError, TokenRegistryError},
    types::{AllocationState, OrderId, TransactionId},
};

/// The fault kinds the engine can report. Faults are values, never panics: every caller handles the
/// failure path explicitly. How a fault propagates depends on where it arose: a local trigger marks
/// the order failed and surfaces the fault to the merchant, while callback processing logs it and
/// still acknowledges the sender (authentication and resolution failures excepted).
#[derive(Debug, Clone, Error)]
pub enum EscrowError {
    #[error("Callback rejected. {0}")]
    Authentication(#[from] CallbackSignatureError),
    #[error("No order is linked to escrow transaction {0}")]
    UnknownTransaction(TransactionId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Transaction cannot be submitted. {0}")]
    MissingTokens(#[source] PartyResolutionError),
    #[error("Fee validation failed. {0}")]
    Fee(#[from] FeeError),
    #[error("Remote allocation is {observed}, which is outside the expected set when handling '{operation}'")]
    Inconsistency { operation: &'static str, observed: AllocationState },
    #[error("{0}")]
    Transport(#[from] GatewayError),
    #[error("Data integrity violation. {0}")]
    Integrity(String),
    #[error("{0}")]
    Store(StoreError),
    #[error("{0}")]
    Registry(#[from] TokenRegistryError),
}

impl EscrowError {
    /// Validation faults are caller mistakes: missing tokens, a non-positive base value, a negative
    /// payable. They must not be auto-retried.
    pub fn is_validation(&self) -> bool {
        matches!(self, EscrowError::MissingTokens(_) | EscrowError::Fee(_))
    }

    /// The roles still missing a token, when this fault is an unresolved-party fault.
    pub fn missing_tokens(&self) -> Option<&[MissingToken]> {
        match self {
            EscrowError::MissingTokens(PartyResolutionError::MissingTokens(missing)) => Some(missing),
            _ => None,
        }
    }
}

impl From<StoreError> for EscrowError {
    fn from(e: StoreError) -> Self {
        match e {
            // Two orders claiming one transaction is never resolved silently.
            StoreError::DuplicateTransactionId(_) => EscrowError::Integrity(e.to_string()),
            StoreError::OrderNotFound(id) => EscrowError::OrderNotFound(id),
            other => EscrowError::Store(other),
        }
    }
}

impl From<PartyResolutionError> for EscrowError {
    fn from(e: PartyResolutionError) -> Self {
        match e {
            PartyResolutionError::Registry(e) => EscrowError::Registry(e),
            missing => EscrowError::MissingTokens(missing),
        }
    }
}
