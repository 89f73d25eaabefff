use thiserror::Error;

use epg_common::Cents;

use crate::types::{
    BillingIdentity,
    FeeAllocation,
    NewAllocation,
    Party,
    TokenId,
    TokenSummary,
    TransactionId,
    TransactionMeta,
    TransactionSnapshot,
};

/// The escrow service as the engine sees it. Implementations carry the bearer credential and the
/// 45-second deadline; the engine performs no retries, so every error here surfaces as a transport
/// fault to the caller of the current operation.
#[allow(async_fn_in_trait)]
pub trait EscrowGateway {
    /// Create a remote transaction. All-or-nothing: the engine guarantees every party carries a
    /// resolved, non-empty token before this is called.
    fn create_transaction(
        &self,
        meta: &TransactionMeta,
        allocations: &[NewAllocation],
        parties: &[Party],
    ) -> impl std::future::Future<Output = Result<TransactionId, GatewayError>> + Send;

    /// Current remote view of the transaction, including each allocation's state.
    fn get_transaction(&self, id: &TransactionId) -> impl std::future::Future<Output = Result<TransactionSnapshot, GatewayError>> + Send;

    fn allocation_start_delivery(&self, allocation_id: &str) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    fn allocation_complete_delivery(&self, allocation_id: &str) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Request cancellation. Whether the transaction *may* be cancelled in its current state is the
    /// remote side's decision; an illegal cancellation comes back as an error.
    fn cancel_transaction(&self, id: &TransactionId, reason: &str) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Issue a token for a party that has never transacted before (guest buyers).
    fn create_token(&self, identity: &BillingIdentity) -> impl std::future::Future<Output = Result<TokenId, GatewayError>> + Send;

    fn get_token(&self, id: &TokenId) -> impl std::future::Future<Output = Result<TokenSummary, GatewayError>> + Send;

    /// Quote the escrow processing fee for a base value under the given fee-allocation policy.
    fn get_calculation(
        &self,
        base_value: Cents,
        fee_allocation: FeeAllocation,
        industry: &str,
    ) -> impl std::future::Future<Output = Result<Cents, GatewayError>> + Send;

    /// The merchant's own profile token, used as the SELLER party on every transaction.
    fn profile_token(&self) -> impl std::future::Future<Output = Result<TokenId, GatewayError>> + Send;

    /// Where a buyer is sent to deposit funds.
    fn deposit_link(&self, id: &TransactionId) -> String;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Escrow service call failed. {0}")]
    Transport(String),
    #[error("The escrow service did not respond within the deadline")]
    Timeout,
    #[error("Unintelligible response from the escrow service. {0}")]
    Protocol(String),
}
