use thiserror::Error;

use crate::types::{FeeBreakdown, Order, OrderId, OrderStatus, TransactionId};

/// Order storage owned by the host commerce platform. The engine writes only the fields it owns:
/// the transaction-id link (set exactly once), status changes with an order-visible note, and the
/// computed fee breakdown used for receipts.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    fn fetch_order(&self, id: &OrderId) -> impl std::future::Future<Output = Result<Option<Order>, StoreError>> + Send;

    /// The unique order linked to the given remote transaction.
    ///
    /// Returns `None` when no order matches. More than one match is a data-integrity violation and
    /// must surface as [`StoreError::DuplicateTransactionId`]; it is never silently resolved.
    fn find_order_by_transaction_id(&self, txid: &TransactionId) -> impl std::future::Future<Output = Result<Option<Order>, StoreError>> + Send;

    /// Link an order to its escrow transaction. The link is write-once: a second call for the same
    /// order must fail with [`StoreError::TransactionIdAlreadySet`].
    fn set_transaction_id(&self, id: &OrderId, txid: &TransactionId) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Update the order status, attaching a customer/merchant visible note.
    fn update_status(&self, id: &OrderId, status: OrderStatus, note: &str) -> impl std::future::Future<Output = Result<Order, StoreError>> + Send;

    /// Attach a note without changing the status.
    fn add_order_note(&self, id: &OrderId, note: &str) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Persist the computed fee split against the order, for receipts.
    fn save_fee_breakdown(&self, id: &OrderId, breakdown: &FeeBreakdown) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} is already linked to an escrow transaction")]
    TransactionIdAlreadySet(OrderId),
    #[error("More than one order is linked to escrow transaction {0}")]
    DuplicateTransactionId(TransactionId),
    #[error("Order store backend error. {0}")]
    Backend(String),
}
