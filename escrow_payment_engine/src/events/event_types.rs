use crate::types::OrderId;

/// Order-lifecycle events emitted by the host platform and consumed by the orchestrator. Each maps to
/// exactly one flow operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    /// The merchant marked the order completed.
    Completed(OrderId),
    /// The merchant marked the order delivered.
    Delivered(OrderId),
    Cancelled(OrderId),
    Refunded(OrderId),
}

impl OrderEvent {
    pub fn order_id(&self) -> &OrderId {
        match self {
            OrderEvent::Completed(id)
            | OrderEvent::Delivered(id)
            | OrderEvent::Cancelled(id)
            | OrderEvent::Refunded(id) => id,
        }
    }
}
