//! The order lifecycle orchestrator.
//!
//! Binds the host storefront's order events to the matching state-machine operation, and decides when
//! the escrow gateway is offered at all. Faults raised by local triggers are already surfaced on the
//! order itself (status failed, fault message as the order note) by the flow API; the orchestrator
//! only logs them.

use std::{future::Future, pin::Pin, sync::Arc};

use epg_common::Cents;
use escrow_payment_engine::{
    events::{OrderEvent, OrderEventHooks, OrderEventSource},
    traits::{EscrowGateway, OrderStore, TokenRegistry},
    types::TokenId,
    TransactionFlowApi,
};
use log::*;

/// Reason strings sent with remote cancellation requests.
pub const CANCELLED_BY_MERCHANT: &str = "Transaction cancelled by store owner";
pub const REFUNDED_BY_MERCHANT: &str = "Order refunded by store owner";

/// Map one order event onto its flow operation. The flow marks the order failed on a fault, so this
/// only logs what happened.
pub async fn handle_order_event<G, S, R>(flow: &TransactionFlowApi<G, S, R>, event: OrderEvent)
where
    G: EscrowGateway,
    S: OrderStore,
    R: TokenRegistry,
{
    let result = match &event {
        OrderEvent::Completed(id) => flow.advance_on_order_completed(id).await,
        OrderEvent::Delivered(id) => flow.advance_on_order_delivered(id).await,
        OrderEvent::Cancelled(id) => flow.cancel_on_order_closed(id, CANCELLED_BY_MERCHANT).await,
        OrderEvent::Refunded(id) => flow.cancel_on_order_closed(id, REFUNDED_BY_MERCHANT).await,
    };
    if let Err(e) = result {
        warn!("📦️ Handling {event:?} raised a fault (recorded on order {}): {e}", event.order_id());
    }
}

/// Build the typed event subscription: every event the storefront publishes is handled by
/// [`handle_order_event`] against the shared flow API.
pub fn order_event_source<G, S, R>(
    flow: Arc<TransactionFlowApi<G, S, R>>,
    buffer_size: usize,
) -> OrderEventSource
where
    G: EscrowGateway + Send + Sync + 'static,
    S: OrderStore + Send + Sync + 'static,
    R: TokenRegistry + Send + Sync + 'static,
{
    let mut hooks = OrderEventHooks::default();
    hooks.on_order_event(move |event| {
        let flow = Arc::clone(&flow);
        Box::pin(async move {
            handle_order_event(flow.as_ref(), event).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    OrderEventSource::new(buffer_size, hooks)
}

//-------------------------------------------  Gateway visibility  ----------------------------------------------------

/// Orders below the configured minimum stay with the non-escrow gateways. A zero total is left alone
/// (nothing to pay yet).
pub fn meets_minimum(total: Cents, minimum: Cents) -> bool {
    total.value() == 0 || total >= minimum
}

/// A buyer can use the gateway once their token carries the KYC id-number field. Guests qualify by
/// definition: their token is issued from billing details at checkout.
pub async fn buyer_token_valid<G: EscrowGateway>(gateway: &G, token: Option<&TokenId>) -> bool {
    match token {
        None => false,
        Some(token) => gateway.get_token(token).await.map(|t| t.has_id_number).unwrap_or(false),
    }
}

/// A marketplace seller can receive funds once their token carries a verified bank account.
pub async fn vendor_token_valid<G: EscrowGateway>(gateway: &G, token: Option<&TokenId>) -> bool {
    match token {
        None => false,
        Some(token) => gateway.get_token(token).await.map(|t| t.has_bank_account).unwrap_or(false),
    }
}
