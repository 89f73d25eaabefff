use std::fmt::Display;

use chrono::{DateTime, Utc};
use epg_common::Cents;
use escrow_payment_engine::types::{BillingIdentity, LineItem, Order, OrderId, OrderStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Response to a checkout payment request, mirroring what the storefront expects: where to send the
/// buyer next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub result: String,
    pub transaction_id: String,
    pub redirect: String,
}

/// An order snapshot pushed by the host storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub order_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub subtotal: Cents,
    #[serde(default)]
    pub discount_total: Cents,
    #[serde(default)]
    pub shipping_total: Cents,
    #[serde(default)]
    pub tax_total: Cents,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub billing: BillingIdentity,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    epg_common::ZAR_CURRENCY_CODE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub name: String,
    pub vendor_id: String,
    pub total: Cents,
}

impl From<NewOrderRequest> for Order {
    fn from(req: NewOrderRequest) -> Self {
        let created_at = req.created_at.unwrap_or_else(Utc::now);
        Order {
            id: OrderId(req.order_id),
            status: OrderStatus::Pending,
            subtotal: req.subtotal,
            discount_total: req.discount_total,
            shipping_total: req.shipping_total,
            tax_total: req.tax_total,
            currency: req.currency,
            items: req
                .items
                .into_iter()
                .map(|i| LineItem { name: i.name, vendor_id: i.vendor_id, total: i.total })
                .collect(),
            customer_id: req.customer_id,
            billing: req.billing,
            transaction_id: None,
            created_at,
            updated_at: created_at,
        }
    }
}

/// A fulfilment event from the storefront, bound to an order-status change on its side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfilmentEvent {
    Completed,
    Delivered,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfilmentRequest {
    pub event: FulfilmentEvent,
}

/// Connect a local actor to its escrow token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLinkRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
    pub token_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
