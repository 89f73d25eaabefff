use actix_web::{http::StatusCode, test, web::ServiceConfig, App};
use chrono::Utc;
use epg_common::{Cents, Secret};
use escrow_payment_engine::types::{BillingIdentity, EscrowSettings, LineItem, Order, OrderId, OrderStatus};
use serde::Serialize;

pub const TEST_SECRET: &str = "test-secret";

pub fn test_settings() -> EscrowSettings {
    EscrowSettings { client_secret: Secret::new(TEST_SECRET.to_string()), ..EscrowSettings::default() }
}

pub fn test_order(id: &str, customer: Option<&str>, total_rands: i64) -> Order {
    Order {
        id: OrderId(id.to_string()),
        status: OrderStatus::Pending,
        subtotal: Cents::from_rands(total_rands),
        discount_total: Cents::from(0),
        shipping_total: Cents::from(0),
        tax_total: Cents::from(0),
        currency: "ZAR".to_string(),
        items: vec![LineItem {
            name: "Widget".to_string(),
            vendor_id: "shop".to_string(),
            total: Cents::from_rands(total_rands),
        }],
        customer_id: customer.map(String::from),
        billing: BillingIdentity::default(),
        transaction_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub async fn get_request<F>(uri: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    let req = test::TestRequest::get().uri(uri).to_request();
    let res = test::call_service(&app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).to_string())
}

pub async fn post_request<F, B>(uri: &str, body: &B, configure: F) -> (StatusCode, String)
where
    F: FnOnce(&mut ServiceConfig),
    B: Serialize,
{
    let app = test::init_service(App::new().configure(configure)).await;
    let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
    let res = test::call_service(&app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).to_string())
}
