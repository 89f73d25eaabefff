use std::{sync::Arc, time::Duration};

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use epg_common::Cents;
use escrow_payment_engine::{
    traits::{OrderStore, TokenRegistry},
    types::{
        AllocationState,
        AllocationStatus,
        OrderId,
        OrderStatus,
        TokenId,
        TokenSummary,
        TransactionId,
        TransactionSnapshot,
    },
    MemoryOrderStore,
    MemoryTokenRegistry,
    TransactionFlowApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, post_request, test_order, test_settings},
    mocks::{MockGateway, MockRegistry},
};
use crate::{
    orchestrator::order_event_source,
    routes::{order_intake, order_status, token_link, AvailabilityRoute, GatewayOptions, PayOrderRoute},
};

fn options() -> GatewayOptions {
    GatewayOptions { minimum_order_total: Cents::from_rands(50) }
}

fn configure_pay(
    store: MemoryOrderStore,
    gateway: MockGateway,
    registry: MockRegistry,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let flow = TransactionFlowApi::new(gateway, store, registry, test_settings());
        cfg.service(PayOrderRoute::<MockGateway, MemoryOrderStore, MockRegistry>::new())
            .service(AvailabilityRoute::<MockGateway, MemoryOrderStore, MockRegistry>::new())
            .app_data(web::Data::new(flow))
            .app_data(web::Data::new(options()));
    }
}

//----------------------------------------------  Payment  ------------------------------------------------------------

#[actix_web::test]
async fn pay_order_links_transaction_and_returns_redirect() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    store.upsert_order(test_order("1001", Some("cust-1"), 1000));
    let mut gateway = MockGateway::new();
    gateway.expect_get_calculation().returning(|_, _, _| Ok(Cents::from_rands(25)));
    gateway.expect_profile_token().returning(|| Ok(TokenId("tok-seller".into())));
    gateway
        .expect_create_transaction()
        .times(1)
        .returning(|_, _, _| Ok(TransactionId("T1".into())));
    gateway
        .expect_deposit_link()
        .returning(|id| format!("https://sandbox.escrow.example/transaction/{id}/deposit"));
    let mut registry = MockRegistry::new();
    registry.expect_token_for_customer().returning(|_| Ok(Some(TokenId("tok-buyer".into()))));

    let (status, body) =
        post_request("/order/1001/pay", &json!({}), configure_pay(store.clone(), gateway, registry)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""result":"success""#));
    assert!(body.contains("/transaction/T1/deposit"));
    let order = store.fetch_order(&OrderId("1001".into())).await.unwrap().unwrap();
    assert_eq!(order.transaction_id, Some(TransactionId("T1".into())));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(store.breakdown_for(&OrderId("1001".into())).is_some());
}

#[actix_web::test]
async fn pay_order_below_minimum_is_refused_without_remote_calls() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    store.upsert_order(test_order("1002", Some("cust-1"), 10));
    // No expectations on the mocks: any remote call would panic the test.
    let (status, body) = post_request(
        "/order/1002/pay",
        &json!({}),
        configure_pay(store, MockGateway::new(), MockRegistry::new()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("below the escrow minimum"));
}

#[actix_web::test]
async fn pay_order_with_unresolved_buyer_fails_the_order() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    store.upsert_order(test_order("1003", Some("cust-1"), 1000));
    let mut gateway = MockGateway::new();
    gateway.expect_get_calculation().returning(|_, _, _| Ok(Cents::from_rands(25)));
    gateway.expect_profile_token().returning(|| Ok(TokenId("tok-seller".into())));
    let mut registry = MockRegistry::new();
    registry.expect_token_for_customer().returning(|_| Ok(None));

    let (status, body) =
        post_request("/order/1003/pay", &json!({}), configure_pay(store.clone(), gateway, registry)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("BUYER"));
    let order = store.fetch_order(&OrderId("1003".into())).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
}

//----------------------------------------------  Availability  -------------------------------------------------------

#[actix_web::test]
async fn gateway_is_visible_above_the_minimum() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    // Guest order: the buyer token is issued at checkout, so only the minimum applies.
    store.upsert_order(test_order("2001", None, 1000));
    let (status, body) = get_request(
        "/order/2001/availability",
        configure_pay(store, MockGateway::new(), MockRegistry::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""available":true"#));
}

#[actix_web::test]
async fn gateway_is_hidden_below_the_minimum() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    store.upsert_order(test_order("2002", None, 10));
    let (status, body) = get_request(
        "/order/2002/availability",
        configure_pay(store, MockGateway::new(), MockRegistry::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""available":false"#));
    assert!(body.contains("below the escrow minimum"));
}

#[actix_web::test]
async fn buyer_without_kyc_token_cannot_see_the_gateway() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    store.upsert_order(test_order("2003", Some("cust-9"), 1000));
    let mut registry = MockRegistry::new();
    registry.expect_token_for_customer().returning(|_| Ok(Some(TokenId("tok-9".into()))));
    let mut gateway = MockGateway::new();
    gateway.expect_get_token().returning(|id| {
        Ok(TokenSummary { id: id.clone(), has_id_number: false, has_bank_account: false, mobile: None })
    });
    let (status, body) =
        get_request("/order/2003/availability", configure_pay(store, gateway, registry)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""available":false"#));
}

#[actix_web::test]
async fn marketplace_seller_needs_a_verified_bank_account() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    store.upsert_order(test_order("2004", Some("cust-1"), 1000));
    let mut registry = MockRegistry::new();
    registry.expect_token_for_vendor().returning(|_| Ok(Some(TokenId("tok-v".into()))));
    let mut gateway = MockGateway::new();
    gateway.expect_get_token().returning(|id| {
        Ok(TokenSummary { id: id.clone(), has_id_number: true, has_bank_account: true, mobile: None })
    });
    let (status, body) = get_request(
        "/order/2004/availability?role=seller&vendor_id=vendor-a",
        configure_pay(store, gateway, registry),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""available":true"#));
}

//----------------------------------------------  Intake & events  ----------------------------------------------------

#[actix_web::test]
async fn order_intake_records_the_order() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    let store2 = store.clone();
    let body = json!({
        "order_id": "5001",
        "customer_id": "cust-1",
        "subtotal": 120_00,
        "shipping_total": 10_00,
        "items": [{"name": "Widget", "vendor_id": "shop", "total": 120_00}],
    });
    let (status, _) = post_request("/order", &body, move |cfg| {
        cfg.service(order_intake).app_data(web::Data::new(store2));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let order = store.fetch_order(&OrderId("5001".into())).await.unwrap().unwrap();
    assert_eq!(order.base_value(), Cents::from(130_00));
}

#[actix_web::test]
async fn token_link_registers_a_vendor_token() {
    let _ = env_logger::try_init().ok();
    let registry = MemoryTokenRegistry::new();
    let registry2 = registry.clone();
    let body = json!({"vendor_id": "vendor-a", "token_id": "tok-a"});
    let (status, _) = post_request("/token-link", &body, move |cfg| {
        cfg.service(token_link).app_data(web::Data::new(registry2));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = registry.token_for_vendor("vendor-a").await.unwrap();
    assert_eq!(token, Some(TokenId("tok-a".into())));
}

#[actix_web::test]
async fn fulfilment_event_drives_the_escrow_transition() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    let mut order = test_order("6001", Some("cust-1"), 1000);
    order.transaction_id = Some(TransactionId("T6".into()));
    store.upsert_order(order);

    let mut gateway = MockGateway::new();
    gateway.expect_get_transaction().returning(|id| {
        Ok(TransactionSnapshot {
            id: id.clone(),
            allocations: vec![AllocationStatus { id: "A6".to_string(), state: AllocationState::Initiated }],
        })
    });
    gateway.expect_allocation_complete_delivery().times(1).returning(|_| Ok(()));

    let flow = Arc::new(TransactionFlowApi::new(gateway, store.clone(), MockRegistry::new(), test_settings()));
    let source = order_event_source(flow, 8);
    let producer = source.publisher().unwrap();
    source.start().await;

    let (status, _) = post_request("/order/6001/status", &json!({"event": "completed"}), move |cfg| {
        cfg.service(order_status).app_data(web::Data::new(producer));
    })
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // The transition happens on the subscription task; wait for it to land.
    let id = OrderId("6001".into());
    for _ in 0..200 {
        if let Ok(Some(order)) = store.fetch_order(&id).await {
            if order.status == OrderStatus::Delivered {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("The order never reached the delivered status");
}
