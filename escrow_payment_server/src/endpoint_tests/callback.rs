use actix_web::{http::StatusCode, web, web::ServiceConfig};
use escrow_payment_engine::{
    callbacks::CallbackPayload,
    traits::{GatewayError, OrderStore},
    types::{AllocationState, AllocationStatus, OrderId, OrderStatus, TransactionId, TransactionSnapshot},
    MemoryOrderStore,
    TransactionFlowApi,
};

use super::{
    helpers::{post_request, test_order, test_settings, TEST_SECRET},
    mocks::{MockGateway, MockRegistry},
};
use crate::routes::CallbackRoute;

fn linked_store(order_id: &str, txid: &str) -> MemoryOrderStore {
    let store = MemoryOrderStore::new();
    let mut order = test_order(order_id, Some("cust-1"), 1000);
    order.transaction_id = Some(TransactionId(txid.to_string()));
    store.upsert_order(order);
    store
}

fn configure(store: MemoryOrderStore, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let registry = MockRegistry::new();
        let flow = TransactionFlowApi::new(gateway, store, registry, test_settings());
        cfg.service(CallbackRoute::<MockGateway, MemoryOrderStore, MockRegistry>::new())
            .app_data(web::Data::new(flow));
    }
}

#[actix_web::test]
async fn valid_callback_is_acknowledged_with_empty_body() {
    let _ = env_logger::try_init().ok();
    let store = linked_store("1001", "T1");
    let payload = CallbackPayload::signed(TEST_SECRET, "T1", "FUNDS_DEPOSITED");
    let (status, body) =
        post_request("/callback", &payload, configure(store.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    let order = store.fetch_order(&OrderId("1001".into())).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::OnHold);
}

#[actix_web::test]
async fn forged_signature_is_rejected_with_no_mutation() {
    let _ = env_logger::try_init().ok();
    let store = linked_store("1001", "T1");
    let payload = CallbackPayload::signed("attacker-secret", "T1", "FUNDS_RELEASED");
    let (status, body) =
        post_request("/callback", &payload, configure(store.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("error"));
    let order = store.fetch_order(&OrderId("1001".into())).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[actix_web::test]
async fn callback_for_unknown_transaction_is_rejected() {
    let _ = env_logger::try_init().ok();
    let store = MemoryOrderStore::new();
    let payload = CallbackPayload::signed(TEST_SECRET, "T404", "FUNDS_RELEASED");
    let (status, _body) = post_request("/callback", &payload, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn funds_received_starts_delivery_and_sets_processing() {
    let _ = env_logger::try_init().ok();
    let store = linked_store("1001", "T1");
    let mut gateway = MockGateway::new();
    gateway.expect_get_transaction().returning(|id| {
        Ok(TransactionSnapshot {
            id: id.clone(),
            allocations: vec![AllocationStatus { id: "A1".to_string(), state: AllocationState::PendingAcceptance }],
        })
    });
    gateway.expect_allocation_start_delivery().times(1).returning(|_| Ok(()));
    let payload = CallbackPayload::signed(TEST_SECRET, "T1", "FUNDS_RECEIVED");
    let (status, _) = post_request("/callback", &payload, configure(store.clone(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let order = store.fetch_order(&OrderId("1001".into())).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
}

#[actix_web::test]
async fn downstream_transport_fault_is_still_acknowledged() {
    let _ = env_logger::try_init().ok();
    let store = linked_store("1001", "T1");
    let mut gateway = MockGateway::new();
    gateway
        .expect_get_transaction()
        .returning(|_| Err(GatewayError::Transport("remote service is down".to_string())));
    let payload = CallbackPayload::signed(TEST_SECRET, "T1", "FUNDS_RECEIVED");
    let (status, body) = post_request("/callback", &payload, configure(store.clone(), gateway)).await;
    // Authentic and resolved: the sender must not redeliver, so the endpoint acknowledges.
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    let order = store.fetch_order(&OrderId("1001".into())).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}
