use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use escrow_api::EscrowApiClient;
use escrow_payment_engine::{
    events::{EventProducer, OrderEvent},
    MemoryOrderStore,
    MemoryTokenRegistry,
    TransactionFlowApi,
};
use log::info;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::RemoteEscrowGateway,
    orchestrator::order_event_source,
    routes::{
        diagnostics,
        health,
        order_intake,
        order_status,
        token_link,
        token_unlink,
        AvailabilityRoute,
        CallbackRoute,
        GatewayOptions,
        PayOrderRoute,
    },
};

/// The concrete flow the server runs: the HTTP escrow client, the in-memory order store and token
/// registry.
pub type ServerFlow = TransactionFlowApi<RemoteEscrowGateway, MemoryOrderStore, MemoryTokenRegistry>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let client =
        EscrowApiClient::new(config.api.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = RemoteEscrowGateway::new(client.clone());
    let store = MemoryOrderStore::new();
    let registry = MemoryTokenRegistry::new();
    let flow =
        Arc::new(TransactionFlowApi::new(gateway, store.clone(), registry.clone(), config.settings.clone()));

    let source = order_event_source(Arc::clone(&flow), config.event_buffer_size);
    let producer = source
        .publisher()
        .ok_or_else(|| ServerError::InitializeError("The order-event handler was not installed".to_string()))?;
    source.start().await;
    info!("🛠️ Order event subscription installed");

    let srv = create_server_instance(config, flow, store, registry, client, producer)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    flow: Arc<ServerFlow>,
    store: MemoryOrderStore,
    registry: MemoryTokenRegistry,
    client: EscrowApiClient,
    producer: EventProducer<OrderEvent>,
) -> Result<Server, ServerError> {
    let options = GatewayOptions { minimum_order_total: config.minimum_order_total };
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("epg::access_log"))
            .app_data(web::Data::from(Arc::clone(&flow)))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(producer.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(order_intake)
            .service(order_status)
            .service(token_link)
            .service(token_unlink)
            .service(diagnostics)
            .service(PayOrderRoute::<RemoteEscrowGateway, MemoryOrderStore, MemoryTokenRegistry>::new())
            .service(CallbackRoute::<RemoteEscrowGateway, MemoryOrderStore, MemoryTokenRegistry>::new())
            .service(AvailabilityRoute::<RemoteEscrowGateway, MemoryOrderStore, MemoryTokenRegistry>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
