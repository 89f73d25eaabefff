//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a
//! separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, any long, non-cpu-bound operation
//! (remote escrow calls in particular) must be awaited, never blocked on, so the worker can pick up
//! other requests in the meantime.

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use epg_common::Cents;
use escrow_payment_engine::{
    callbacks::CallbackPayload,
    events::{EventProducer, OrderEvent},
    traits::{EscrowGateway, OrderStore, TokenRegistry},
    types::{Order, OrderId, TokenId},
    EscrowError,
    MemoryOrderStore,
    MemoryTokenRegistry,
    TransactionFlowApi,
};
use log::*;
use serde::Deserialize;

use crate::{
    data_objects::{
        AvailabilityResponse,
        FulfilmentEvent,
        FulfilmentRequest,
        JsonResponse,
        NewOrderRequest,
        PaymentResponse,
        TokenLinkRequest,
    },
    errors::ServerError,
    orchestrator::{buyer_token_valid, meets_minimum, vendor_token_valid},
};

/// The non-secret slice of the server configuration that handlers need.
#[derive(Clone, Copy, Debug)]
pub struct GatewayOptions {
    pub minimum_order_total: Cents,
}

// Actix cannot handle generics in handlers registered with the attribute macros, so generic routes
// are wired manually using the `route!` macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + Send + Sync + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  -----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ------------------------------------------------------------

/// The storefront pushes an order snapshot before (or at) checkout.
#[post("/order")]
pub async fn order_intake(
    body: web::Json<NewOrderRequest>,
    store: web::Data<MemoryOrderStore>,
) -> impl Responder {
    let order = Order::from(body.into_inner());
    debug!("💻️ Received order {} ({} items, {})", order.id, order.items.len(), order.base_value());
    store.upsert_order(order);
    HttpResponse::Ok().json(JsonResponse::success("Order recorded."))
}

route!(pay_order => Post "/order/{order_id}/pay" impl EscrowGateway, OrderStore, TokenRegistry);
/// Checkout hand-off: create (or re-use) the escrow transaction for the order and tell the storefront
/// where to redirect the buyer. Safe to call repeatedly; the remote create happens at most once.
pub async fn pay_order<G, S, R>(
    path: web::Path<String>,
    api: web::Data<TransactionFlowApi<G, S, R>>,
    options: web::Data<GatewayOptions>,
) -> Result<HttpResponse, ServerError>
where
    G: EscrowGateway,
    S: OrderStore,
    R: TokenRegistry,
{
    let order_id = OrderId(path.into_inner());
    let order = fetch_order(api.store(), &order_id).await?;
    if !meets_minimum(order.base_value(), options.minimum_order_total) {
        info!("💻️ Order {order_id} is below the escrow minimum; refusing payment hand-off");
        return Ok(HttpResponse::BadRequest()
            .json(JsonResponse::failure("Order total is below the escrow minimum.")));
    }
    let outcome = api.create_transaction(&order_id).await?;
    Ok(HttpResponse::Ok().json(PaymentResponse {
        result: "success".to_string(),
        transaction_id: outcome.transaction_id.as_str().to_string(),
        redirect: outcome.redirect,
    }))
}

/// A storefront order-status change. Published into the order-event channel; the orchestrator's
/// subscription drives the matching escrow transition. Faults land on the order as a failed status
/// with the fault message as a note.
#[post("/order/{order_id}/status")]
pub async fn order_status(
    path: web::Path<String>,
    body: web::Json<FulfilmentRequest>,
    producer: web::Data<EventProducer<OrderEvent>>,
) -> impl Responder {
    let order_id = OrderId(path.into_inner());
    let event = match body.into_inner().event {
        FulfilmentEvent::Completed => OrderEvent::Completed(order_id),
        FulfilmentEvent::Delivered => OrderEvent::Delivered(order_id),
        FulfilmentEvent::Cancelled => OrderEvent::Cancelled(order_id),
        FulfilmentEvent::Refunded => OrderEvent::Refunded(order_id),
    };
    debug!("💻️ Storefront published {event:?}");
    producer.publish_event(event).await;
    HttpResponse::Accepted().json(JsonResponse::success("Order event accepted."))
}

//----------------------------------------------   Callback  ----------------------------------------------------------

route!(callback => Post "/callback" impl EscrowGateway, OrderStore, TokenRegistry);
/// The escrow service's notification endpoint.
///
/// Signature and resolution failures are rejected outright: they are malformed or foreign requests,
/// and redelivery would not help. Any fault *past* resolution is logged and the endpoint still
/// acknowledges promptly with an empty body, so the sender does not enter a redelivery storm.
pub async fn callback<G, S, R>(
    body: web::Json<CallbackPayload>,
    api: web::Data<TransactionFlowApi<G, S, R>>,
) -> Result<HttpResponse, ServerError>
where
    G: EscrowGateway,
    S: OrderStore,
    R: TokenRegistry,
{
    let payload = body.into_inner();
    trace!("📥️ Received callback for transaction {} ({})", payload.id, payload.state);
    match api.process_callback(&payload).await {
        Ok(()) => Ok(HttpResponse::Ok().finish()),
        Err(e @ EscrowError::Authentication(_)) => {
            warn!("📥️ Rejecting callback for transaction {}: {e}", payload.id);
            Err(ServerError::from(e))
        },
        Err(e @ (EscrowError::UnknownTransaction(_) | EscrowError::Integrity(_))) => {
            warn!("📥️ Rejecting callback for transaction {}: {e}", payload.id);
            Err(ServerError::from(e))
        },
        Err(e) => {
            // Acknowledge anyway: the event was authentic and resolved; retrying it is an
            // operational decision, not the sender's.
            error!("📥️ Callback for transaction {} failed downstream: {e}", payload.id);
            Ok(HttpResponse::Ok().finish())
        },
    }
}

//----------------------------------------------   Availability  ------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
}

route!(availability => Get "/order/{order_id}/availability" impl EscrowGateway, OrderStore, TokenRegistry);
/// Whether the escrow gateway should be offered for this order, from the acting party's perspective.
/// Buyers need a token with KYC fields (guests get one issued at checkout); marketplace sellers need
/// a verified bank account.
pub async fn availability<G, S, R>(
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
    api: web::Data<TransactionFlowApi<G, S, R>>,
    options: web::Data<GatewayOptions>,
) -> Result<HttpResponse, ServerError>
where
    G: EscrowGateway,
    S: OrderStore,
    R: TokenRegistry,
{
    let order_id = OrderId(path.into_inner());
    let order = fetch_order(api.store(), &order_id).await?;
    if !meets_minimum(order.base_value(), options.minimum_order_total) {
        return Ok(hidden("Order total is below the escrow minimum"));
    }
    let response = match query.role.as_deref().unwrap_or("buyer") {
        "buyer" => match &order.customer_id {
            None => AvailabilityResponse { available: true, reason: None },
            Some(customer_id) => {
                let token = api
                    .registry()
                    .token_for_customer(customer_id)
                    .await
                    .map_err(EscrowError::from)?;
                buyer_availability(api.gateway(), token).await
            },
        },
        "seller" => {
            let vendor_id = query.vendor_id.as_deref().ok_or_else(|| {
                ServerError::InvalidRequestBody("vendor_id is required for role=seller".to_string())
            })?;
            let token = api.registry().token_for_vendor(vendor_id).await.map_err(EscrowError::from)?;
            let available = vendor_token_valid(api.gateway(), token.as_ref()).await;
            AvailabilityResponse {
                available,
                reason: (!available).then(|| "Seller has no verified bank account on file".to_string()),
            }
        },
        other => {
            return Err(ServerError::InvalidRequestBody(format!("Unknown role: {other}")));
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

async fn buyer_availability<G: EscrowGateway>(gateway: &G, token: Option<TokenId>) -> AvailabilityResponse {
    let available = buyer_token_valid(gateway, token.as_ref()).await;
    AvailabilityResponse {
        available,
        reason: (!available).then(|| "Buyer has no usable escrow token".to_string()),
    }
}

fn hidden(reason: &str) -> HttpResponse {
    HttpResponse::Ok().json(AvailabilityResponse { available: false, reason: Some(reason.to_string()) })
}

//----------------------------------------------   Tokens  ------------------------------------------------------------

/// Connect a customer or vendor to the escrow token issued for them.
#[post("/token-link")]
pub async fn token_link(
    body: web::Json<TokenLinkRequest>,
    registry: web::Data<MemoryTokenRegistry>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    if req.token_id.is_empty() {
        return Err(ServerError::InvalidRequestBody("token_id must not be empty".to_string()));
    }
    match (req.customer_id, req.vendor_id) {
        (Some(customer_id), None) => registry.link_customer(&customer_id, TokenId(req.token_id)),
        (None, Some(vendor_id)) => registry.link_vendor(&vendor_id, TokenId(req.token_id)),
        _ => {
            return Err(ServerError::InvalidRequestBody(
                "Exactly one of customer_id or vendor_id is required".to_string(),
            ));
        },
    }
    Ok(HttpResponse::Ok().json(JsonResponse::success("Token linked.")))
}

/// Disconnect a customer from their escrow token, e.g. when they close their account with the escrow
/// service.
#[delete("/token-link/customer/{customer_id}")]
pub async fn token_unlink(
    path: web::Path<String>,
    registry: web::Data<MemoryTokenRegistry>,
) -> impl Responder {
    registry.unlink_customer(&path.into_inner());
    HttpResponse::Ok().json(JsonResponse::success("Token unlinked."))
}

//----------------------------------------------   Diagnostics  -------------------------------------------------------

/// Remote service health and the registered application profile, for the merchant's settings page.
#[get("/diagnostics")]
pub async fn diagnostics(client: web::Data<escrow_api::EscrowApiClient>) -> impl Responder {
    let ping = client.ping().await;
    let profile = match client.profile().await {
        Ok(profile) => serde_json::json!(profile),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    };
    HttpResponse::Ok().json(serde_json::json!({
        "environment": if client.production() { "production" } else { "sandbox" },
        "ping": ping,
        "profile": profile,
    }))
}

//----------------------------------------------   Helpers  -----------------------------------------------------------

async fn fetch_order<S: OrderStore>(store: &S, order_id: &OrderId) -> Result<Order, ServerError> {
    store
        .fetch_order(order_id)
        .await
        .map_err(EscrowError::from)?
        .ok_or_else(|| ServerError::NoRecordFound(format!("order {order_id}")))
}
