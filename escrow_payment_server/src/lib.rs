//! # Escrow payment server
//!
//! The composition root of the escrow payment gateway. It is responsible for:
//! * Receiving signed callback notifications from the escrow service and dispatching them into the
//!   payment engine.
//! * Receiving order snapshots and fulfilment events from the host storefront and binding them to the
//!   matching flow operation.
//! * Gating gateway visibility (minimum order value, token validity) at checkout.
//!
//! ## Configuration
//! The server is configured via environment variables (prefix `EPG_`). See [config](config/index.html).
//!
//! ## Routes
//! * `/health`: liveness check.
//! * `/callback`: the escrow service's notification endpoint.
//! * `/order`, `/order/{id}/pay`, `/order/{id}/status`, `/order/{id}/availability`: storefront-facing.
//! * `/token-link`: connect a customer or vendor to their escrow token.
//! * `/diagnostics`: remote service health and registered profile.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod orchestrator;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
