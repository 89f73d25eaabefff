//! Interface contracts between the engine and its external collaborators.
//!
//! * [`EscrowGateway`] is the remote escrow service: transaction creation, allocation delivery
//!   transitions, tokens, fee quotes.
//! * [`OrderStore`] is the host platform's order storage. The engine only writes the fields it owns:
//!   the (immutable) transaction-id link, the order status with a visible note, and the fee breakdown.
//! * [`TokenRegistry`] maps local actors (customers, vendors) to the identity tokens previously issued
//!   by the escrow service.
mod escrow_gateway;
mod order_store;
mod token_registry;

pub use escrow_gateway::{EscrowGateway, GatewayError};
pub use order_store::{OrderStore, StoreError};
pub use token_registry::{TokenRegistry, TokenRegistryError};
