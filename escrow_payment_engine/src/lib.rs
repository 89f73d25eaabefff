//! Escrow Payment Engine
//!
//! The engine reconciles a merchant's order lifecycle with the transaction lifecycle of a third-party
//! escrow service, so that funds move correctly between a buyer, one or more sellers, and optional
//! marketplace vendors. It is host-platform agnostic: the storefront supplies orders through the
//! [`traits::OrderStore`] seam and the remote service is reached through the [`traits::EscrowGateway`]
//! seam, so any HTTP client (or a mock) can back it.
//!
//! The library is divided into:
//! 1. The domain types ([`mod@types`]): orders, allocations, parties, callback events and the fee
//!    breakdown persisted for receipts.
//! 2. The trait seams ([`mod@traits`]) that backends must implement.
//! 3. The pure calculators ([`mod@fees`], [`mod@party`]): fee allocation and party/token resolution.
//! 4. The transaction flow ([`TransactionFlowApi`]): the state machine driving remote and local
//!    transitions, including verified callback ingestion.
//!
//! A simple actor-style event channel ([`mod@events`]) carries order lifecycle events (completed,
//! delivered, cancelled, refunded) from the host into the orchestrator.
pub mod callbacks;
pub mod events;
pub mod fees;
pub mod flow_api;
pub mod helpers;
pub mod party;
pub mod stores;
pub mod traits;
pub mod types;

pub use flow_api::{errors::EscrowError, transaction_flow::TransactionFlowApi};
pub use stores::{MemoryOrderStore, MemoryTokenRegistry};
