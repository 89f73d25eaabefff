pub mod errors;
pub mod transaction_flow;

pub use errors::EscrowError;
pub use transaction_flow::{CheckoutOutcome, TransactionFlowApi};
