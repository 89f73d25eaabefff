use thiserror::Error;

use crate::types::TokenId;

/// Lookup of previously-issued escrow tokens for local actors. Registration itself (KYC capture, bank
/// details) happens outside the engine; the resolver only ever *reads* from here.
#[allow(async_fn_in_trait)]
pub trait TokenRegistry {
    /// The buyer token for a registered customer, if one has been issued.
    fn token_for_customer(&self, customer_id: &str) -> impl std::future::Future<Output = Result<Option<TokenId>, TokenRegistryError>> + Send;

    /// The beneficiary token for a vendor, if one has been issued.
    fn token_for_vendor(&self, vendor_id: &str) -> impl std::future::Future<Output = Result<Option<TokenId>, TokenRegistryError>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum TokenRegistryError {
    #[error("Token registry backend error. {0}")]
    Backend(String),
}
