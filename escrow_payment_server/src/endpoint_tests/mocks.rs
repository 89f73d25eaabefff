use epg_common::Cents;
use escrow_payment_engine::{
    traits::{EscrowGateway, GatewayError, TokenRegistry, TokenRegistryError},
    types::{
        BillingIdentity,
        FeeAllocation,
        NewAllocation,
        Party,
        TokenId,
        TokenSummary,
        TransactionId,
        TransactionMeta,
        TransactionSnapshot,
    },
};
use mockall::mock;

mock! {
    pub Gateway {}
    impl EscrowGateway for Gateway {
        async fn create_transaction(&self, meta: &TransactionMeta, allocations: &[NewAllocation], parties: &[Party]) -> Result<TransactionId, GatewayError>;
        async fn get_transaction(&self, id: &TransactionId) -> Result<TransactionSnapshot, GatewayError>;
        async fn allocation_start_delivery(&self, allocation_id: &str) -> Result<(), GatewayError>;
        async fn allocation_complete_delivery(&self, allocation_id: &str) -> Result<(), GatewayError>;
        async fn cancel_transaction(&self, id: &TransactionId, reason: &str) -> Result<(), GatewayError>;
        async fn create_token(&self, identity: &BillingIdentity) -> Result<TokenId, GatewayError>;
        async fn get_token(&self, id: &TokenId) -> Result<TokenSummary, GatewayError>;
        async fn get_calculation(&self, base_value: Cents, fee_allocation: FeeAllocation, industry: &str) -> Result<Cents, GatewayError>;
        async fn profile_token(&self) -> Result<TokenId, GatewayError>;
        fn deposit_link(&self, id: &TransactionId) -> String;
    }
}

mock! {
    pub Registry {}
    impl TokenRegistry for Registry {
        async fn token_for_customer(&self, customer_id: &str) -> Result<Option<TokenId>, TokenRegistryError>;
        async fn token_for_vendor(&self, vendor_id: &str) -> Result<Option<TokenId>, TokenRegistryError>;
    }
}
