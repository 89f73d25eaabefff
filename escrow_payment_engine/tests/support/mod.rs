//! Test doubles for the flow tests: a scripted escrow gateway, a map-backed token registry, and
//! order builders.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use epg_common::{Cents, Secret};
use escrow_payment_engine::{
    traits::{EscrowGateway, GatewayError, TokenRegistry, TokenRegistryError},
    types::{
        AllocationState,
        AllocationStatus,
        BillingIdentity,
        EscrowSettings,
        FeeAllocation,
        LineItem,
        NewAllocation,
        Order,
        OrderId,
        OrderStatus,
        Party,
        TokenId,
        TokenSummary,
        TransactionId,
        TransactionMeta,
        TransactionSnapshot,
    },
};

#[derive(Default)]
pub struct GatewayState {
    pub create_calls: u32,
    pub created_parties: Vec<Vec<Party>>,
    pub start_delivery_calls: Vec<String>,
    pub complete_delivery_calls: Vec<String>,
    pub cancel_calls: Vec<(String, String)>,
    pub token_creations: u32,
    pub allocation_state: Option<AllocationState>,
    pub fail_next_call: bool,
}

/// A gateway whose remote allocation state is set by the test. Every remote call is recorded.
#[derive(Clone, Default)]
pub struct MockGateway {
    inner: Arc<Mutex<GatewayState>>,
}

impl MockGateway {
    pub fn set_allocation_state(&self, state: AllocationState) {
        self.inner.lock().unwrap().allocation_state = Some(state);
    }

    pub fn fail_next_call(&self) {
        self.inner.lock().unwrap().fail_next_call = true;
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.inner.lock().unwrap()
    }

    fn check_scripted_failure(&self) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_call {
            inner.fail_next_call = false;
            Err(GatewayError::Transport("scripted failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl EscrowGateway for MockGateway {
    async fn create_transaction(
        &self,
        _meta: &TransactionMeta,
        _allocations: &[NewAllocation],
        parties: &[Party],
    ) -> Result<TransactionId, GatewayError> {
        self.check_scripted_failure()?;
        let mut inner = self.inner.lock().unwrap();
        inner.create_calls += 1;
        inner.created_parties.push(parties.to_vec());
        if inner.allocation_state.is_none() {
            inner.allocation_state = Some(AllocationState::PendingAcceptance);
        }
        Ok(TransactionId(format!("T{}", inner.create_calls)))
    }

    async fn get_transaction(&self, id: &TransactionId) -> Result<TransactionSnapshot, GatewayError> {
        self.check_scripted_failure()?;
        let inner = self.inner.lock().unwrap();
        let state = inner
            .allocation_state
            .ok_or_else(|| GatewayError::Transport(format!("No transaction {id}")))?;
        Ok(TransactionSnapshot {
            id: id.clone(),
            allocations: vec![AllocationStatus { id: format!("{}-a0", id.as_str()), state }],
        })
    }

    async fn allocation_start_delivery(&self, allocation_id: &str) -> Result<(), GatewayError> {
        self.check_scripted_failure()?;
        let mut inner = self.inner.lock().unwrap();
        inner.start_delivery_calls.push(allocation_id.to_string());
        inner.allocation_state = Some(AllocationState::Initiated);
        Ok(())
    }

    async fn allocation_complete_delivery(&self, allocation_id: &str) -> Result<(), GatewayError> {
        self.check_scripted_failure()?;
        let mut inner = self.inner.lock().unwrap();
        inner.complete_delivery_calls.push(allocation_id.to_string());
        inner.allocation_state = Some(AllocationState::Delivered);
        Ok(())
    }

    async fn cancel_transaction(&self, id: &TransactionId, reason: &str) -> Result<(), GatewayError> {
        self.check_scripted_failure()?;
        let mut inner = self.inner.lock().unwrap();
        inner.cancel_calls.push((id.as_str().to_string(), reason.to_string()));
        inner.allocation_state = Some(AllocationState::Cancelled);
        Ok(())
    }

    async fn create_token(&self, _identity: &BillingIdentity) -> Result<TokenId, GatewayError> {
        self.check_scripted_failure()?;
        let mut inner = self.inner.lock().unwrap();
        inner.token_creations += 1;
        Ok(TokenId(format!("guest-token-{}", inner.token_creations)))
    }

    async fn get_token(&self, id: &TokenId) -> Result<TokenSummary, GatewayError> {
        self.check_scripted_failure()?;
        Ok(TokenSummary { id: id.clone(), has_id_number: true, has_bank_account: true, mobile: None })
    }

    async fn get_calculation(
        &self,
        base_value: Cents,
        _fee_allocation: FeeAllocation,
        _industry: &str,
    ) -> Result<Cents, GatewayError> {
        self.check_scripted_failure()?;
        // A flat 2% stand-in for the real fee schedule.
        Ok(Cents::from(base_value.value() / 50))
    }

    async fn profile_token(&self) -> Result<TokenId, GatewayError> {
        self.check_scripted_failure()?;
        Ok(TokenId("merchant-profile".to_string()))
    }

    fn deposit_link(&self, id: &TransactionId) -> String {
        format!("https://sandbox.escrow.example/transaction/{id}/deposit")
    }
}

#[derive(Clone, Default)]
pub struct MapRegistry {
    customers: Arc<Mutex<HashMap<String, TokenId>>>,
    vendors: Arc<Mutex<HashMap<String, TokenId>>>,
}

impl MapRegistry {
    pub fn with_customer(self, customer_id: &str, token: &str) -> Self {
        self.customers.lock().unwrap().insert(customer_id.to_string(), TokenId(token.to_string()));
        self
    }

    pub fn with_vendor(self, vendor_id: &str, token: &str) -> Self {
        self.vendors.lock().unwrap().insert(vendor_id.to_string(), TokenId(token.to_string()));
        self
    }
}

impl TokenRegistry for MapRegistry {
    async fn token_for_customer(&self, customer_id: &str) -> Result<Option<TokenId>, TokenRegistryError> {
        Ok(self.customers.lock().unwrap().get(customer_id).cloned())
    }

    async fn token_for_vendor(&self, vendor_id: &str) -> Result<Option<TokenId>, TokenRegistryError> {
        Ok(self.vendors.lock().unwrap().get(vendor_id).cloned())
    }
}

pub fn test_settings(marketplace: bool) -> EscrowSettings {
    EscrowSettings {
        client_secret: Secret::new("test-secret".to_string()),
        marketplace,
        ..EscrowSettings::default()
    }
}

pub fn order(id: &str, customer: Option<&str>, items: &[(&str, &str, i64)]) -> Order {
    let items = items
        .iter()
        .map(|(name, vendor, rands)| LineItem {
            name: name.to_string(),
            vendor_id: vendor.to_string(),
            total: Cents::from_rands(*rands),
        })
        .collect::<Vec<_>>();
    let subtotal = items.iter().map(|i| i.total).sum();
    Order {
        id: OrderId(id.to_string()),
        status: OrderStatus::Pending,
        subtotal,
        discount_total: Cents::from(0),
        shipping_total: Cents::from(0),
        tax_total: Cents::from(0),
        currency: "ZAR".to_string(),
        items,
        customer_id: customer.map(String::from),
        billing: BillingIdentity {
            given_name: "Thandi".to_string(),
            family_name: "Mokoena".to_string(),
            email: "thandi@example.com".to_string(),
            mobile: "+27820000000".to_string(),
        },
        transaction_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
