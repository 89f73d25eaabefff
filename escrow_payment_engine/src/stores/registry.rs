//! An in-memory [`TokenRegistry`].
//!
//! Token issuance (KYC capture, bank details) happens on the escrow service's side; the registry only
//! remembers which token belongs to which local actor. Links are written when an account is connected
//! and read at transaction-creation time.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::*;

use crate::{
    traits::{TokenRegistry, TokenRegistryError},
    types::TokenId,
};

#[derive(Clone, Default)]
pub struct MemoryTokenRegistry {
    customers: Arc<Mutex<HashMap<String, TokenId>>>,
    vendors: Arc<Mutex<HashMap<String, TokenId>>>,
}

impl MemoryTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link_customer(&self, customer_id: &str, token: TokenId) {
        debug!("🗃️ Linking customer {customer_id} to token {token}");
        self.customers.lock().expect("token registry poisoned").insert(customer_id.to_string(), token);
    }

    pub fn link_vendor(&self, vendor_id: &str, token: TokenId) {
        debug!("🗃️ Linking vendor {vendor_id} to token {token}");
        self.vendors.lock().expect("token registry poisoned").insert(vendor_id.to_string(), token);
    }

    pub fn unlink_customer(&self, customer_id: &str) {
        self.customers.lock().expect("token registry poisoned").remove(customer_id);
    }
}

impl TokenRegistry for MemoryTokenRegistry {
    async fn token_for_customer(&self, customer_id: &str) -> Result<Option<TokenId>, TokenRegistryError> {
        Ok(self.customers.lock().expect("token registry poisoned").get(customer_id).cloned())
    }

    async fn token_for_vendor(&self, vendor_id: &str) -> Result<Option<TokenId>, TokenRegistryError> {
        Ok(self.vendors.lock().expect("token registry poisoned").get(vendor_id).cloned())
    }
}
