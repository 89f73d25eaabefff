//! An in-memory [`OrderStore`].
//!
//! The engine stores nothing durably itself; orders live in the host platform. This store backs the
//! engine in tests and in single-process deployments where the host pushes orders in over HTTP.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use log::*;

use crate::{
    traits::{OrderStore, StoreError},
    types::{FeeBreakdown, Order, OrderId, OrderStatus, TransactionId},
};

#[derive(Default)]
struct Inner {
    orders: HashMap<String, Order>,
    notes: HashMap<String, Vec<String>>,
    breakdowns: HashMap<String, FeeBreakdown>,
}

#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order. This is the host side of the seam, not part of [`OrderStore`].
    pub fn upsert_order(&self, order: Order) {
        let mut inner = self.inner.lock().expect("order store poisoned");
        inner.orders.insert(order.id.as_str().to_string(), order);
    }

    pub fn notes_for(&self, id: &OrderId) -> Vec<String> {
        let inner = self.inner.lock().expect("order store poisoned");
        inner.notes.get(id.as_str()).cloned().unwrap_or_default()
    }

    pub fn breakdown_for(&self, id: &OrderId) -> Option<FeeBreakdown> {
        let inner = self.inner.lock().expect("order store poisoned");
        inner.breakdowns.get(id.as_str()).cloned()
    }
}

impl OrderStore for MemoryOrderStore {
    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.lock().expect("order store poisoned");
        Ok(inner.orders.get(id.as_str()).cloned())
    }

    async fn find_order_by_transaction_id(&self, txid: &TransactionId) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.lock().expect("order store poisoned");
        let mut matches = inner.orders.values().filter(|o| o.transaction_id.as_ref() == Some(txid));
        let first = matches.next().cloned();
        if matches.next().is_some() {
            return Err(StoreError::DuplicateTransactionId(txid.clone()));
        }
        Ok(first)
    }

    async fn set_transaction_id(&self, id: &OrderId, txid: &TransactionId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("order store poisoned");
        let order = inner.orders.get_mut(id.as_str()).ok_or_else(|| StoreError::OrderNotFound(id.clone()))?;
        if order.transaction_id.is_some() {
            return Err(StoreError::TransactionIdAlreadySet(id.clone()));
        }
        order.transaction_id = Some(txid.clone());
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: &OrderId, status: OrderStatus, note: &str) -> Result<Order, StoreError> {
        let mut inner = self.inner.lock().expect("order store poisoned");
        let order = inner.orders.get_mut(id.as_str()).ok_or_else(|| StoreError::OrderNotFound(id.clone()))?;
        trace!("🗃️ Order {id}: {} -> {status} ({note})", order.status);
        order.status = status;
        order.updated_at = Utc::now();
        let order = order.clone();
        inner.notes.entry(id.as_str().to_string()).or_default().push(note.to_string());
        Ok(order)
    }

    async fn add_order_note(&self, id: &OrderId, note: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("order store poisoned");
        if !inner.orders.contains_key(id.as_str()) {
            return Err(StoreError::OrderNotFound(id.clone()));
        }
        inner.notes.entry(id.as_str().to_string()).or_default().push(note.to_string());
        Ok(())
    }

    async fn save_fee_breakdown(&self, id: &OrderId, breakdown: &FeeBreakdown) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("order store poisoned");
        if !inner.orders.contains_key(id.as_str()) {
            return Err(StoreError::OrderNotFound(id.clone()));
        }
        inner.breakdowns.insert(id.as_str().to_string(), breakdown.clone());
        Ok(())
    }
}
