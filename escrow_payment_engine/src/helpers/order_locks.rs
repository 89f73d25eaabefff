//! Order-scoped critical sections.
//!
//! The host may deliver concurrent, duplicate, or out-of-order callbacks for one transaction, and a
//! local order-status trigger can fire while a callback for the same order is in flight. Every
//! read-decide-apply sequence in the flow API therefore runs behind the order's own async mutex, so
//! two racing operations cannot both act on stale state. Locks are created on first use and kept for
//! the lifetime of the process; the map only ever holds orders this instance has touched.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::OrderId;

#[derive(Clone, Default)]
pub struct OrderLocks {
    inner: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the critical section for one order, waiting if another operation holds it.
    pub async fn acquire(&self, id: &OrderId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().expect("order lock registry poisoned");
            Arc::clone(map.entry(id.as_str().to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
