//! The `OrderEventSource` capability.
//!
//! The host platform publishes order-lifecycle events into the source; the orchestrator installs the
//! handler that maps each event onto a flow operation. This replaces ambient hook/filter dispatch with
//! one explicit, typed subscription.

use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderEvent};

/// Handler registration, built by the orchestrator before the server starts.
#[derive(Default, Clone)]
pub struct OrderEventHooks {
    pub on_order_event: Option<Handler<OrderEvent>>,
}

impl OrderEventHooks {
    pub fn on_order_event<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_event = Some(Arc::new(f));
        self
    }
}

pub struct OrderEventSource {
    handler: Option<EventHandler<OrderEvent>>,
}

impl OrderEventSource {
    pub fn new(buffer_size: usize, hooks: OrderEventHooks) -> Self {
        let handler = hooks.on_order_event.map(|f| EventHandler::new(buffer_size, f));
        Self { handler }
    }

    /// A publisher handle for the host side. Returns `None` when no handler was installed.
    pub fn publisher(&self) -> Option<EventProducer<OrderEvent>> {
        self.handler.as_ref().map(|h| h.subscribe())
    }

    /// Consume the source and run the handler loop. The loop ends once every publisher is dropped.
    pub async fn start(self) {
        if let Some(handler) = self.handler {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}
