mod channel;
mod event_types;
mod source;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::OrderEvent;
pub use source::{OrderEventHooks, OrderEventSource};
