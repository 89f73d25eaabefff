mod callback_signature;
mod order_locks;

pub use callback_signature::{callback_digest, verify_callback_signature, CallbackSignatureError};
pub use order_locks::OrderLocks;
