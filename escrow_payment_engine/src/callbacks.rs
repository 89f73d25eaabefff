//! Inbound notification payloads.
//!
//! The escrow service notifies the gateway of remote state changes with a signed JSON body. The
//! payload is verified (see [`crate::helpers::verify_callback_signature`]) before any order is
//! resolved; dispatch into the state machine happens in
//! [`crate::TransactionFlowApi::process_callback`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    helpers::{callback_digest, CallbackSignatureError},
    types::{CallbackState, TransactionId},
};

/// The JSON body of an inbound notification: `{id, state, signature}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    /// The remote transaction id the event refers to.
    pub id: String,
    /// The declared remote state, e.g. "FUNDS_DEPOSITED".
    pub state: String,
    /// hex(HMAC-SHA256) over the other fields in declared order, keyed by the client secret.
    pub signature: String,
}

impl CallbackPayload {
    /// The fields covered by the signature, in their declared order.
    pub fn signed_fields(&self) -> [&str; 2] {
        [self.id.as_str(), self.state.as_str()]
    }

    pub fn verify(&self, client_secret: &str) -> Result<(), CallbackSignatureError> {
        crate::helpers::verify_callback_signature(client_secret, &self.signed_fields(), &self.signature)
    }

    /// Build a correctly-signed payload. The sender side of the protocol; used by tests and tooling.
    pub fn signed(client_secret: &str, id: &str, state: &str) -> Self {
        let signature = callback_digest(client_secret, &[id, state]);
        Self { id: id.to_string(), state: state.to_string(), signature }
    }
}

/// A verified notification, ready for dispatch.
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    pub transaction_id: TransactionId,
    pub state: CallbackState,
    pub received_at: DateTime<Utc>,
}

impl From<&CallbackPayload> for CallbackEvent {
    fn from(payload: &CallbackPayload) -> Self {
        Self {
            transaction_id: TransactionId(payload.id.clone()),
            state: CallbackState::from(payload.state.as_str()),
            received_at: Utc::now(),
        }
    }
}
