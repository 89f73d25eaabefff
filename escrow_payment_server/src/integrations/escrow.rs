//! Binds the engine's [`EscrowGateway`] seam to the HTTP client in `escrow_api`.
//!
//! All conversion between the engine's domain types (amounts in cents, typed enums) and the remote
//! wire types (major-unit floats, SCREAMING_SNAKE strings) lives here, so neither side leaks into the
//! other.

use epg_common::Cents;
use escrow_api::{EscrowApiClient, EscrowApiError, TokenIdentity};
use escrow_payment_engine::{
    traits::{EscrowGateway, GatewayError},
    types::{
        AllocationState,
        AllocationStatus,
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
use log::*;

#[derive(Clone)]
pub struct RemoteEscrowGateway {
    client: EscrowApiClient,
}

impl RemoteEscrowGateway {
    pub fn new(client: EscrowApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &EscrowApiClient {
        &self.client
    }
}

fn map_api_error(e: EscrowApiError) -> GatewayError {
    match e {
        EscrowApiError::Timeout => GatewayError::Timeout,
        EscrowApiError::JsonError(msg) => GatewayError::Protocol(msg),
        other => GatewayError::Transport(other.to_string()),
    }
}

fn cents_to_major_units(value: Cents) -> f64 {
    value.value() as f64 / 100.0
}

fn major_units_to_cents(value: f64) -> Cents {
    Cents::from((value * 100.0).round() as i64)
}

fn to_wire_meta(meta: &TransactionMeta) -> escrow_api::NewTransaction {
    escrow_api::NewTransaction {
        title: meta.title.clone(),
        description: meta.description.clone(),
        industry: meta.industry.clone(),
        fee_allocation: meta.fee_allocation.to_string(),
        reference: meta.reference.clone(),
    }
}

fn to_wire_allocation(allocation: &NewAllocation) -> escrow_api::NewAllocation {
    escrow_api::NewAllocation {
        title: allocation.title.clone(),
        description: allocation.description.clone(),
        value: cents_to_major_units(allocation.value),
        days_to_deliver: allocation.days_to_deliver,
        days_to_inspect: allocation.days_to_inspect,
    }
}

fn to_wire_party(party: &Party) -> escrow_api::PartyInput {
    escrow_api::PartyInput {
        role: party.role.to_string(),
        token: party.token.as_str().to_string(),
        fee: party.fee.map(cents_to_major_units),
        fee_type: party.fee_type.map(|t| t.to_string()),
        fee_allocation: party.fee_allocation.map(|a| a.to_string()),
    }
}

fn from_wire_snapshot(snapshot: escrow_api::TransactionSnapshot) -> Result<TransactionSnapshot, GatewayError> {
    let allocations = snapshot
        .allocations
        .into_iter()
        .map(|a| {
            let state = a
                .state
                .parse::<AllocationState>()
                .map_err(|e| GatewayError::Protocol(e.to_string()))?;
            Ok(AllocationStatus { id: a.id, state })
        })
        .collect::<Result<Vec<_>, GatewayError>>()?;
    Ok(TransactionSnapshot { id: TransactionId(snapshot.id), allocations })
}

impl EscrowGateway for RemoteEscrowGateway {
    async fn create_transaction(
        &self,
        meta: &TransactionMeta,
        allocations: &[NewAllocation],
        parties: &[Party],
    ) -> Result<TransactionId, GatewayError> {
        let allocations = allocations.iter().map(to_wire_allocation).collect();
        let parties = parties.iter().map(to_wire_party).collect();
        let result = self
            .client
            .create_transaction(to_wire_meta(meta), allocations, parties)
            .await
            .map_err(map_api_error)?;
        Ok(TransactionId(result.id))
    }

    async fn get_transaction(&self, id: &TransactionId) -> Result<TransactionSnapshot, GatewayError> {
        let snapshot = self.client.get_transaction(id.as_str()).await.map_err(map_api_error)?;
        from_wire_snapshot(snapshot)
    }

    async fn allocation_start_delivery(&self, allocation_id: &str) -> Result<(), GatewayError> {
        self.client.allocation_start_delivery(allocation_id).await.map_err(map_api_error)
    }

    async fn allocation_complete_delivery(&self, allocation_id: &str) -> Result<(), GatewayError> {
        self.client.allocation_complete_delivery(allocation_id).await.map_err(map_api_error)
    }

    async fn cancel_transaction(&self, id: &TransactionId, reason: &str) -> Result<(), GatewayError> {
        self.client.cancel_transaction(id.as_str(), reason).await.map_err(map_api_error)
    }

    async fn create_token(&self, identity: &BillingIdentity) -> Result<TokenId, GatewayError> {
        let identity = TokenIdentity {
            given_name: identity.given_name.clone(),
            family_name: identity.family_name.clone(),
            email: identity.email.clone(),
            mobile: identity.mobile.clone(),
        };
        let result = self.client.create_token(identity).await.map_err(map_api_error)?;
        Ok(TokenId(result.id))
    }

    async fn get_token(&self, id: &TokenId) -> Result<TokenSummary, GatewayError> {
        let details = self.client.get_token(id.as_str()).await.map_err(map_api_error)?;
        let has_id_number = details.user.id_number.as_deref().is_some_and(|n| !n.is_empty());
        let has_bank_account = details.bank_account.account_number.as_deref().is_some_and(|n| !n.is_empty());
        Ok(TokenSummary { id: TokenId(details.id), has_id_number, has_bank_account, mobile: details.user.mobile })
    }

    async fn get_calculation(
        &self,
        base_value: Cents,
        fee_allocation: FeeAllocation,
        industry: &str,
    ) -> Result<Cents, GatewayError> {
        let calculation = self
            .client
            .get_calculation(cents_to_major_units(base_value), &fee_allocation.to_string(), industry)
            .await
            .map_err(map_api_error)?;
        let fee = major_units_to_cents(calculation.processing_fee_total);
        trace!("💸️ Quoted processing fee for {base_value}: {fee}");
        Ok(fee)
    }

    async fn profile_token(&self) -> Result<TokenId, GatewayError> {
        let profile = self.client.profile().await.map_err(map_api_error)?;
        Ok(TokenId(profile.id))
    }

    fn deposit_link(&self, id: &TransactionId) -> String {
        self.client.deposit_link(id.as_str())
    }
}
