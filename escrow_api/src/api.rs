use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::EscrowApiConfig,
    data_objects::{
        Calculation,
        NewAllocation,
        NewTransaction,
        PartyInput,
        PingResult,
        PingStatus,
        Profile,
        TokenDetails,
        TokenIdentity,
        TokenRef,
        TransactionRef,
        TransactionSnapshot,
    },
    EscrowApiError,
};

/// Remote calls must complete within this deadline. There is no internal retry; callers decide what a
/// timeout means for them.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Clone)]
pub struct EscrowApiClient {
    config: EscrowApiConfig,
    client: Arc<Client>,
}

impl EscrowApiClient {
    pub fn new(config: EscrowApiConfig) -> Result<Self, EscrowApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| EscrowApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EscrowApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &EscrowApiConfig {
        &self.config
    }

    pub fn production(&self) -> bool {
        self.config.environment.is_production()
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}/api{path}", self.config.domain())
    }

    /// Where a buyer is sent to deposit funds for a transaction.
    pub fn deposit_link(&self, transaction_id: &str) -> String {
        format!("https://{}/transaction/{transaction_id}/deposit", self.config.domain())
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, EscrowApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                EscrowApiError::Timeout
            } else {
                EscrowApiError::ResponseError(e.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.map_err(|e| EscrowApiError::ResponseError(e.to_string()))?;
            return Err(EscrowApiError::QueryError { status: status.as_u16(), message });
        }
        trace!("REST query successful. {status}");
        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Null).map_err(|e| EscrowApiError::JsonError(e.to_string()));
        }
        let value = response.json::<Value>().await.map_err(|e| EscrowApiError::JsonError(e.to_string()))?;
        // A 200 with an `error` field is still a failure. The message can contain CRLF; trim it so it
        // reads properly on an order note.
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return Err(EscrowApiError::RemoteError(error.trim().to_string()));
        }
        serde_json::from_value(value).map_err(|e| EscrowApiError::JsonError(e.to_string()))
    }

    pub async fn create_transaction(
        &self,
        meta: NewTransaction,
        allocations: Vec<NewAllocation>,
        parties: Vec<PartyInput>,
    ) -> Result<TransactionRef, EscrowApiError> {
        debug!("Creating escrow transaction '{}' with {} allocation(s), {} parties", meta.title, allocations.len(), parties.len());
        let body = serde_json::json!({
            "transaction": meta,
            "allocations": allocations,
            "parties": parties,
        });
        let result = self.rest_query::<TransactionRef, Value>(Method::POST, "/transaction", Some(body)).await?;
        info!("Created escrow transaction {}", result.id);
        Ok(result)
    }

    pub async fn get_transaction(&self, id: &str) -> Result<TransactionSnapshot, EscrowApiError> {
        let path = format!("/transaction/{id}");
        self.rest_query::<TransactionSnapshot, ()>(Method::GET, &path, None).await
    }

    pub async fn allocation_start_delivery(&self, allocation_id: &str) -> Result<(), EscrowApiError> {
        debug!("Starting delivery for allocation {allocation_id}");
        let path = format!("/allocation/{allocation_id}/start-delivery");
        self.rest_query::<Value, ()>(Method::POST, &path, None).await.map(|_| ())
    }

    pub async fn allocation_complete_delivery(&self, allocation_id: &str) -> Result<(), EscrowApiError> {
        debug!("Completing delivery for allocation {allocation_id}");
        let path = format!("/allocation/{allocation_id}/complete-delivery");
        self.rest_query::<Value, ()>(Method::POST, &path, None).await.map(|_| ())
    }

    pub async fn cancel_transaction(&self, id: &str, reason: &str) -> Result<(), EscrowApiError> {
        debug!("Cancelling escrow transaction {id}: {reason}");
        let path = format!("/transaction/{id}/cancel");
        let body = serde_json::json!({ "reason": reason });
        self.rest_query::<Value, Value>(Method::POST, &path, Some(body)).await.map(|_| ())
    }

    pub async fn create_token(&self, identity: TokenIdentity) -> Result<TokenRef, EscrowApiError> {
        debug!("Creating token for {}", identity.email);
        let result = self.rest_query::<TokenRef, TokenIdentity>(Method::POST, "/token", Some(identity)).await?;
        info!("Created token {}", result.id);
        Ok(result)
    }

    pub async fn get_token(&self, id: &str) -> Result<TokenDetails, EscrowApiError> {
        let path = format!("/token/{id}");
        self.rest_query::<TokenDetails, ()>(Method::GET, &path, None).await
    }

    pub async fn get_calculation(
        &self,
        base_value: f64,
        fee_allocation: &str,
        industry: &str,
    ) -> Result<Calculation, EscrowApiError> {
        let body = serde_json::json!({
            "baseValue": base_value,
            "feeAllocation": fee_allocation,
            "industry": industry,
        });
        self.rest_query::<Calculation, Value>(Method::POST, "/calculation", Some(body)).await
    }

    pub async fn profile(&self) -> Result<Profile, EscrowApiError> {
        self.rest_query::<Profile, ()>(Method::GET, "/profile", None).await
    }

    /// Health of the API and authentication domains. Never fails; a transport error is reported in the
    /// result itself, since this call backs a diagnostics page.
    pub async fn ping(&self) -> PingResult {
        match self.rest_query::<PingResult, ()>(Method::GET, "/ping", None).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Escrow service ping failed: {e}");
                let api = PingStatus {
                    status: false,
                    domain: self.config.domain().to_string(),
                    reason: Some(e.to_string()),
                };
                let auth =
                    PingStatus { status: false, domain: self.config.auth_domain.clone(), reason: None };
                PingResult { api, auth }
            },
        }
    }
}
