//! Wire types for the escrow service's REST API. Field names follow the remote convention (camelCase).

use serde::{Deserialize, Serialize};

//--------------------------------------   Transactions   ------------------------------------------------------------

/// Metadata for a new escrow transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub title: String,
    pub description: String,
    pub industry: String,
    pub fee_allocation: String,
    /// A merchant-side reference. Not interpreted by the remote service.
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAllocation {
    pub title: String,
    pub description: String,
    /// Amount in major units, as the remote service expects.
    pub value: f64,
    pub days_to_deliver: i64,
    pub days_to_inspect: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInput {
    pub role: String,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_allocation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRef {
    pub id: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSnapshot {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
    pub allocations: Vec<AllocationRef>,
}

//--------------------------------------      Tokens      ------------------------------------------------------------

/// Identity details submitted when issuing a token for a party that has never transacted before.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdentity {
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUser {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    /// National id number. Presence of this field is what makes a buyer token usable.
    #[serde(default)]
    pub id_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub branch_code: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    pub id: String,
    #[serde(default)]
    pub user: TokenUser,
    #[serde(default)]
    pub bank_account: BankAccount,
}

//--------------------------------------   Calculations   ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub base_value: f64,
    pub processing_fee_total: f64,
    #[serde(default)]
    pub processing_fee_vat: Option<f64>,
    #[serde(default)]
    pub total_value: Option<f64>,
}

//--------------------------------------     Profile      ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOrganization {
    pub name: String,
    #[serde(default)]
    pub registration: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    #[serde(default)]
    pub mobile: Option<String>,
}

/// The merchant's own registered identity. `id` is the token used for the SELLER role on every transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub organization: ProfileOrganization,
    pub user: ProfileUser,
}

//--------------------------------------       Ping       ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingStatus {
    pub status: bool,
    pub domain: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResult {
    pub api: PingStatus,
    pub auth: PingStatus,
}
