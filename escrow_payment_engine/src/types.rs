use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use epg_common::{Cents, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------       OrderId        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    TransactionId     --------------------------------------------------------
/// Identifier of the remote escrow transaction an order is linked to. The link is written exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     OrderStatus      --------------------------------------------------------
/// The merchant-side order status. The escrow flow only ever moves an order *forward* along
/// pending → on-hold → processing → delivered → completed; the failure paths are terminal, except that
/// `Failed` can be rescued by a later funds-deposited/received callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Awaiting payment. The initial status once checkout hands the order to the gateway.
    Pending,
    /// Funds have been deposited but not yet cleared (manual EFT).
    OnHold,
    /// Funds are held in trust; delivery is underway.
    Processing,
    /// The merchant has handed the goods over. Local-only intermediate status.
    Delivered,
    /// Funds released to the parties.
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// No callback or local trigger may move an order out of these statuses.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::OnHold => write!(f, "on-hold"),
            OrderStatus::Processing => write!(f, "processing"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Refunded => write!(f, "refunded"),
            OrderStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct OrderStatusConversionError(String);

impl FromStr for OrderStatus {
    type Err = OrderStatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "on-hold" => Ok(Self::OnHold),
            "processing" => Ok(Self::Processing),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            "failed" => Ok(Self::Failed),
            s => Err(OrderStatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------   AllocationState    --------------------------------------------------------
/// The remote allocation lifecycle, in its allowed forward order. `Declined` and `Cancelled` are
/// terminal alternatives reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationState {
    PendingAcceptance,
    Initiated,
    Delivered,
    FundsReleased,
    Declined,
    Cancelled,
}

impl AllocationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AllocationState::FundsReleased | AllocationState::Declined | AllocationState::Cancelled)
    }
}

impl Display for AllocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationState::PendingAcceptance => write!(f, "PENDING_ACCEPTANCE"),
            AllocationState::Initiated => write!(f, "INITIATED"),
            AllocationState::Delivered => write!(f, "DELIVERED"),
            AllocationState::FundsReleased => write!(f, "FUNDS_RELEASED"),
            AllocationState::Declined => write!(f, "DECLINED"),
            AllocationState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown allocation state: {0}")]
pub struct UnknownAllocationState(pub String);

impl FromStr for AllocationState {
    type Err = UnknownAllocationState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_ACCEPTANCE" => Ok(Self::PendingAcceptance),
            "INITIATED" => Ok(Self::Initiated),
            "DELIVERED" => Ok(Self::Delivered),
            "FUNDS_RELEASED" => Ok(Self::FundsReleased),
            "DECLINED" => Ok(Self::Declined),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(UnknownAllocationState(s.to_string())),
        }
    }
}

//--------------------------------------    CallbackState     --------------------------------------------------------
/// The state declared by an inbound notification. Anything outside the recognized vocabulary is carried
/// as `Other` and ignored by the dispatcher rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackState {
    FundsDeposited,
    FundsReceived,
    FundsReleased,
    Other(String),
}

impl From<&str> for CallbackState {
    fn from(s: &str) -> Self {
        match s {
            "FUNDS_DEPOSITED" => Self::FundsDeposited,
            "FUNDS_RECEIVED" => Self::FundsReceived,
            "FUNDS_RELEASED" => Self::FundsReleased,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for CallbackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackState::FundsDeposited => write!(f, "FUNDS_DEPOSITED"),
            CallbackState::FundsReceived => write!(f, "FUNDS_RECEIVED"),
            CallbackState::FundsReleased => write!(f, "FUNDS_RELEASED"),
            CallbackState::Other(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------       Parties        --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyRole {
    Buyer,
    Seller,
    BeneficiaryMerchant,
}

impl Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartyRole::Buyer => write!(f, "BUYER"),
            PartyRole::Seller => write!(f, "SELLER"),
            PartyRole::BeneficiaryMerchant => write!(f, "BENEFICIARY_MERCHANT"),
        }
    }
}

/// A remote identity token. Must be non-empty for a party to be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeType {
    Flat,
}

impl Display for FeeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeType::Flat => write!(f, "FLAT"),
        }
    }
}

/// Who absorbs a fee: the escrow service's processing fee uses the three-way split; a
/// beneficiary-merchant fee is always carried on the seller side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeAllocation {
    Buyer,
    Seller,
    BuyerSeller,
}

impl Display for FeeAllocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeAllocation::Buyer => write!(f, "BUYER"),
            FeeAllocation::Seller => write!(f, "SELLER"),
            FeeAllocation::BuyerSeller => write!(f, "BUYER_SELLER"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid fee allocation: {0}")]
pub struct FeeAllocationConversionError(String);

impl FromStr for FeeAllocation {
    type Err = FeeAllocationConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUYER" => Ok(Self::Buyer),
            "SELLER" => Ok(Self::Seller),
            "BUYER_SELLER" => Ok(Self::BuyerSeller),
            s => Err(FeeAllocationConversionError(s.to_string())),
        }
    }
}

/// A role-bound participant on a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub role: PartyRole,
    pub token: TokenId,
    /// The net amount payable to a beneficiary merchant. Absent for buyer and seller.
    pub fee: Option<Cents>,
    pub fee_type: Option<FeeType>,
    pub fee_allocation: Option<FeeAllocation>,
}

impl Party {
    pub fn buyer(token: TokenId) -> Self {
        Self { role: PartyRole::Buyer, token, fee: None, fee_type: None, fee_allocation: None }
    }

    pub fn seller(token: TokenId) -> Self {
        Self { role: PartyRole::Seller, token, fee: None, fee_type: None, fee_allocation: None }
    }

    pub fn beneficiary(token: TokenId, net_payable: Cents) -> Self {
        Self {
            role: PartyRole::BeneficiaryMerchant,
            token,
            fee: Some(net_payable),
            fee_type: Some(FeeType::Flat),
            fee_allocation: Some(FeeAllocation::Seller),
        }
    }
}

//--------------------------------------        Orders        --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    /// The vendor that owns the product. In single-merchant mode every item carries the storefront's
    /// own vendor id.
    pub vendor_id: String,
    pub total: Cents,
}

/// Billing identity captured at checkout. Used to issue a token for guest buyers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingIdentity {
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub subtotal: Cents,
    pub discount_total: Cents,
    pub shipping_total: Cents,
    pub tax_total: Cents,
    pub currency: String,
    pub items: Vec<LineItem>,
    /// `None` for guest checkouts. Registered customers resolve their buyer token via the registry.
    pub customer_id: Option<String>,
    pub billing: BillingIdentity,
    /// Immutable once set. See [`crate::traits::OrderStore::set_transaction_id`].
    pub transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The amount placed in escrow: subtotal less discounts, plus shipping and tax.
    pub fn base_value(&self) -> Cents {
        self.subtotal - self.discount_total + self.shipping_total + self.tax_total
    }

    pub fn total(&self) -> Cents {
        self.base_value()
    }

    /// Line totals aggregated per owning vendor, in first-seen order.
    pub fn vendor_totals(&self) -> Vec<VendorTotal> {
        let mut totals: Vec<VendorTotal> = Vec::new();
        for item in &self.items {
            match totals.iter_mut().find(|v| v.vendor_id == item.vendor_id) {
                Some(v) => v.total = v.total + item.total,
                None => totals.push(VendorTotal { vendor_id: item.vendor_id.clone(), total: item.total }),
            }
        }
        totals
    }

    /// One line per item, used as the transaction description.
    pub fn item_summary(&self) -> String {
        self.items.iter().map(|i| format!("{}: {}", i.name, i.total)).collect::<Vec<_>>().join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorTotal {
    pub vendor_id: String,
    pub total: Cents,
}

//--------------------------------------     Allocations      --------------------------------------------------------
/// Input for a new remote allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAllocation {
    pub title: String,
    pub description: String,
    pub value: Cents,
    pub days_to_deliver: i64,
    pub days_to_inspect: i64,
}

/// Metadata for a new remote transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMeta {
    pub title: String,
    pub description: String,
    pub industry: String,
    pub fee_allocation: FeeAllocation,
    pub reference: String,
}

/// Remote allocation id + state as observed via `get_transaction`.
#[derive(Debug, Clone)]
pub struct AllocationStatus {
    pub id: String,
    pub state: AllocationState,
}

/// A point-in-time view of the remote transaction.
#[derive(Debug, Clone)]
pub struct TransactionSnapshot {
    pub id: TransactionId,
    pub allocations: Vec<AllocationStatus>,
}

/// The subset of remote token detail the gateway needs for visibility gating.
#[derive(Debug, Clone, Default)]
pub struct TokenSummary {
    pub id: TokenId,
    /// KYC id number on file. Required for a buyer to transact.
    pub has_id_number: bool,
    /// Verified bank account on file. Required for a marketplace seller to receive funds.
    pub has_bank_account: bool,
    pub mobile: Option<String>,
}

//--------------------------------------    Fee breakdown     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommissionType {
    Fixed,
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutFeeAllocation {
    /// The storefront absorbs the payout fee.
    Seller,
    /// Vendors absorb the payout fee out of their nets.
    Vendor,
}

/// Commission and payout-fee settings in effect for a transaction.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    pub commission_type: CommissionType,
    /// Percentage points for [`CommissionType::Percentage`]; a Rand amount for [`CommissionType::Fixed`].
    pub commission_value: f64,
    pub payout_fee: Cents,
    pub payout_fee_allocation: PayoutFeeAllocation,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            commission_type: CommissionType::Percentage,
            commission_value: 10.0,
            payout_fee: Cents::from(0),
            payout_fee_allocation: PayoutFeeAllocation::Seller,
        }
    }
}

/// The computed fee split for one transaction, persisted against the order for receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub base_value: Cents,
    /// The escrow service's own fee, as quoted by `get_calculation`.
    pub processing_fee: Cents,
    pub commission_total: Cents,
    pub payout_fee_total: Cents,
    /// One net payable per vendor. Empty outside marketplace mode.
    pub vendor_nets: Vec<VendorNet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorNet {
    pub vendor_id: String,
    pub total: Cents,
    pub commission: Cents,
    pub payout_fee: Cents,
    pub net_payable: Cents,
}

//--------------------------------------      Settings        --------------------------------------------------------
/// Resolved configuration handed to the engine at startup. The engine never reads ambient
/// configuration; everything it needs arrives here.
#[derive(Debug, Clone)]
pub struct EscrowSettings {
    /// Key for the callback signature check.
    pub client_secret: Secret<String>,
    pub industry: String,
    /// Who absorbs the escrow processing fee.
    pub fee_allocation: FeeAllocation,
    pub marketplace: bool,
    pub schedule: FeeSchedule,
    pub days_to_deliver: i64,
    pub days_to_inspect: i64,
}

impl Default for EscrowSettings {
    fn default() -> Self {
        Self {
            client_secret: Secret::new(String::default()),
            industry: "GENERAL_GOODS_SERVICES".to_string(),
            fee_allocation: FeeAllocation::Seller,
            marketplace: false,
            schedule: FeeSchedule::default(),
            days_to_deliver: 14,
            days_to_inspect: 7,
        }
    }
}
