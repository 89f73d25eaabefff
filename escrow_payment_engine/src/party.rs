//! Role-to-token resolution.
//!
//! Every transaction needs a BUYER, a SELLER, and (in marketplace mode) one BENEFICIARY_MERCHANT per
//! vendor, each carrying a previously-issued token. Resolution is all-or-nothing: any role without a
//! token makes the whole set unusable, and the caller must not submit the transaction nor auto-retry.

use std::fmt::Display;

use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    traits::{TokenRegistry, TokenRegistryError},
    types::{FeeBreakdown, Order, Party, PartyRole, TokenId},
};

/// A role that could not be resolved, with enough context to act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingToken {
    pub role: PartyRole,
    /// The local actor the role maps to: a customer id, vendor id, or the merchant profile.
    pub subject: String,
}

impl Display for MissingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.role, self.subject)
    }
}

#[derive(Debug, Clone, Error)]
pub enum PartyResolutionError {
    #[error("No token issued for: {}", .0.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", "))]
    MissingTokens(Vec<MissingToken>),
    #[error("{0}")]
    Registry(#[from] TokenRegistryError),
}

pub struct PartyResolver<'a, R: TokenRegistry> {
    registry: &'a R,
}

impl<'a, R: TokenRegistry> PartyResolver<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// Resolve the full party set for an order.
    ///
    /// * The buyer token comes from the registry for registered customers, or is the freshly-issued
    ///   guest token the caller obtained from the escrow service.
    /// * The seller token is the merchant's own profile token.
    /// * Each vendor in the fee breakdown becomes a beneficiary merchant carrying its net payable.
    ///
    /// Every missing role is enumerated in the error; resolution never stops at the first gap.
    pub async fn resolve(
        &self,
        order: &Order,
        seller_token: TokenId,
        guest_buyer_token: Option<TokenId>,
        breakdown: &FeeBreakdown,
    ) -> Result<Vec<Party>, PartyResolutionError> {
        let mut missing = Vec::new();
        let mut parties = Vec::with_capacity(2 + breakdown.vendor_nets.len());

        let buyer_token = match &order.customer_id {
            Some(customer_id) => self.registry.token_for_customer(customer_id).await?,
            None => guest_buyer_token,
        };
        match buyer_token {
            Some(token) if !token.is_empty() => parties.push(Party::buyer(token)),
            _ => {
                let subject = order.customer_id.clone().unwrap_or_else(|| "guest".to_string());
                missing.push(MissingToken { role: PartyRole::Buyer, subject });
            },
        }

        if seller_token.is_empty() {
            missing.push(MissingToken { role: PartyRole::Seller, subject: "merchant profile".to_string() });
        } else {
            parties.push(Party::seller(seller_token));
        }

        for vendor in &breakdown.vendor_nets {
            match self.registry.token_for_vendor(&vendor.vendor_id).await? {
                Some(token) if !token.is_empty() => {
                    parties.push(Party::beneficiary(token, vendor.net_payable));
                },
                _ => missing.push(MissingToken {
                    role: PartyRole::BeneficiaryMerchant,
                    subject: vendor.vendor_id.clone(),
                }),
            }
        }

        if missing.is_empty() {
            Ok(parties)
        } else {
            warn!("🧾️ Order {} has unresolved parties: {}", order.id, PartyResolutionError::MissingTokens(missing.clone()));
            Err(PartyResolutionError::MissingTokens(missing))
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use chrono::Utc;
    use epg_common::Cents;

    use super::*;
    use crate::{
        fees::allocate_fees,
        types::{BillingIdentity, FeeSchedule, LineItem, OrderId, OrderStatus, PayoutFeeAllocation},
    };

    #[derive(Clone, Default)]
    struct MapRegistry {
        customers: HashMap<String, TokenId>,
        vendors: HashMap<String, TokenId>,
    }

    impl TokenRegistry for MapRegistry {
        async fn token_for_customer(&self, customer_id: &str) -> Result<Option<TokenId>, TokenRegistryError> {
            Ok(self.customers.get(customer_id).cloned())
        }

        async fn token_for_vendor(&self, vendor_id: &str) -> Result<Option<TokenId>, TokenRegistryError> {
            Ok(self.vendors.get(vendor_id).cloned())
        }
    }

    fn order_with_vendors(customer: Option<&str>, vendors: &[(&str, i64)]) -> Order {
        let items = vendors
            .iter()
            .map(|(v, rands)| LineItem {
                name: format!("Item from {v}"),
                vendor_id: v.to_string(),
                total: Cents::from_rands(*rands),
            })
            .collect::<Vec<_>>();
        let subtotal = items.iter().map(|i| i.total).sum();
        Order {
            id: OrderId("1001".into()),
            status: OrderStatus::Pending,
            subtotal,
            discount_total: Cents::from(0),
            shipping_total: Cents::from(0),
            tax_total: Cents::from(0),
            currency: "ZAR".to_string(),
            items,
            customer_id: customer.map(String::from),
            billing: BillingIdentity::default(),
            transaction_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn marketplace_breakdown(order: &Order) -> FeeBreakdown {
        let schedule = FeeSchedule {
            payout_fee_allocation: PayoutFeeAllocation::Seller,
            ..FeeSchedule::default()
        };
        allocate_fees(order.base_value(), Cents::from(0), &schedule, &order.vendor_totals()).unwrap()
    }

    #[tokio::test]
    async fn resolves_all_roles() {
        let order = order_with_vendors(Some("cust-7"), &[("vendor-a", 600), ("vendor-b", 400)]);
        let breakdown = marketplace_breakdown(&order);
        let mut registry = MapRegistry::default();
        registry.customers.insert("cust-7".into(), TokenId("tok-buyer".into()));
        registry.vendors.insert("vendor-a".into(), TokenId("tok-a".into()));
        registry.vendors.insert("vendor-b".into(), TokenId("tok-b".into()));
        let resolver = PartyResolver::new(&registry);
        let parties =
            resolver.resolve(&order, TokenId("tok-seller".into()), None, &breakdown).await.unwrap();
        assert_eq!(parties.len(), 4);
        assert_eq!(parties[0].role, PartyRole::Buyer);
        assert_eq!(parties[1].role, PartyRole::Seller);
        let beneficiaries: Vec<_> =
            parties.iter().filter(|p| p.role == PartyRole::BeneficiaryMerchant).collect();
        assert_eq!(beneficiaries.len(), 2);
        assert!(beneficiaries.iter().all(|p| p.fee.is_some()));
    }

    #[tokio::test]
    async fn guest_buyer_uses_issued_token() {
        let order = order_with_vendors(None, &[("vendor-a", 100)]);
        let breakdown = marketplace_breakdown(&order);
        let mut registry = MapRegistry::default();
        registry.vendors.insert("vendor-a".into(), TokenId("tok-a".into()));
        let resolver = PartyResolver::new(&registry);
        let parties = resolver
            .resolve(&order, TokenId("tok-seller".into()), Some(TokenId("tok-guest".into())), &breakdown)
            .await
            .unwrap();
        assert_eq!(parties[0].token, TokenId("tok-guest".into()));
    }

    #[tokio::test]
    async fn enumerates_every_missing_role() {
        let order = order_with_vendors(Some("cust-7"), &[("vendor-a", 600), ("vendor-b", 400)]);
        let breakdown = marketplace_breakdown(&order);
        // Only vendor-a has a token; the buyer and vendor-b are unresolved, and the seller token is empty.
        let mut registry = MapRegistry::default();
        registry.vendors.insert("vendor-a".into(), TokenId("tok-a".into()));
        let resolver = PartyResolver::new(&registry);
        let err = resolver
            .resolve(&order, TokenId(String::new()), None, &breakdown)
            .await
            .unwrap_err();
        match err {
            PartyResolutionError::MissingTokens(missing) => {
                assert_eq!(missing.len(), 3);
                assert!(missing.iter().any(|m| m.role == PartyRole::Buyer && m.subject == "cust-7"));
                assert!(missing.iter().any(|m| m.role == PartyRole::Seller));
                assert!(missing
                    .iter()
                    .any(|m| m.role == PartyRole::BeneficiaryMerchant && m.subject == "vendor-b"));
            },
            e => panic!("Expected MissingTokens, got {e}"),
        }
    }

    #[tokio::test]
    async fn empty_string_token_counts_as_missing() {
        let order = order_with_vendors(Some("cust-7"), &[("vendor-a", 100)]);
        let breakdown = marketplace_breakdown(&order);
        let mut registry = MapRegistry::default();
        registry.customers.insert("cust-7".into(), TokenId(String::new()));
        registry.vendors.insert("vendor-a".into(), TokenId("tok-a".into()));
        let resolver = PartyResolver::new(&registry);
        let err =
            resolver.resolve(&order, TokenId("tok-seller".into()), None, &breakdown).await.unwrap_err();
        assert!(matches!(err, PartyResolutionError::MissingTokens(m) if m.len() == 1));
    }
}
