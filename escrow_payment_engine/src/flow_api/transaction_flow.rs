use chrono::Utc;
use log::*;

use crate::{
    callbacks::{CallbackEvent, CallbackPayload},
    fees::allocate_fees,
    flow_api::errors::EscrowError,
    helpers::OrderLocks,
    party::PartyResolver,
    traits::{EscrowGateway, OrderStore, TokenRegistry},
    types::{
        AllocationState,
        AllocationStatus,
        CallbackState,
        EscrowSettings,
        NewAllocation,
        Order,
        OrderId,
        OrderStatus,
        TransactionId,
        TransactionMeta,
    },
};

/// Result of a successful checkout hand-off: the linked transaction and where to send the buyer to
/// deposit funds.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub transaction_id: TransactionId,
    pub redirect: String,
}

/// `TransactionFlowApi` drives the remote escrow transaction and the local order status in lockstep.
///
/// Local triggers (merchant marks an order completed, delivered, cancelled or refunded) and remote
/// triggers (verified callback events) both funnel through here. Every operation takes the order's
/// critical section before reading state, so a racing callback and local trigger cannot both act on a
/// stale view. Local state is only ever mutated after the remote side has acknowledged the
/// corresponding call.
pub struct TransactionFlowApi<G, S, R> {
    gateway: G,
    store: S,
    registry: R,
    settings: EscrowSettings,
    locks: OrderLocks,
}

impl<G, S, R> TransactionFlowApi<G, S, R>
where
    G: EscrowGateway,
    S: OrderStore,
    R: TokenRegistry,
{
    pub fn new(gateway: G, store: S, registry: R, settings: EscrowSettings) -> Self {
        Self { gateway, store, registry, settings, locks: OrderLocks::new() }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn settings(&self) -> &EscrowSettings {
        &self.settings
    }

    /// Create the escrow transaction for an order and link it.
    ///
    /// Idempotent at the order level: when the order already carries a transaction id, no remote
    /// create is issued and the existing deposit link is returned, no matter how many times checkout
    /// fires. Otherwise the full sequence runs: quote the processing fee, compute the fee breakdown,
    /// resolve every party (issuing a guest buyer token when needed), create the remote transaction,
    /// and only then write the (immutable) link, the fee breakdown and the pending status.
    pub async fn create_transaction(&self, order_id: &OrderId) -> Result<CheckoutOutcome, EscrowError> {
        let _guard = self.locks.acquire(order_id).await;
        let order = self.fetch(order_id).await?;
        if let Some(txid) = &order.transaction_id {
            debug!("🔁️ Order {order_id} is already linked to transaction {txid}; not creating another");
            return Ok(CheckoutOutcome {
                transaction_id: txid.clone(),
                redirect: self.gateway.deposit_link(txid),
            });
        }
        match self.create_transaction_inner(&order).await {
            Ok(outcome) => {
                self.store.update_status(order_id, OrderStatus::Pending, "Awaiting payment.").await?;
                info!("🔁️ Order {order_id} linked to escrow transaction {}", outcome.transaction_id);
                Ok(outcome)
            },
            Err(e) => {
                self.fail_order(order_id, &e).await;
                Err(e)
            },
        }
    }

    async fn create_transaction_inner(&self, order: &Order) -> Result<CheckoutOutcome, EscrowError> {
        let base_value = order.base_value();
        let processing_fee = self
            .gateway
            .get_calculation(base_value, self.settings.fee_allocation, &self.settings.industry)
            .await?;
        let vendors = if self.settings.marketplace { order.vendor_totals() } else { Vec::new() };
        let breakdown = allocate_fees(base_value, processing_fee, &self.settings.schedule, &vendors)?;

        let seller_token = self.gateway.profile_token().await?;
        let guest_buyer_token = match &order.customer_id {
            Some(_) => None,
            None => {
                debug!("🔁️ Order {} is a guest checkout; issuing a buyer token", order.id);
                Some(self.gateway.create_token(&order.billing).await?)
            },
        };
        let resolver = PartyResolver::new(&self.registry);
        let parties = resolver.resolve(order, seller_token, guest_buyer_token, &breakdown).await?;

        let title = format!("Order {}", order.id.as_str());
        let description = order.item_summary();
        let allocations = [NewAllocation {
            title: title.clone(),
            description: description.clone(),
            value: base_value,
            days_to_deliver: self.settings.days_to_deliver,
            days_to_inspect: self.settings.days_to_inspect,
        }];
        let meta = TransactionMeta {
            title,
            description,
            industry: self.settings.industry.clone(),
            fee_allocation: self.settings.fee_allocation,
            reference: format!("{}-{}", order.id.as_str(), Utc::now().timestamp()),
        };
        let txid = self.gateway.create_transaction(&meta, &allocations, &parties).await?;
        self.store.set_transaction_id(&order.id, &txid).await?;
        self.store.save_fee_breakdown(&order.id, &breakdown).await?;
        Ok(CheckoutOutcome { redirect: self.gateway.deposit_link(&txid), transaction_id: txid })
    }

    /// Local trigger: the merchant marked the order completed.
    ///
    /// Reads the remote allocation state first. If delivery is underway (INITIATED), completion is
    /// requested remotely and the order moves to `delivered`. If the remote side is already at or past
    /// delivery, or the buyer has not accepted yet, nothing happens. Any other observed state is an
    /// inconsistency: the order is marked failed and the fault is raised to the merchant.
    pub async fn advance_on_order_completed(&self, order_id: &OrderId) -> Result<(), EscrowError> {
        let _guard = self.locks.acquire(order_id).await;
        let order = self.fetch(order_id).await?;
        let Some(txid) = order.transaction_id.clone() else {
            trace!("🔁️ Order {order_id} has no escrow transaction; nothing to do");
            return Ok(());
        };
        match self.complete_inner(&order, &txid).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.fail_order(order_id, &e).await;
                Err(e)
            },
        }
    }

    async fn complete_inner(&self, order: &Order, txid: &TransactionId) -> Result<(), EscrowError> {
        let allocation = self.first_allocation(txid).await?;
        match allocation.state {
            AllocationState::Initiated => {
                self.gateway.allocation_complete_delivery(&allocation.id).await?;
                self.store
                    .update_status(&order.id, OrderStatus::Delivered, "Delivery completion requested from the escrow service.")
                    .await?;
                info!("🔁️ Order {} delivery completion requested (allocation {})", order.id, allocation.id);
                Ok(())
            },
            AllocationState::Delivered | AllocationState::FundsReleased | AllocationState::PendingAcceptance => {
                debug!(
                    "🔁️ Order {} completed locally while the remote allocation is {}; nothing to do",
                    order.id, allocation.state
                );
                Ok(())
            },
            observed => Err(EscrowError::Inconsistency { operation: "order completed", observed }),
        }
    }

    /// Local trigger: the merchant marked the order delivered. Requests delivery completion unless the
    /// buyer has not accepted the transaction yet.
    pub async fn advance_on_order_delivered(&self, order_id: &OrderId) -> Result<(), EscrowError> {
        let _guard = self.locks.acquire(order_id).await;
        let order = self.fetch(order_id).await?;
        let Some(txid) = order.transaction_id.clone() else {
            trace!("🔁️ Order {order_id} has no escrow transaction; nothing to do");
            return Ok(());
        };
        let result = async {
            let allocation = self.first_allocation(&txid).await?;
            if allocation.state == AllocationState::PendingAcceptance {
                debug!("🔁️ Order {order_id} is still pending acceptance; not completing delivery");
            } else {
                self.gateway.allocation_complete_delivery(&allocation.id).await?;
                info!("🔁️ Order {order_id} delivery completion requested (allocation {})", allocation.id);
            }
            Ok(())
        }
        .await;
        if let Err(e) = &result {
            self.fail_order(order_id, e).await;
        }
        result
    }

    /// Local trigger: the order was cancelled or refunded. Cancellation is always requested; whether
    /// the transaction may still be cancelled is the remote side's decision.
    pub async fn cancel_on_order_closed(&self, order_id: &OrderId, reason: &str) -> Result<(), EscrowError> {
        let _guard = self.locks.acquire(order_id).await;
        let order = self.fetch(order_id).await?;
        let Some(txid) = order.transaction_id.clone() else {
            trace!("🔁️ Order {order_id} has no escrow transaction; nothing to cancel");
            return Ok(());
        };
        match self.gateway.cancel_transaction(&txid, reason).await {
            Ok(()) => {
                info!("🔁️ Cancellation of transaction {txid} requested for order {order_id}");
                Ok(())
            },
            Err(e) => {
                let e = EscrowError::from(e);
                self.fail_order(order_id, &e).await;
                Err(e)
            },
        }
    }

    /// Remote trigger: apply a verified callback event.
    ///
    /// The signature is checked before anything else; then the unique order linked to the declared
    /// transaction id is resolved (two matches is a fatal integrity violation). The declared state
    /// maps onto a forward-only local transition, which is what makes duplicate and reordered
    /// deliveries idempotent: a state the order has already reached or left behind changes nothing
    /// and triggers no remote call.
    pub async fn process_callback(&self, payload: &CallbackPayload) -> Result<(), EscrowError> {
        payload.verify(self.settings.client_secret.reveal())?;
        let event = CallbackEvent::from(payload);
        let order = self
            .store
            .find_order_by_transaction_id(&event.transaction_id)
            .await?
            .ok_or_else(|| EscrowError::UnknownTransaction(event.transaction_id.clone()))?;
        let _guard = self.locks.acquire(&order.id).await;
        // Re-read under the lock; a racing trigger may have advanced the order since resolution.
        let order = self.fetch(&order.id).await?;
        debug!(
            "📥️ Callback {} for transaction {} at {} (order {}, currently {})",
            event.state, event.transaction_id, event.received_at, order.id, order.status
        );
        self.apply_callback(&order, &event.transaction_id, event.state).await
    }

    async fn apply_callback(
        &self,
        order: &Order,
        txid: &TransactionId,
        state: CallbackState,
    ) -> Result<(), EscrowError> {
        match state {
            CallbackState::FundsDeposited => {
                if matches!(order.status, OrderStatus::Pending | OrderStatus::Failed) {
                    self.store
                        .update_status(&order.id, OrderStatus::OnHold, "Awaiting manual EFT payment.")
                        .await?;
                } else {
                    debug!("📥️ Ignoring FUNDS_DEPOSITED for order {} in status {}", order.id, order.status);
                }
                Ok(())
            },
            CallbackState::FundsReceived => {
                if matches!(order.status, OrderStatus::Pending | OrderStatus::OnHold | OrderStatus::Failed) {
                    let allocation = self.first_allocation(txid).await?;
                    self.gateway.allocation_start_delivery(&allocation.id).await?;
                    self.store
                        .update_status(
                            &order.id,
                            OrderStatus::Processing,
                            "Funds have been received by the escrow service.",
                        )
                        .await?;
                } else {
                    debug!("📥️ Ignoring FUNDS_RECEIVED for order {} in status {}", order.id, order.status);
                }
                Ok(())
            },
            CallbackState::FundsReleased => {
                if order.status.is_terminal() {
                    debug!("📥️ Order {} is already {}; FUNDS_RELEASED changes nothing", order.id, order.status);
                } else {
                    self.store
                        .update_status(
                            &order.id,
                            OrderStatus::Completed,
                            "Transaction completed. Paying out funds to parties.",
                        )
                        .await?;
                }
                Ok(())
            },
            CallbackState::Other(s) => {
                debug!("📥️ Ignoring unrecognized callback state '{s}' for transaction {txid}");
                Ok(())
            },
        }
    }

    async fn fetch(&self, order_id: &OrderId) -> Result<Order, EscrowError> {
        self.store
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| EscrowError::OrderNotFound(order_id.clone()))
    }

    async fn first_allocation(&self, txid: &TransactionId) -> Result<AllocationStatus, EscrowError> {
        let snapshot = self.gateway.get_transaction(txid).await?;
        snapshot
            .allocations
            .into_iter()
            .next()
            .ok_or_else(|| EscrowError::Integrity(format!("Transaction {txid} has no allocations")))
    }

    /// A fault from a local trigger is made visible on the order itself: status failed, fault message
    /// as the note. Best effort; the original fault still propagates to the caller.
    async fn fail_order(&self, order_id: &OrderId, fault: &EscrowError) {
        warn!("🔁️ Order {order_id} failed: {fault}");
        if let Err(e) = self.store.update_status(order_id, OrderStatus::Failed, &fault.to_string()).await {
            error!("🔁️ Could not mark order {order_id} as failed. {e}");
        }
    }
}
