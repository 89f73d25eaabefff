//! Multi-party fee allocation.
//!
//! Pure and deterministic: the quoted processing fee comes in as an argument (the orchestrator fetches
//! it from the escrow service), so nothing in here performs I/O. All arithmetic is in cents; flat
//! amounts are apportioned with a largest-remainder scheme so the conservation property
//! `commission + payout fees + Σ nets = Σ vendor totals` holds exactly.

use epg_common::Cents;
use thiserror::Error;

use crate::types::{CommissionType, FeeBreakdown, FeeSchedule, PayoutFeeAllocation, VendorNet, VendorTotal};

#[derive(Debug, Clone, Error)]
pub enum FeeError {
    #[error("Base value must be positive, got {0}")]
    NonPositiveBaseValue(Cents),
    #[error("Vendor {vendor_id} would be paid a negative amount ({amount})")]
    NegativePayable { vendor_id: String, amount: Cents },
    #[error("Beneficiary fees plus commission ({allocated}) exceed the allocation value ({base})")]
    AllocationExceeded { allocated: Cents, base: Cents },
}

/// Compute the fee split for one transaction.
///
/// `vendors` is empty outside marketplace mode, in which case the breakdown carries the processing
/// fee only and no commission is taken.
pub fn allocate_fees(
    base_value: Cents,
    processing_fee: Cents,
    schedule: &FeeSchedule,
    vendors: &[VendorTotal],
) -> Result<FeeBreakdown, FeeError> {
    if !base_value.is_positive() {
        return Err(FeeError::NonPositiveBaseValue(base_value));
    }
    if vendors.is_empty() {
        return Ok(FeeBreakdown {
            base_value,
            processing_fee,
            commission_total: Cents::from(0),
            payout_fee_total: Cents::from(0),
            vendor_nets: Vec::new(),
        });
    }

    let commission_total = commission_on(base_value, schedule);
    let commission_shares = apportion_by_weight(commission_total, vendors);
    let payout_shares = payout_fee_shares(schedule, vendors.len());

    let mut vendor_nets = Vec::with_capacity(vendors.len());
    for ((vendor, commission), payout_fee) in vendors.iter().zip(commission_shares).zip(payout_shares) {
        let net_payable = vendor.total - commission - payout_fee;
        if net_payable.is_negative() {
            return Err(FeeError::NegativePayable { vendor_id: vendor.vendor_id.clone(), amount: net_payable });
        }
        vendor_nets.push(VendorNet {
            vendor_id: vendor.vendor_id.clone(),
            total: vendor.total,
            commission,
            payout_fee,
            net_payable,
        });
    }
    let payout_fee_total = vendor_nets.iter().map(|v| v.payout_fee).sum();
    // Beneficiary fees plus commission may never exceed what the allocation holds. Heavy discounting
    // can push the base value below the sum of line totals; that must fail loudly, not truncate.
    let allocated: Cents = vendor_nets.iter().map(|v| v.net_payable).sum::<Cents>() + commission_total;
    if allocated > base_value {
        return Err(FeeError::AllocationExceeded { allocated, base: base_value });
    }
    Ok(FeeBreakdown { base_value, processing_fee, commission_total, payout_fee_total, vendor_nets })
}

fn commission_on(base_value: Cents, schedule: &FeeSchedule) -> Cents {
    match schedule.commission_type {
        CommissionType::Fixed => Cents::from((schedule.commission_value * 100.0).round() as i64),
        CommissionType::Percentage => {
            Cents::from((base_value.value() as f64 * schedule.commission_value / 100.0).round() as i64)
        },
    }
}

/// Split `total` across vendors proportionally to their line totals. Flooring leaves at most
/// `vendors.len() - 1` cents over; those go to the earliest vendors, one cent each.
fn apportion_by_weight(total: Cents, vendors: &[VendorTotal]) -> Vec<Cents> {
    let weight_sum: i64 = vendors.iter().map(|v| v.total.value()).sum();
    if weight_sum <= 0 {
        return vec![Cents::from(0); vendors.len()];
    }
    let mut shares: Vec<i64> = vendors
        .iter()
        .map(|v| ((total.value() as i128 * v.total.value() as i128) / weight_sum as i128) as i64)
        .collect();
    let mut remainder = total.value() - shares.iter().sum::<i64>();
    for share in shares.iter_mut() {
        if remainder == 0 {
            break;
        }
        *share += 1;
        remainder -= 1;
    }
    shares.into_iter().map(Cents::from).collect()
}

/// The flat payout fee lands wholly on a single vendor, and is split evenly across several, with the
/// integer remainder assigned to the first.
fn payout_fee_shares(schedule: &FeeSchedule, vendor_count: usize) -> Vec<Cents> {
    if schedule.payout_fee_allocation != PayoutFeeAllocation::Vendor || vendor_count == 0 {
        return vec![Cents::from(0); vendor_count];
    }
    let n = vendor_count as i64;
    let each = schedule.payout_fee.value() / n;
    let remainder = schedule.payout_fee.value() - each * n;
    (0..n).map(|i| Cents::from(if i == 0 { each + remainder } else { each })).collect()
}
