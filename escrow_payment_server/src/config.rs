use std::env;

use epg_common::{parse_boolean_flag, Cents};
use escrow_api::EscrowApiConfig;
use escrow_payment_engine::types::{
    CommissionType,
    EscrowSettings,
    FeeAllocation,
    FeeSchedule,
    PayoutFeeAllocation,
};
use log::*;

const DEFAULT_EPG_HOST: &str = "127.0.0.1";
const DEFAULT_EPG_PORT: u16 = 8310;
/// Orders below this stay with the non-escrow gateways.
const DEFAULT_MINIMUM_ORDER_TOTAL: Cents = Cents::from_rands(50);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The gateway is hidden for orders below this total.
    pub minimum_order_total: Cents,
    /// Capacity of the order-event channel between the storefront and the orchestrator.
    pub event_buffer_size: usize,
    /// Remote API client configuration (domains, credentials).
    pub api: EscrowApiConfig,
    /// Resolved engine settings: industry, fee policy, commission schedule, delivery windows.
    pub settings: EscrowSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_EPG_HOST.to_string(),
            port: DEFAULT_EPG_PORT,
            minimum_order_total: DEFAULT_MINIMUM_ORDER_TOTAL,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            api: EscrowApiConfig::default(),
            settings: EscrowSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("EPG_HOST").ok().unwrap_or_else(|| DEFAULT_EPG_HOST.into());
        let port = env::var("EPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for EPG_PORT. {e} Using the default, {DEFAULT_EPG_PORT}, instead.");
                    DEFAULT_EPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_EPG_PORT);
        let minimum_order_total = env::var("EPG_MINIMUM_ORDER_TOTAL")
            .ok()
            .and_then(|s| {
                s.parse::<Cents>()
                    .map_err(|e| warn!("🪛️ Invalid value for EPG_MINIMUM_ORDER_TOTAL. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_MINIMUM_ORDER_TOTAL);
        let event_buffer_size = env::var("EPG_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let api = EscrowApiConfig::new_from_env_or_default();
        let settings = escrow_settings_from_env(&api);
        Self { host, port, minimum_order_total, event_buffer_size, api, settings }
    }
}

fn escrow_settings_from_env(api: &EscrowApiConfig) -> EscrowSettings {
    let defaults = EscrowSettings::default();
    let industry = env::var("EPG_INDUSTRY").unwrap_or_else(|_| {
        info!("🪛️ EPG_INDUSTRY not set, classifying transactions as {}", defaults.industry);
        defaults.industry.clone()
    });
    let fee_allocation = env::var("EPG_FEE_ALLOCATION")
        .ok()
        .and_then(|s| {
            s.parse::<FeeAllocation>()
                .map_err(|e| warn!("🪛️ Invalid value for EPG_FEE_ALLOCATION. {e}"))
                .ok()
        })
        .unwrap_or(defaults.fee_allocation);
    let marketplace = parse_boolean_flag(env::var("EPG_MARKETPLACE").ok(), false);
    let commission_type = match env::var("EPG_COMMISSION_TYPE").map(|s| s.to_ascii_uppercase()) {
        Ok(s) if s == "FIXED" => CommissionType::Fixed,
        Ok(s) if s == "PERCENTAGE" || s == "PERCENT" => CommissionType::Percentage,
        Ok(s) => {
            warn!("🪛️ Unknown EPG_COMMISSION_TYPE '{s}', using PERCENTAGE");
            CommissionType::Percentage
        },
        Err(_) => defaults.schedule.commission_type,
    };
    let commission_value = env::var("EPG_COMMISSION_VALUE")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(defaults.schedule.commission_value);
    let payout_fee = env::var("EPG_PAYOUT_FEE")
        .ok()
        .and_then(|s| s.parse::<Cents>().ok())
        .unwrap_or(defaults.schedule.payout_fee);
    let payout_fee_allocation = match env::var("EPG_PAYOUT_FEE_ALLOCATION").map(|s| s.to_ascii_uppercase()) {
        Ok(s) if s == "VENDOR" => PayoutFeeAllocation::Vendor,
        Ok(s) if s == "SELLER" => PayoutFeeAllocation::Seller,
        Ok(s) => {
            warn!("🪛️ Unknown EPG_PAYOUT_FEE_ALLOCATION '{s}', using SELLER");
            PayoutFeeAllocation::Seller
        },
        Err(_) => defaults.schedule.payout_fee_allocation,
    };
    let days_to_deliver =
        env::var("EPG_DAYS_TO_DELIVER").ok().and_then(|s| s.parse::<i64>().ok()).unwrap_or(defaults.days_to_deliver);
    let days_to_inspect =
        env::var("EPG_DAYS_TO_INSPECT").ok().and_then(|s| s.parse::<i64>().ok()).unwrap_or(defaults.days_to_inspect);
    if marketplace {
        info!("🪛️ Marketplace mode is on: commission {commission_value} ({commission_type:?}), payout fee {payout_fee} to {payout_fee_allocation:?}");
    }
    EscrowSettings {
        client_secret: api.client_secret.clone(),
        industry,
        fee_allocation,
        marketplace,
        schedule: FeeSchedule { commission_type, commission_value, payout_fee, payout_fee_allocation },
        days_to_deliver,
        days_to_inspect,
    }
}
