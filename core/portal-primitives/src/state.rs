use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Custodian, FinalExchangeRates, IncAddress, LiquidateExchangeRatesPool, WaitingPortingRequest, WaitingRedeemRequest};

/// Unique identifier of a `WaitingRedeemRequest`.
pub type RedeemId = String;
/// Unique identifier of a `WaitingPortingRequest`.
pub type PortingId = String;

/// The full portal state as of one beacon height, owned exclusively by the
/// liquidation engine for the duration of a `run_beacon_height` call.
///
/// Every map here is a `BTreeMap` rather than a `HashMap`: the liquidation
/// engine's passes iterate these maps in order, and the resulting
/// instruction sequence must be identical across validators replaying the
/// same height (see the determinism invariant in `portal-liquidation`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPortalState {
    pub beacon_height: u64,
    pub custodians: BTreeMap<IncAddress, Custodian>,
    pub waiting_redeem_requests: BTreeMap<RedeemId, WaitingRedeemRequest>,
    pub waiting_porting_requests: BTreeMap<PortingId, WaitingPortingRequest>,
    pub final_exchange_rates: FinalExchangeRates,
    pub liquidate_exchange_rates: LiquidateExchangeRatesPool,
}

impl CurrentPortalState {
    pub fn new(beacon_height: u64) -> Self {
        Self { beacon_height, ..Default::default() }
    }

    /// Total collateral held across every custodian. Used by invariant
    /// tests (spec.md §8 invariant 1) to confirm a liquidation pass never
    /// creates or destroys PRV, only moves it between custodians and the
    /// liquidation pool.
    pub fn total_custodian_collateral(&self) -> u64 {
        self.custodians.values().map(|c| c.total_collateral).sum()
    }

    pub fn total_pool_collateral(&self) -> u64 {
        self.liquidate_exchange_rates
            .0
            .values()
            .map(|d| d.hold_amount_free_collateral)
            .sum()
    }
}
