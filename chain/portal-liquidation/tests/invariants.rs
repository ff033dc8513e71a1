use std::collections::BTreeMap;

use portal_liquidation::{run_beacon_height, BeaconHeightInputs, PortalConfig};
use portal_primitives::{Custodian, CurrentPortalState};
use quickcheck_macros::quickcheck;

/// Builds a single-custodian, single-token fixture whose collateral ratio
/// is controlled by `locked` and `holding`, so quickcheck can explore the
/// full healthy/TP150/TP130/TP120 range.
fn fixture(locked: u64, holding: u64) -> CurrentPortalState {
    let mut state = CurrentPortalState::new(1);
    let mut h = BTreeMap::new();
    h.insert("pBTC".to_string(), holding);
    let mut l = BTreeMap::new();
    l.insert("pBTC".to_string(), locked);
    let custodian = Custodian::new("cusA".to_string(), locked, 0, h, l).unwrap();
    state.custodians.insert("cusA".to_string(), custodian);
    state.final_exchange_rates.0.insert("pBTC".to_string(), 1);
    state
}

/// Invariant 1: a beacon height never creates or destroys PRV — whatever
/// leaves a custodian's `total_collateral` must land in the liquidation
/// pool's free collateral.
#[quickcheck]
fn collateral_is_conserved_across_a_beacon_height(locked: u64, holding: u64) -> bool {
    let locked = locked % 1_000_000;
    let holding = holding % 1_000_000;
    let mut state = fixture(locked, holding);
    let before = state.total_custodian_collateral() + state.total_pool_collateral();

    run_beacon_height(&mut state, &PortalConfig::default(), "1", &BeaconHeightInputs::default());

    let after = state.total_custodian_collateral() + state.total_pool_collateral();
    before == after
}

/// Invariant 2: a redeem request's matched-custodian amounts can only
/// shrink or disappear after a beacon height runs, never grow.
#[quickcheck]
fn redeem_match_amount_never_grows(locked: u64, holding: u64) -> bool {
    let locked = locked % 1_000_000;
    let holding = holding % 1_000_000;
    let mut state = fixture(locked, holding);
    state.waiting_redeem_requests.insert(
        "r1".to_string(),
        portal_primitives::WaitingRedeemRequest {
            unique_redeem_id: "r1".to_string(),
            token_id: "pBTC".to_string(),
            redeemer_address: "userA".to_string(),
            redeem_amount: holding,
            beacon_height: 1,
            custodians: vec![portal_primitives::MatchedCustodian {
                incognito_address: "cusA".to_string(),
                amount: holding,
                locked_amount_collateral: locked,
            }],
        },
    );
    let before = state
        .waiting_redeem_requests
        .get("r1")
        .map(|r| r.total_matched_amount())
        .unwrap_or(0);

    let inputs = BeaconHeightInputs { runaway_matches: vec![("r1".to_string(), "cusA".to_string())], ..Default::default() };
    run_beacon_height(&mut state, &PortalConfig::default(), "1", &inputs);

    let after = state
        .waiting_redeem_requests
        .get("r1")
        .map(|r| r.total_matched_amount())
        .unwrap_or(0);
    after <= before
}

/// Invariant 3 (determinism): replaying the same height from a cloned
/// fixture produces byte-identical instructions.
#[test]
fn same_height_replayed_is_byte_identical() {
    let mut a = fixture(1_000, 900);
    let mut b = a.clone();
    let config = PortalConfig::default();
    let inputs = BeaconHeightInputs::default();

    let out_a = run_beacon_height(&mut a, &config, "1", &inputs);
    let out_b = run_beacon_height(&mut b, &config, "1", &inputs);

    assert_eq!(out_a, out_b);
    assert_eq!(a, b);
}
