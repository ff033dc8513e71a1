use portal_primitives::CurrentPortalState;

use crate::config::PortalConfig;
use crate::instruction::{Instruction, LiquidateCustodianContent, MetaType, Status};

/// Custodian-Runaway pass (§4.3.1): for every custodian on a redeem
/// request's match list that has gone unresponsive past its redeem
/// deadline, mint PRV collateral to the redeemer and drop that custodian
/// from the match list, deleting the redeem request once its match list
/// is empty.
///
/// `runaway_matches` names the `(redeem_id, custodian_incognito_address)`
/// pairs the caller has already identified as past-deadline; detecting
/// that deadline from beacon height belongs to the block producer, not
/// this pass (see the Non-goals in SPEC_FULL.md §1).
pub fn run_pass(
    state: &mut CurrentPortalState,
    config: &PortalConfig,
    shard_id: &str,
    runaway_matches: &[(String, String)],
) -> Vec<Instruction> {
    let mut instructions = Vec::new();

    for (redeem_id, custodian_address) in runaway_matches {
        let Some(redeem) = state.waiting_redeem_requests.get(redeem_id) else { continue };
        let token_id = redeem.token_id.clone();
        let redeemer_address = redeem.redeemer_address.clone();
        let Some(matched) = redeem.custodians.iter().find(|c| &c.incognito_address == custodian_address).cloned() else { continue };

        // floor(matchAmount * percent / 100) in pub-token units first, then
        // convert to PRV — converting before flooring rounds differently
        // whenever the product isn't a multiple of 100 (§4.3.1).
        let floored_pub_token_amount = matched.amount * config.percent_received_collateral_amount / 100;
        let minted_prv = state
            .final_exchange_rates
            .exchange_ptoken_to_prv(&token_id, floored_pub_token_amount)
            .unwrap_or(0);

        let Some(custodian) = state.custodians.get_mut(custodian_address) else { continue };

        let status = match custodian.apply_runaway_liquidation(&token_id, minted_prv, matched.amount) {
            Ok(()) => Status::Success,
            Err(_) => Status::Failed,
        };

        instructions.push(Instruction::new(
            MetaType::LiquidateCustodian,
            shard_id,
            status,
            LiquidateCustodianContent {
                unique_redeem_id: redeem_id.clone(),
                token_id: token_id.clone(),
                redeem_pub_token_amount: matched.amount,
                minted_collateral_amount: if matches!(status, Status::Success) { minted_prv } else { 0 },
                redeemer_inc_address_str: redeemer_address,
                custodian_inc_address_str: custodian_address.clone(),
                shard_id: shard_id.to_string(),
            },
        ));

        if let Some(redeem) = state.waiting_redeem_requests.get_mut(redeem_id) {
            redeem.remove_custodian(custodian_address);
            if redeem.is_fully_resolved() {
                state.waiting_redeem_requests.remove(redeem_id);
            }
        }
    }

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_primitives::{Custodian, MatchedCustodian, WaitingRedeemRequest};
    use std::collections::BTreeMap;

    fn setup(locked: u64, total: u64) -> CurrentPortalState {
        let mut state = CurrentPortalState::new(10);
        let mut holding = BTreeMap::new();
        holding.insert("pBTC".to_string(), 1_000_000u64);
        let mut lock = BTreeMap::new();
        lock.insert("pBTC".to_string(), locked);
        let custodian = Custodian::new("cusA".to_string(), total, total - locked, holding, lock).unwrap();
        state.custodians.insert("cusA".to_string(), custodian);
        state.final_exchange_rates.0.insert("pBTC".to_string(), 1);
        state.waiting_redeem_requests.insert(
            "redeem1".to_string(),
            WaitingRedeemRequest {
                unique_redeem_id: "redeem1".to_string(),
                token_id: "pBTC".to_string(),
                redeemer_address: "userA".to_string(),
                redeem_amount: 2000,
                beacon_height: 10,
                custodians: vec![MatchedCustodian {
                    incognito_address: "cusA".to_string(),
                    amount: 2000,
                    locked_amount_collateral: locked,
                }],
            },
        );
        state
    }

    #[test]
    fn scenario_s1_insufficient_locked_collateral_fails() {
        // spec.md S1: mintPRV = 2000 * 105 / 100 = 2100 > Locked[T] = 2000.
        let mut state = setup(2000, 2000);
        let config = PortalConfig::default();
        let instructions = run_pass(&mut state, &config, "1", &[("redeem1".to_string(), "cusA".to_string())]);
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].status, Status::Failed);
        assert!(!state.waiting_redeem_requests.contains_key("redeem1"));
    }

    #[test]
    fn sufficient_locked_collateral_succeeds_and_removes_match() {
        let mut state = setup(3000, 3000);
        let config = PortalConfig::default();
        let instructions = run_pass(&mut state, &config, "1", &[("redeem1".to_string(), "cusA".to_string())]);
        assert_eq!(instructions[0].status, Status::Success);
        let cus = &state.custodians["cusA"];
        assert_eq!(cus.total_collateral, 900);
        assert!(cus.invariant_holds());
    }

    #[test]
    fn floor_is_applied_before_exchange_rate_conversion() {
        // matchAmount=10, percent=105, rate=3: floor(10*105/100)=10, *3=30.
        // Converting first would give floor(30*105/100)=31 instead.
        let mut state = CurrentPortalState::new(1);
        let mut holding = BTreeMap::new();
        holding.insert("pBTC".to_string(), 10u64);
        let mut lock = BTreeMap::new();
        lock.insert("pBTC".to_string(), 30u64);
        let custodian = Custodian::new("cusA".to_string(), 30, 0, holding, lock).unwrap();
        state.custodians.insert("cusA".to_string(), custodian);
        state.final_exchange_rates.0.insert("pBTC".to_string(), 3);
        state.waiting_redeem_requests.insert(
            "redeem1".to_string(),
            WaitingRedeemRequest {
                unique_redeem_id: "redeem1".to_string(),
                token_id: "pBTC".to_string(),
                redeemer_address: "userA".to_string(),
                redeem_amount: 10,
                beacon_height: 1,
                custodians: vec![MatchedCustodian {
                    incognito_address: "cusA".to_string(),
                    amount: 10,
                    locked_amount_collateral: 30,
                }],
            },
        );

        let mut config = PortalConfig::default();
        config.percent_received_collateral_amount = 105;
        let instructions = run_pass(&mut state, &config, "1", &[("redeem1".to_string(), "cusA".to_string())]);

        assert_eq!(instructions[0].status, Status::Success);
        assert_eq!(state.custodians["cusA"].total_collateral, 0);
    }
}
