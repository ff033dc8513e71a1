use portal_primitives::CurrentPortalState;

use crate::instruction::{ExpiredWaitingPortingReqContent, Instruction, MetaType, Status};

/// Expired Waiting-Porting pass (§4.3.2): for every porting request whose
/// deadline has passed without the porter submitting proof, refund every
/// matched custodian's fenced-off collateral back to `free_collateral`
/// (without touching `total_collateral`, per the resolution of the Open
/// Question in SPEC_FULL.md §4.3) and delete the request.
pub fn run_pass(state: &mut CurrentPortalState, shard_id: &str) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let expired_ids: Vec<String> = state
        .waiting_porting_requests
        .iter()
        .filter(|(_, req)| req.is_expired(state.beacon_height))
        .map(|(id, _)| id.clone())
        .collect();

    for porting_id in expired_ids {
        let Some(request) = state.waiting_porting_requests.remove(&porting_id) else { continue };
        for matched in &request.custodians {
            if let Some(custodian) = state.custodians.get_mut(&matched.incognito_address) {
                custodian.apply_expired_porting_refund(&request.token_id, matched.locked_amount_collateral);
            }
        }
        instructions.push(Instruction::new(
            MetaType::ExpiredWaitingPortingReq,
            shard_id,
            Status::Success,
            ExpiredWaitingPortingReqContent { unique_porting_id: porting_id, shard_id: shard_id.to_string() },
        ));
    }

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_primitives::{Custodian, MatchedPortingCustodian, WaitingPortingRequest};
    use std::collections::BTreeMap;

    #[test]
    fn expired_request_refunds_locked_collateral_to_free() {
        let mut state = CurrentPortalState::new(100);
        let mut holding = BTreeMap::new();
        holding.insert("pBTC".to_string(), 0u64);
        let mut locked = BTreeMap::new();
        locked.insert("pBTC".to_string(), 500u64);
        let custodian = Custodian::new("cusA".to_string(), 500, 0, holding, locked).unwrap();
        state.custodians.insert("cusA".to_string(), custodian);
        state.waiting_porting_requests.insert(
            "port1".to_string(),
            WaitingPortingRequest {
                unique_porting_id: "port1".to_string(),
                token_id: "pBTC".to_string(),
                porter_address: "userA".to_string(),
                beacon_height: 10,
                expired_at_height: 50,
                custodians: vec![MatchedPortingCustodian {
                    incognito_address: "cusA".to_string(),
                    amount: 500,
                    locked_amount_collateral: 500,
                }],
            },
        );

        let instructions = run_pass(&mut state, "1");
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].status, Status::Success);
        assert!(!state.waiting_porting_requests.contains_key("port1"));
        let cus = &state.custodians["cusA"];
        assert_eq!(cus.free_collateral, 500);
        assert_eq!(cus.total_collateral, 500);
        assert!(cus.invariant_holds());
    }

    #[test]
    fn unexpired_request_is_left_untouched() {
        let mut state = CurrentPortalState::new(10);
        state.waiting_porting_requests.insert(
            "port1".to_string(),
            WaitingPortingRequest {
                unique_porting_id: "port1".to_string(),
                token_id: "pBTC".to_string(),
                porter_address: "userA".to_string(),
                beacon_height: 1,
                expired_at_height: 50,
                custodians: vec![],
            },
        );
        let instructions = run_pass(&mut state, "1");
        assert!(instructions.is_empty());
        assert!(state.waiting_porting_requests.contains_key("port1"));
    }
}
