use portal_primitives::CurrentPortalState;

use crate::config::PortalConfig;
use crate::deposit::{self, LiquidationCustodianDepositRequest};
use crate::expired_porting;
use crate::instruction::Instruction;
use crate::redeem_liquidate::{self, RedeemFromLiquidationPoolRequest};
use crate::runaway;
use crate::tp;

/// Everything one beacon height's liquidation build needs beyond the
/// portal state itself: custodians already identified as having gone
/// runaway past their redeem deadline, and the user-submitted actions
/// queued for this height. Detecting a runaway deadline from wall-clock
/// or beacon height is a block-producer concern outside this crate's
/// scope (see SPEC_FULL.md §1's Non-goals).
#[derive(Debug, Clone, Default)]
pub struct BeaconHeightInputs {
    pub runaway_matches: Vec<(String, String)>,
    pub redeem_from_pool_requests: Vec<RedeemFromLiquidationPoolRequest>,
    pub deposit_requests: Vec<LiquidationCustodianDepositRequest>,
}

/// Runs every liquidation pass for one beacon height in the fixed order
/// required for determinism (§4.3, §8 invariant 3): Custodian-Runaway,
/// Expired Waiting-Porting, Top-Percentile, then the two action handlers
/// in submission order. Infallible: every failure mode becomes a
/// `Failed`/`Rejected` instruction rather than a `Result::Err`, so this
/// function can never abort a beacon block build (SPEC_FULL.md §7).
pub fn run_beacon_height(
    state: &mut CurrentPortalState,
    config: &PortalConfig,
    shard_id: &str,
    inputs: &BeaconHeightInputs,
) -> Vec<Instruction> {
    let mut instructions = Vec::new();

    instructions.extend(runaway::run_pass(state, config, shard_id, &inputs.runaway_matches));
    instructions.extend(expired_porting::run_pass(state, shard_id));
    instructions.extend(tp::run_pass(state, config));

    for request in &inputs.redeem_from_pool_requests {
        instructions.push(redeem_liquidate::handle(state, config, shard_id, request));
    }
    for request in &inputs.deposit_requests {
        instructions.push(deposit::handle(state, config, shard_id, request));
    }

    instructions
}
