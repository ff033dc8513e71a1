use portal_primitives::CurrentPortalState;

use crate::config::PortalConfig;
use crate::instruction::{Instruction, LiquidateCustodianContent, LiquidateTpExchangeRatesContent, MetaType, Status};

/// Which top-percentile bucket a custodian's collateral/debt ratio falls
/// into for one token. `Tp120` auto-liquidates in this pass; `Tp130` is
/// cure-eligible via the Liquidation Custodian Deposit handler (§4.3.5);
/// `Tp150` is a warning with no instruction emitted; `Healthy` means no
/// bucket applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TpBucket {
    Healthy,
    Tp150,
    Tp130,
    Tp120,
}

impl TpBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            TpBucket::Healthy => "Healthy",
            TpBucket::Tp150 => "TP150",
            TpBucket::Tp130 => "TP130",
            TpBucket::Tp120 => "TP120",
        }
    }
}

/// `ratio_percent = floor(locked_collateral * 100 / debt_value_prv)`,
/// i.e. how well-collateralized the custodian's holding of `token_id` is.
/// Returns `None` when the custodian holds nothing of the token (no debt
/// to rate).
pub fn ratio_percent(locked_collateral: u64, debt_value_prv: u64) -> Option<u64> {
    if debt_value_prv == 0 {
        return None;
    }
    Some(locked_collateral * 100 / debt_value_prv)
}

pub fn classify(ratio_percent: u64, config: &PortalConfig) -> TpBucket {
    if ratio_percent < config.tp120_threshold_percent {
        TpBucket::Tp120
    } else if ratio_percent < config.tp130_threshold_percent {
        TpBucket::Tp130
    } else if ratio_percent < config.tp150_threshold_percent {
        TpBucket::Tp150
    } else {
        TpBucket::Healthy
    }
}

/// Shard id carried in the outer `[meta_type, shard_id, status, content]`
/// tuple for every instruction this pass emits: the Top-Percentile sweep is
/// a beacon-wide examination, not triggered by a shard action, so §6 pins
/// it to the literal string `"-1"` rather than a real shard id.
const BEACON_SHARD_ID: &str = "-1";

/// Top-Percentile pass (§4.3.3): for every custodian and every token it
/// holds, compute the collateral/debt ratio and classify into a bucket.
/// `Tp120` moves the entire holding and its locked collateral into the
/// per-token liquidation pool and, for any waiting-redeem entries already
/// matched against that custodian/token, pays out a proportional share of
/// that freed collateral directly to the redeemers before the remainder
/// lands in the pool. `Tp130` emits a notification instruction with no
/// collateral movement — it stays cure-eligible via the Liquidation
/// Custodian Deposit handler (§4.3.5).
pub fn run_pass(state: &mut CurrentPortalState, config: &PortalConfig) -> Vec<Instruction> {
    let mut instructions = Vec::new();

    let custodian_ids: Vec<String> = state.custodians.keys().cloned().collect();
    for custodian_id in custodian_ids {
        let token_ids: Vec<String> = state.custodians[&custodian_id]
            .holding_pub_tokens
            .keys()
            .cloned()
            .collect();

        for token_id in token_ids {
            let custodian = &state.custodians[&custodian_id];
            let holding = *custodian.holding_pub_tokens.get(&token_id).unwrap_or(&0);
            let locked = *custodian.locked_amount_collateral.get(&token_id).unwrap_or(&0);
            let Some(debt_prv) = state.final_exchange_rates.exchange_ptoken_to_prv(&token_id, holding) else { continue };
            let Some(ratio) = ratio_percent(locked, debt_prv) else { continue };

            match classify(ratio, config) {
                TpBucket::Tp120 => {
                    instructions.extend(liquidate_tp120(state, config, &custodian_id, &token_id));
                }
                TpBucket::Tp130 => {
                    instructions.push(Instruction::new(
                        MetaType::LiquidateTpExchangeRates,
                        BEACON_SHARD_ID,
                        Status::Success,
                        LiquidateTpExchangeRatesContent {
                            custodian_address: custodian_id.clone(),
                            meta_type: TpBucket::Tp130.as_str().to_string(),
                            status: Status::Success.as_str().to_string(),
                        },
                    ));
                }
                TpBucket::Tp150 | TpBucket::Healthy => {}
            }
        }
    }

    instructions
}

/// Full TP120 liquidation of one custodian/token (§4.3.3 step 2): move the
/// entire holding and locked collateral out of the custodian, settle any
/// waiting-redeem entries already matched against it proportionally out of
/// that freed collateral, and push whatever is left into the liquidation
/// pool.
fn liquidate_tp120(
    state: &mut CurrentPortalState,
    config: &PortalConfig,
    custodian_id: &str,
    token_id: &str,
) -> Vec<Instruction> {
    let mut instructions = Vec::new();

    let matches: Vec<(String, String, u64)> = state
        .waiting_redeem_requests
        .iter()
        .filter(|(_, redeem)| redeem.token_id == token_id)
        .filter_map(|(redeem_id, redeem)| {
            redeem
                .custodians
                .iter()
                .find(|m| m.incognito_address == custodian_id)
                .map(|m| (redeem_id.clone(), redeem.redeemer_address.clone(), m.amount))
        })
        .collect();
    let total_match_redeem_amount: u64 = matches.iter().map(|(_, _, amount)| *amount).sum();

    let custodian = state.custodians.get_mut(custodian_id).unwrap();
    let (freed_collateral, freed_pub_token) = custodian.apply_tp120_liquidation(token_id);

    let total_minted_prv = if total_match_redeem_amount > 0 {
        // floor(totalMatchRedeemAmount * percent / 100) in pub-token units
        // first, then convert to PRV, then cap at what was actually freed.
        let floored_pub_token_amount = total_match_redeem_amount * config.percent_received_collateral_amount / 100;
        let converted = state
            .final_exchange_rates
            .exchange_ptoken_to_prv(token_id, floored_pub_token_amount)
            .unwrap_or(0);
        converted.min(freed_collateral)
    } else {
        0
    };

    for (redeem_id, redeemer_address, match_amount) in &matches {
        let minted_for_match = if total_minted_prv > 0 {
            (*match_amount as u128 * total_minted_prv as u128 / total_match_redeem_amount as u128) as u64
        } else {
            0
        };

        instructions.push(Instruction::new(
            MetaType::LiquidateCustodian,
            BEACON_SHARD_ID,
            Status::Success,
            LiquidateCustodianContent {
                unique_redeem_id: redeem_id.clone(),
                token_id: token_id.to_string(),
                redeem_pub_token_amount: *match_amount,
                minted_collateral_amount: minted_for_match,
                redeemer_inc_address_str: redeemer_address.clone(),
                custodian_inc_address_str: custodian_id.to_string(),
                shard_id: BEACON_SHARD_ID.to_string(),
            },
        ));

        if let Some(redeem) = state.waiting_redeem_requests.get_mut(redeem_id) {
            redeem.remove_custodian(custodian_id);
            if redeem.is_fully_resolved() {
                state.waiting_redeem_requests.remove(redeem_id);
            }
        }
    }

    let remaining_collateral = freed_collateral - total_minted_prv;
    let remaining_pub_token = freed_pub_token.saturating_sub(total_match_redeem_amount);
    state.liquidate_exchange_rates.add(token_id, remaining_collateral, remaining_pub_token);

    instructions.push(Instruction::new(
        MetaType::LiquidateTpExchangeRates,
        BEACON_SHARD_ID,
        Status::Success,
        LiquidateTpExchangeRatesContent {
            custodian_address: custodian_id.to_string(),
            meta_type: TpBucket::Tp120.as_str().to_string(),
            status: Status::Success.as_str().to_string(),
        },
    ));

    instructions
}
