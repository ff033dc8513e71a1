use portal_primitives::CurrentPortalState;

use crate::config::PortalConfig;
use crate::instruction::{Instruction, MetaType, RedeemLiquidateExchangeRatesContent, Status};

/// A user-submitted request to redeem public tokens directly out of a
/// token's liquidation pool rather than from a live custodian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemFromLiquidationPoolRequest {
    pub token_id: String,
    pub redeemer_address: String,
    pub redeem_amount: u64,
    pub fee: u64,
    pub remote_address: String,
    pub tx_req_id: String,
}

/// `floor(redeem_amount * hold_amount_free_collateral / hold_amount_pub_token)`:
/// the PRV payout proportional to the pool's current PRV/pub-token ratio.
/// Computed in `u128` to avoid overflow on the intermediate product.
pub fn total_liquidation_by_exchange_rates(redeem_amount: u64, free_collateral: u64, pub_token: u64) -> Option<u64> {
    if pub_token == 0 {
        return None;
    }
    let total = (redeem_amount as u128) * (free_collateral as u128) / (pub_token as u128);
    u64::try_from(total).ok()
}

/// Redeem-from-Liquidation-Pool action handler (§4.3.4). Rejects (rather
/// than failing the beacon block) on any validation error: unknown
/// exchange rate, fee below the configured minimum, no pool for the
/// token, or a payout that would exceed the pool's free collateral.
pub fn handle(
    state: &mut CurrentPortalState,
    config: &PortalConfig,
    shard_id: &str,
    request: &RedeemFromLiquidationPoolRequest,
) -> Instruction {
    let reject = |reason: &str| {
        tracing::debug!(reason, token = %request.token_id, "redeem-from-liquidation-pool rejected");
        Instruction::new(
            MetaType::RedeemLiquidateExchangeRates,
            shard_id,
            Status::Rejected,
            RedeemLiquidateExchangeRatesContent {
                token_id: request.token_id.clone(),
                redeem_amount: request.redeem_amount,
                redeemer_inc_address_str: request.redeemer_address.clone(),
                remote_address: request.remote_address.clone(),
                redeem_fee: request.fee,
                tx_req_id: request.tx_req_id.clone(),
                shard_id: shard_id.to_string(),
                total_ptoken_received: 0,
            },
        )
    };

    if state.final_exchange_rates.rate(&request.token_id).is_none() {
        return reject("no exchange rate for token");
    }
    if request.fee < config.min_redeem_fee {
        return reject("fee below minimum");
    }
    let Some(pool) = state.liquidate_exchange_rates.get(&request.token_id) else {
        return reject("no liquidation pool for token");
    };

    let Some(total_prv) = total_liquidation_by_exchange_rates(
        request.redeem_amount,
        pool.hold_amount_free_collateral,
        pool.hold_amount_pub_token,
    ) else {
        return reject("pool has no remaining pub-token balance");
    };

    if total_prv > pool.hold_amount_free_collateral {
        return reject("payout exceeds pool free collateral");
    }

    state
        .liquidate_exchange_rates
        .draw(&request.token_id, total_prv, request.redeem_amount)
        .expect("bounds already checked above");

    Instruction::new(
        MetaType::RedeemLiquidateExchangeRates,
        shard_id,
        Status::Success,
        RedeemLiquidateExchangeRatesContent {
            token_id: request.token_id.clone(),
            redeem_amount: request.redeem_amount,
            redeemer_inc_address_str: request.redeemer_address.clone(),
            remote_address: request.remote_address.clone(),
            redeem_fee: request.fee,
            tx_req_id: request.tx_req_id.clone(),
            shard_id: shard_id.to_string(),
            total_ptoken_received: request.redeem_amount,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_pool(free_collateral: u64, pub_token: u64) -> CurrentPortalState {
        let mut state = CurrentPortalState::new(1);
        state.final_exchange_rates.0.insert("pBTC".to_string(), 1);
        state.liquidate_exchange_rates.add("pBTC", free_collateral, pub_token);
        state
    }

    #[test]
    fn succeeds_and_draws_down_pool_proportionally() {
        let mut state = state_with_pool(1000, 500);
        let request = RedeemFromLiquidationPoolRequest {
            token_id: "pBTC".to_string(),
            redeemer_address: "userA".to_string(),
            redeem_amount: 100,
            fee: 0,
            remote_address: "0xabc".to_string(),
            tx_req_id: "tx1".to_string(),
        };
        let instruction = handle(&mut state, &PortalConfig::default(), "1", &request);
        assert_eq!(instruction.status, Status::Success);
        let pool = state.liquidate_exchange_rates.get("pBTC").unwrap();
        // 100 * 1000 / 500 = 200 PRV drawn out.
        assert_eq!(pool.hold_amount_free_collateral, 800);
        assert_eq!(pool.hold_amount_pub_token, 400);
    }

    #[test]
    fn rejects_when_no_pool_exists() {
        let mut state = CurrentPortalState::new(1);
        state.final_exchange_rates.0.insert("pBTC".to_string(), 1);
        let request = RedeemFromLiquidationPoolRequest {
            token_id: "pBTC".to_string(),
            redeemer_address: "userA".to_string(),
            redeem_amount: 100,
            fee: 0,
            remote_address: "0xabc".to_string(),
            tx_req_id: "tx1".to_string(),
        };
        let instruction = handle(&mut state, &PortalConfig::default(), "1", &request);
        assert_eq!(instruction.status, Status::Rejected);
    }
}
