use portal_primitives::CurrentPortalState;

use crate::config::PortalConfig;
use crate::instruction::{Instruction, LiquidationCustodianDepositContent, MetaType, Status};
use crate::tp::{classify, ratio_percent, TpBucket};

/// A custodian's request to cure a TP130 position by depositing
/// additional collateral, either from its own `free_collateral` or from
/// a fresh outside source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationCustodianDepositRequest {
    pub custodian_incognito_address: String,
    pub token_id: String,
    pub deposited_amount: u64,
    pub free_collateral_selected: bool,
    pub tx_req_id: String,
}

/// `floor(x * 150 / 100)`: the collateral a custodian must hold at 150%
/// to fully cure a TP130 position.
pub fn up_150_percent(x: u64) -> u64 {
    x * 150 / 100
}

/// Liquidation Custodian Deposit action handler (§4.3.5). Only a custodian
/// in exactly the TP130 bucket may cure through this handler — a TP120
/// position has already been liquidated by the Top-Percentile pass and a
/// healthy or TP150 position has nothing to cure (SPEC_FULL.md §4.3's
/// resolution of the `IsTP120` Open Question).
pub fn handle(
    state: &mut CurrentPortalState,
    config: &PortalConfig,
    shard_id: &str,
    request: &LiquidationCustodianDepositRequest,
) -> Instruction {
    let reject = || {
        Instruction::new(
            MetaType::LiquidationCustodianDeposit,
            shard_id,
            Status::Rejected,
            LiquidationCustodianDepositContent {
                ptoken_id: request.token_id.clone(),
                incog_address_str: request.custodian_incognito_address.clone(),
                deposited_amount: request.deposited_amount,
                free_collateral_selected: request.free_collateral_selected,
                tx_req_id: request.tx_req_id.clone(),
                shard_id: shard_id.to_string(),
            },
        )
    };

    let Some(custodian) = state.custodians.get(&request.custodian_incognito_address) else {
        return reject();
    };
    let Some(&holding) = custodian.holding_pub_tokens.get(&request.token_id) else {
        return reject();
    };
    let locked = *custodian.locked_amount_collateral.get(&request.token_id).unwrap_or(&0);
    let Some(debt_prv) = state.final_exchange_rates.exchange_ptoken_to_prv(&request.token_id, holding) else {
        return reject();
    };
    let Some(ratio) = ratio_percent(locked, debt_prv) else {
        return reject();
    };
    if classify(ratio, config) != TpBucket::Tp130 {
        return reject();
    }

    let required = up_150_percent(debt_prv).saturating_sub(locked);
    if request.deposited_amount < required {
        return reject();
    }

    let custodian = state.custodians.get_mut(&request.custodian_incognito_address).unwrap();
    if request.free_collateral_selected {
        if custodian.apply_deposit_from_free(&request.token_id, request.deposited_amount).is_err() {
            return reject();
        }
    } else {
        custodian.apply_deposit_from_total(&request.token_id, request.deposited_amount);
    }

    Instruction::new(
        MetaType::LiquidationCustodianDeposit,
        shard_id,
        Status::Success,
        LiquidationCustodianDepositContent {
            ptoken_id: request.token_id.clone(),
            incog_address_str: request.custodian_incognito_address.clone(),
            deposited_amount: request.deposited_amount,
            free_collateral_selected: request.free_collateral_selected,
            tx_req_id: request.tx_req_id.clone(),
            shard_id: shard_id.to_string(),
        },
    )
}
