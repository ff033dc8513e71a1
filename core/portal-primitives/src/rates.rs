use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TokenId;

/// Beacon-committed PRV/pub-token exchange rates for one round, expressed as
/// the amount of PRV (smallest unit) one smallest unit of the public token
/// is worth. All conversions floor, matching every monetary conversion in
/// the original liquidation producer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalExchangeRates(pub BTreeMap<TokenId, u64>);

impl FinalExchangeRates {
    pub fn rate(&self, token_id: &str) -> Option<u64> {
        self.0.get(token_id).copied()
    }

    /// `floor(pub_token_amount * rate)`.
    pub fn exchange_ptoken_to_prv(&self, token_id: &str, pub_token_amount: u64) -> Option<u64> {
        let rate = self.rate(token_id)?;
        pub_token_amount.checked_mul(rate)
    }

    /// `floor(prv_amount / rate)`.
    pub fn exchange_prv_to_ptoken(&self, token_id: &str, prv_amount: u64) -> Option<u64> {
        let rate = self.rate(token_id)?;
        if rate == 0 {
            return None;
        }
        Some(prv_amount / rate)
    }
}

/// One token's share of a beacon-height liquidation pool, accumulated by
/// the Top-Percentile pass (§4.3.3) whenever a custodian is fully
/// liquidated at TP120, and drawn down by the Redeem-from-Liquidation
/// action handler (§4.3.4).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidateExchangeRatesDetail {
    pub hold_amount_free_collateral: u64,
    pub hold_amount_pub_token: u64,
}

/// Per-beacon-height liquidation pools, keyed by token. Scoped to one
/// `CurrentPortalState` round; a caller wanting cross-height accumulation
/// composes rounds externally (see SPEC_FULL.md §4.3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidateExchangeRatesPool(pub BTreeMap<TokenId, LiquidateExchangeRatesDetail>);

impl LiquidateExchangeRatesPool {
    pub fn add(&mut self, token_id: &str, free_collateral: u64, pub_token: u64) {
        let entry = self.0.entry(token_id.to_string()).or_default();
        entry.hold_amount_free_collateral += free_collateral;
        entry.hold_amount_pub_token += pub_token;
    }

    pub fn get(&self, token_id: &str) -> Option<&LiquidateExchangeRatesDetail> {
        self.0.get(token_id)
    }

    /// Draws `(prv_amount, pub_token_amount)` out of the pool for `token_id`,
    /// failing if either side of the pool would go negative.
    pub fn draw(&mut self, token_id: &str, prv_amount: u64, pub_token_amount: u64) -> Result<(), PoolError> {
        let detail = self
            .0
            .get_mut(token_id)
            .ok_or_else(|| PoolError::NoPool(token_id.to_string()))?;
        if detail.hold_amount_free_collateral < prv_amount {
            return Err(PoolError::InsufficientCollateral {
                have: detail.hold_amount_free_collateral,
                need: prv_amount,
            });
        }
        if detail.hold_amount_pub_token < pub_token_amount {
            return Err(PoolError::InsufficientPubToken {
                have: detail.hold_amount_pub_token,
                need: pub_token_amount,
            });
        }
        detail.hold_amount_free_collateral -= prv_amount;
        detail.hold_amount_pub_token -= pub_token_amount;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("no liquidation pool for token {0}")]
    NoPool(TokenId),
    #[error("pool collateral {have} insufficient for {need}")]
    InsufficientCollateral { have: u64, need: u64 },
    #[error("pool pub-token balance {have} insufficient for {need}")]
    InsufficientPubToken { have: u64, need: u64 },
}
