use std::collections::BTreeMap;

use crate::{IncAddress, TokenId};

/// A party holding PRV collateral against minted cross-chain public tokens.
///
/// Invariant: `locked_amount_collateral.values().sum() + free_collateral ==
/// total_collateral`, and `holding_pub_tokens` and `locked_amount_collateral`
/// share the same key set. The constructor enforces both; every mutating
/// helper on this type preserves them (or returns an error and leaves the
/// custodian untouched).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Custodian {
    pub incognito_address: IncAddress,
    pub total_collateral: u64,
    pub free_collateral: u64,
    pub holding_pub_tokens: BTreeMap<TokenId, u64>,
    pub locked_amount_collateral: BTreeMap<TokenId, u64>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodianError {
    #[error("sum(locked) + free ({0}) != total ({1})")]
    CollateralMismatch(u64, u64),
    #[error("holding_pub_tokens and locked_amount_collateral key sets differ")]
    KeySetMismatch,
    #[error("token {0} not held by this custodian")]
    UnknownToken(TokenId),
    #[error("locked collateral {have} for token {token} less than required {need}")]
    InsufficientLocked { token: TokenId, have: u64, need: u64 },
    #[error("total collateral {have} less than required {need}")]
    InsufficientTotal { have: u64, need: u64 },
    #[error("free collateral {have} less than required {need}")]
    InsufficientFree { have: u64, need: u64 },
}

impl Custodian {
    pub fn new(
        incognito_address: IncAddress,
        total_collateral: u64,
        free_collateral: u64,
        holding_pub_tokens: BTreeMap<TokenId, u64>,
        locked_amount_collateral: BTreeMap<TokenId, u64>,
    ) -> Result<Self, CustodianError> {
        let locked_sum: u64 = locked_amount_collateral.values().sum();
        if locked_sum + free_collateral != total_collateral {
            return Err(CustodianError::CollateralMismatch(
                locked_sum + free_collateral,
                total_collateral,
            ));
        }
        let holding_keys: std::collections::BTreeSet<_> = holding_pub_tokens.keys().collect();
        let locked_keys: std::collections::BTreeSet<_> = locked_amount_collateral.keys().collect();
        if holding_keys != locked_keys {
            return Err(CustodianError::KeySetMismatch);
        }
        Ok(Self {
            incognito_address,
            total_collateral,
            free_collateral,
            holding_pub_tokens,
            locked_amount_collateral,
        })
    }

    pub fn invariant_holds(&self) -> bool {
        let locked_sum: u64 = self.locked_amount_collateral.values().sum();
        locked_sum + self.free_collateral == self.total_collateral
            && self.holding_pub_tokens.keys().collect::<std::collections::BTreeSet<_>>()
                == self.locked_amount_collateral.keys().collect()
    }

    /// Runaway-liquidation update (§4.3.1): mint `minted_prv` of collateral
    /// to the redeemer by decreasing both `total_collateral` and
    /// `locked_amount_collateral[token]`, and remove `pub_token_amount` of
    /// the matched redeem from `holding_pub_tokens[token]`.
    pub fn apply_runaway_liquidation(
        &mut self,
        token_id: &str,
        minted_prv: u64,
        pub_token_amount: u64,
    ) -> Result<(), CustodianError> {
        let locked = self
            .locked_amount_collateral
            .get(token_id)
            .copied()
            .ok_or_else(|| CustodianError::UnknownToken(token_id.to_string()))?;
        if self.total_collateral < minted_prv {
            return Err(CustodianError::InsufficientTotal { have: self.total_collateral, need: minted_prv });
        }
        if locked < minted_prv {
            return Err(CustodianError::InsufficientLocked {
                token: token_id.to_string(),
                have: locked,
                need: minted_prv,
            });
        }
        self.total_collateral -= minted_prv;
        self.locked_amount_collateral.insert(token_id.to_string(), locked - minted_prv);
        let holding = self.holding_pub_tokens.entry(token_id.to_string()).or_insert(0);
        *holding = holding.saturating_sub(pub_token_amount);
        Ok(())
    }

    /// Expired-porting refund (§4.3.2): return previously locked collateral
    /// to `free_collateral` without touching `total_collateral` (see
    /// SPEC_FULL.md §4.3 for why `total_collateral` is left alone).
    pub fn apply_expired_porting_refund(&mut self, token_id: &str, locked_amount: u64) {
        if let Some(locked) = self.locked_amount_collateral.get_mut(token_id) {
            *locked = locked.saturating_sub(locked_amount);
        }
        self.free_collateral += locked_amount;
    }

    /// TP120 full liquidation (§4.3.3 step 2): move all holdings and locked
    /// collateral for `token_id` out of the custodian. Returns the amounts
    /// that were moved, to be folded into the per-token liquidation pool.
    pub fn apply_tp120_liquidation(&mut self, token_id: &str) -> (u64, u64) {
        let freed_collateral = self.locked_amount_collateral.remove(token_id).unwrap_or(0);
        let freed_pub_token = self.holding_pub_tokens.remove(token_id).unwrap_or(0);
        self.total_collateral = self.total_collateral.saturating_sub(freed_collateral);
        (freed_collateral, freed_pub_token)
    }

    /// Deposit paid from outside the custodian's existing balances
    /// (§4.3.5, `FreeCollateralSelected = false`).
    pub fn apply_deposit_from_total(&mut self, token_id: &str, amount: u64) {
        self.total_collateral += amount;
        *self.locked_amount_collateral.entry(token_id.to_string()).or_insert(0) += amount;
    }

    /// Deposit paid out of the custodian's own free collateral
    /// (§4.3.5, `FreeCollateralSelected = true`).
    pub fn apply_deposit_from_free(&mut self, token_id: &str, amount: u64) -> Result<(), CustodianError> {
        if self.free_collateral < amount {
            return Err(CustodianError::InsufficientFree { have: self.free_collateral, need: amount });
        }
        self.free_collateral -= amount;
        *self.locked_amount_collateral.entry(token_id.to_string()).or_insert(0) += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custodian(total: u64, free: u64, holding: u64, locked: u64) -> Custodian {
        let mut h = BTreeMap::new();
        let mut l = BTreeMap::new();
        h.insert("T".to_string(), holding);
        l.insert("T".to_string(), locked);
        Custodian::new("cusA".to_string(), total, free, h, l).unwrap()
    }

    #[test]
    fn rejects_mismatched_collateral() {
        let mut h = BTreeMap::new();
        let mut l = BTreeMap::new();
        h.insert("T".to_string(), 10u64);
        l.insert("T".to_string(), 10u64);
        let err = Custodian::new("cus".to_string(), 5, 0, h, l).unwrap_err();
        assert_eq!(err, CustodianError::CollateralMismatch(10, 5));
    }

    #[test]
    fn runaway_liquidation_failed_when_locked_insufficient() {
        // Mirrors spec.md S1: Locked[T]=2000 < mintPRV=2100.
        let mut cus = custodian(2000, 0, 1000, 2000);
        let err = cus.apply_runaway_liquidation("T", 2100, 1000).unwrap_err();
        assert!(matches!(err, CustodianError::InsufficientLocked { .. }));
        assert!(cus.invariant_holds());
    }

    #[test]
    fn runaway_liquidation_success_preserves_invariant() {
        let mut cus = custodian(3000, 0, 1000, 3000);
        cus.apply_runaway_liquidation("T", 2100, 1000).unwrap();
        assert_eq!(cus.total_collateral, 900);
        assert_eq!(cus.locked_amount_collateral["T"], 900);
        assert_eq!(cus.holding_pub_tokens["T"], 0);
        assert!(cus.invariant_holds());
    }

    #[test]
    fn expired_porting_refund_preserves_invariant() {
        let mut cus = custodian(500, 0, 250, 500);
        cus.apply_expired_porting_refund("T", 500);
        assert_eq!(cus.free_collateral, 500);
        assert_eq!(cus.locked_amount_collateral["T"], 0);
        assert_eq!(cus.total_collateral, 500);
        assert!(cus.invariant_holds());
    }

    #[test]
    fn tp120_liquidation_zeroes_token_and_preserves_invariant() {
        let mut cus = custodian(110, 0, 100, 110);
        let (freed_collateral, freed_pub_token) = cus.apply_tp120_liquidation("T");
        assert_eq!(freed_collateral, 110);
        assert_eq!(freed_pub_token, 100);
        assert_eq!(cus.total_collateral, 0);
        assert!(cus.locked_amount_collateral.get("T").is_none());
        assert!(cus.invariant_holds());
    }
}
