use serde::{Deserialize, Serialize};

use crate::{IncAddress, TokenId};

/// One custodian's share of a `WaitingRedeemRequest`'s match list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedCustodian {
    pub incognito_address: IncAddress,
    /// Public-token amount this custodian is on the hook to return.
    pub amount: u64,
    /// PRV collateral locked against `amount`, in the redeemed token.
    pub locked_amount_collateral: u64,
}

/// A redeem request waiting on one or more custodians to return the
/// underlying public token, tracked from the beacon height it was matched
/// at until every matched custodian is resolved (normal redeem, runaway
/// liquidation, or top-percentile liquidation payout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingRedeemRequest {
    pub unique_redeem_id: String,
    pub token_id: TokenId,
    pub redeemer_address: IncAddress,
    pub redeem_amount: u64,
    pub beacon_height: u64,
    pub custodians: Vec<MatchedCustodian>,
}

impl WaitingRedeemRequest {
    /// Sum of every matched custodian's outstanding public-token amount.
    /// Used to prove invariant 2 (redeem match-amount bound) in tests.
    pub fn total_matched_amount(&self) -> u64 {
        self.custodians.iter().map(|c| c.amount).sum()
    }

    pub fn remove_custodian(&mut self, incognito_address: &str) {
        self.custodians.retain(|c| c.incognito_address != incognito_address);
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.custodians.is_empty()
    }
}
