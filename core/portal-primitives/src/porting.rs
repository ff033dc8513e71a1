use serde::{Deserialize, Serialize};

use crate::{IncAddress, TokenId};

/// One custodian's share of a `WaitingPortingRequest`'s match list. Porting
/// collateral is fenced off from the custodian's `free_collateral` into
/// `locked_amount_collateral` at match time; if the request expires
/// unclaimed, the same amount is returned (§4.3.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPortingCustodian {
    pub incognito_address: IncAddress,
    pub amount: u64,
    pub locked_amount_collateral: u64,
}

/// A porting request waiting for the porter to submit proof of deposit
/// before `expired_at_height`. If it expires first, the Expired
/// Waiting-Porting pass (§4.3.2) refunds every matched custodian and
/// removes the request from `CurrentPortalState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingPortingRequest {
    pub unique_porting_id: String,
    pub token_id: TokenId,
    pub porter_address: IncAddress,
    pub beacon_height: u64,
    pub expired_at_height: u64,
    pub custodians: Vec<MatchedPortingCustodian>,
}

impl WaitingPortingRequest {
    pub fn is_expired(&self, current_beacon_height: u64) -> bool {
        current_beacon_height > self.expired_at_height
    }
}
