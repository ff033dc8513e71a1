//! Core data model shared by the portal liquidation engine and its callers.
//!
//! Every collection keyed by a string identifier is a `BTreeMap`, never a
//! `HashMap`: the liquidation engine iterates these maps in order and the
//! resulting instruction sequence must be byte-identical across validators
//! (see the determinism invariant in the portal-liquidation crate).

mod custodian;
mod porting;
mod rates;
mod redeem;
mod state;

pub use custodian::{Custodian, CustodianError};
pub use porting::{MatchedPortingCustodian, WaitingPortingRequest};
pub use rates::{FinalExchangeRates, LiquidateExchangeRatesDetail, LiquidateExchangeRatesPool};
pub use redeem::{MatchedCustodian, WaitingRedeemRequest};
pub use state::CurrentPortalState;

/// Token identifier for a cross-chain public token, e.g. `"pBTC"`.
pub type TokenId = String;

/// Opaque incognito-address identifying a custodian, redeemer or porter.
pub type IncAddress = String;
