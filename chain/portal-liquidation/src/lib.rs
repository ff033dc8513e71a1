//! Deterministic per-beacon-height custodian liquidation engine: the five
//! fixed-order passes of SPEC_FULL.md §4.3 plus the instruction tuples
//! they emit.

pub mod config;
pub mod deposit;
pub mod engine;
pub mod expired_porting;
pub mod instruction;
pub mod redeem_liquidate;
pub mod runaway;
pub mod tp;

pub use config::PortalConfig;
pub use deposit::{LiquidationCustodianDepositRequest, up_150_percent};
pub use engine::{run_beacon_height, BeaconHeightInputs};
pub use instruction::{
    ExpiredWaitingPortingReqContent, Instruction, LiquidateCustodianContent,
    LiquidateTpExchangeRatesContent, LiquidationCustodianDepositContent, MetaType,
    RedeemLiquidateExchangeRatesContent, Status,
};
pub use redeem_liquidate::{total_liquidation_by_exchange_rates, RedeemFromLiquidationPoolRequest};
pub use tp::{classify, ratio_percent, TpBucket};
