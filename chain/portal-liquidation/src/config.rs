use serde::{Deserialize, Serialize};

/// Tunable thresholds and percentages for the liquidation engine, loaded
/// from the node's TOML config the way `near-chain-configs`-style crates
/// load genesis parameters. Defaults mirror the values used throughout
/// `beaconportalliquidationproducer.go`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Percentage (of the matched amount's PRV value) minted to the
    /// redeemer when a custodian goes unresponsive past its deadline.
    pub percent_received_collateral_amount: u64,
    /// Collateral/debt ratio, in percent, below which a custodian enters
    /// TP120 (full liquidation).
    pub tp120_threshold_percent: u64,
    /// Ratio below which a custodian enters TP130 (partial, cure-eligible
    /// liquidation).
    pub tp130_threshold_percent: u64,
    /// Ratio below which a custodian enters TP150 (warning only, no
    /// liquidation instruction emitted).
    pub tp150_threshold_percent: u64,
    /// Minimum PRV fee charged on a redeem-from-liquidation-pool request.
    pub min_redeem_fee: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            percent_received_collateral_amount: 105,
            tp120_threshold_percent: 120,
            tp130_threshold_percent: 130,
            tp150_threshold_percent: 150,
            min_redeem_fee: 0,
        }
    }
}
