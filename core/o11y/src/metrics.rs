use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};

pub static FRAMES_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "portal_network_frames_dropped_total",
        "Peer frames dropped before or during dispatch, by reason",
    );
    IntCounterVec::new(opts, &["reason"]).unwrap()
});

pub static DISPATCH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "portal_network_dispatch_total",
        "Peer messages successfully dispatched, by command",
    );
    IntCounterVec::new(opts, &["command"]).unwrap()
});

pub static LIQUIDATION_INSTRUCTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "portal_liquidation_instructions_total",
        "Instructions emitted by the liquidation engine, by meta type and status",
    );
    IntCounterVec::new(opts, &["meta_type", "status"]).unwrap()
});

/// Registers every metric declared in this module with `registry`. Call
/// once at process start; safe to skip in unit tests that don't scrape
/// metrics.
pub fn register(registry: &prometheus::Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(FRAMES_DROPPED_TOTAL.clone()))?;
    registry.register(Box::new(DISPATCH_TOTAL.clone()))?;
    registry.register(Box::new(LIQUIDATION_INSTRUCTIONS_TOTAL.clone()))?;
    Ok(())
}
