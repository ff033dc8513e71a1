//! Process-wide observability: a `tracing` subscriber builder and the
//! prometheus metrics shared between the network and liquidation crates,
//! grounded in `near-o11y`'s `EnvFilter`-driven subscriber setup and the
//! `metrics::APPLIED_TRIE_INSERTIONS`-style counter pattern used throughout
//! `near-store`.

pub mod metrics;

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `tracing` subscriber reading its filter directives
/// from `RUST_LOG`, falling back to `default_filter` (typically `"info"`)
/// when the variable is unset. Returns an error instead of panicking if a
/// global subscriber is already installed, so embedding crates and test
/// binaries can call this more than once safely.
pub fn init_logging(
    default_filter: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt().with_env_filter(filter).with_target(true).try_init()
}
