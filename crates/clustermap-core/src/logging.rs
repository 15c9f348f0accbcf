#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! This module re-exports `debug!` and `trace!` when the `tracing` feature is
//! enabled. Without it, no-op macros with the same names are exported at the
//! crate root, so downstream crates can write `clustermap_core::debug!(...)`
//! unconditionally.
//!
//! With `tracing-json`, [`init_json_subscriber`] installs a JSON formatter
//! filtered by `RUST_LOG` (defaulting to `info`).

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op `debug!` when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op `trace!` when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
}

/// Install a global JSON subscriber honoring `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
