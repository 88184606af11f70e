//! Diagnostic output setup.
//!
//! All user-visible reporting goes through `tracing`; this helper installs a
//! subscriber in either human-readable or structured (JSON) form. The filter
//! honors `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(structured: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if structured {
        let _ = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
