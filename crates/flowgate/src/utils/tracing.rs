use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once. `RUST_LOG` wins over the configured
/// level so operators can raise verbosity per-module without touching the
/// service configuration. The default `tracing-log` bridge also picks up
/// the `log` records emitted by the langflow client crate.
pub fn init_tracing(log_level: &str) {
    let log_level = log_level.to_string();
    INIT.get_or_init(move || {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level.to_lowercase()));

        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
