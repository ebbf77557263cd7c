use escrow_setup_env as tf_env;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the fmt subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let filter = tf_env::rust_log()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
