use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
}
