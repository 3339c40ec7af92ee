use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// The filter is taken from `RUST_LOG` when set, defaulting to `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
