use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a filter directive, e.g. `codefield=debug`.
pub const LOG_ENV: &str = "CODEFIELD_LOG";

/// Installs a plain-text subscriber writing to stderr, filtered by
/// [`LOG_ENV`] or, when unset or invalid, by `default_directive`.
///
/// Safe to call more than once: returns `false` when a global subscriber is
/// already set (an add-on reload, or a host with its own subscriber).
pub fn init_logging(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
