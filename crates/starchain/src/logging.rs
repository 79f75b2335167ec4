//! Tracing subscriber setup.
//!
//! Output goes to stderr, filtered by `RUST_LOG` when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global tracing subscriber.
///
/// Call this once, early in `main()`. A second call panics.
///
/// `default_level` applies when `RUST_LOG` is unset, e.g. `"info"` or
/// `"starchain=debug,starchain_store=info"`.
pub fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    tracing::info!("logging initialized");
}

/// Like [`init_logging`], but returns false instead of panicking when a
/// subscriber is already installed.
pub fn try_init_logging(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
