use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

/// Initialize tracing with pretty output for development and JSON for
/// production. Everything is written to stderr; stdout carries results only.
///
/// Filtering follows `RUST_LOG` (default `info`). Calling this more than once
/// keeps the first subscriber.
pub fn setup_logging(environment: Environment) {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _ = match environment {
        Environment::Production => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        Environment::Development => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
}
