//! Tracing setup.
//!
//! The filter honors `RUST_LOG` and falls back to the configured level. Log
//! lines go to stdout, JSON-formatted outside of development; when a log
//! directory is configured a non-blocking daily-rolling file layer is added.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use super::config::{Config, Environment};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn init(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![env_filter.boxed()];

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    match config.environment {
        Environment::Development => layers.push(stdout_layer.boxed()),
        Environment::Production | Environment::Test => layers.push(stdout_layer.json().boxed()),
    }

    if let Some(log_dir) = &config.log_dir {
        let _ = std::fs::create_dir_all(log_dir);

        let file_appender = tracing_appender::rolling::daily(log_dir, "engram-server.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();
}
