//! provides logging helpers

use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Output format of the stderr log layer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// initiate the global tracing subscriber
///
/// Verbosity defaults to `INFO` and can be overridden with `RUST_LOG`.
pub fn init(format: LogFormat) {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    match format {
        LogFormat::Text => {
            let fmt_layer = layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(env_filter);
            registry().with(fmt_layer).init();
        }
        LogFormat::Json => {
            let fmt_layer = layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .with_filter(env_filter);
            registry().with(fmt_layer).init();
        }
    }
}
