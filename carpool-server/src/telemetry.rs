//! Logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Install the global `tracing` subscriber.
///
/// An unparsable filter falls back to `info`. Call once, at startup.
pub fn init(format: LogFormat, filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
