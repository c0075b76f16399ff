//! Logging setup for axon
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a `fmt`
//! layer writing to stderr, so stdout stays free for completion output.

use axon_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize logging from configuration
///
/// The filter is taken from the config, then `RUST_LOG`, then
/// `default_filter`. Calling this more than once keeps the first subscriber.
///
/// # Errors
///
/// Returns an error if the configured filter directive is invalid
pub fn init(config: Option<&TelemetryConfig>, default_filter: &str) -> anyhow::Result<()> {
    let filter = build_filter(config.and_then(|c| c.log_filter.as_deref()), default_filter)?;
    let format = config.map(|c| c.log_format).unwrap_or_default();

    let result = match format {
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
        }
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }

    Ok(())
}

fn build_filter(configured: Option<&str>, default_filter: &str) -> anyhow::Result<EnvFilter> {
    if let Some(directive) = configured {
        return EnvFilter::try_new(directive).map_err(|e| anyhow::anyhow!("invalid log_filter '{directive}': {e}"));
    }

    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
}
