//! Tracing subscriber setup. `RUST_LOG` wins over the configured level.

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{level},catalog_api={level},tower_http=info,sqlx=warn"))
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(level: &str, format: LogFormat) {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(level)).with_target(true);
    let result = match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
