//! Tracing initialisation for Atlantis binaries.
//!
//! The filter is read from `ATLANTIS_LOG`, then `RUST_LOG`, then the level
//! passed in. `ATLANTIS_LOG_FORMAT=json` forces JSON output.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Env var holding the log filter directive.
pub const LOG_ENV: &str = "ATLANTIS_LOG";

/// Env var selecting the output format (`json` or `text`).
pub const LOG_FORMAT_ENV: &str = "ATLANTIS_LOG_FORMAT";

/// Initialise the global tracing subscriber.
///
/// JSON lines carry the current request span (request id, repo, pull) so a
/// log pipeline can group lines by request. Returns `false` if a subscriber
/// was already installed.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let json = json
        || std::env::var(LOG_FORMAT_ENV)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    installed.is_ok()
}
