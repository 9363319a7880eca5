use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter used by every binary.
/// - `RUST_LOG` wins when set
/// - otherwise the configured level, with `tower_http` request spans kept at the same level
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level))
}

fn default_filter(level: &str) -> EnvFilter {
    let level = level.trim().to_ascii_lowercase();
    let level = match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => level,
        "warning" => "warn".to_string(),
        _ => "info".to_string(),
    };
    EnvFilter::new(format!("{level},tower_http={level},axum=info,hyper=info,reqwest=info"))
}

/// Initialize the tracing subscriber.
/// - `format == "json"` emits one JSON object per line, anything else the compact text format
/// - Writes to stdout for consistent container logging behavior
pub fn init_logging(level: &str, format: &str) {
    let env_filter = build_filter(level);
    if format.eq_ignore_ascii_case("json") {
        let _ = fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .with_writer(io::stdout)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(io::stdout)
            .try_init();
    }
}

/// Defaults used before configuration is available (e.g. CLI argument errors).
pub fn init_logging_default() {
    init_logging("info", "text");
}
