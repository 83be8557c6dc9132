use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,service=debug,reqwest=warn";

fn filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback.unwrap_or(DEFAULT_FILTER)))
}

/// Initialize tracing subscriber with sensible defaults and stdout writer.
/// - Respects `RUST_LOG` if set
/// - Falls back to `fallback`, or `info,service=debug,reqwest=warn`
/// - Writes to stdout to improve visibility in environments that hide stderr
pub fn init_logging_default(fallback: Option<&str>) {
    let _ = fmt()
        .with_env_filter(filter(fallback))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// Same filter rules as [`init_logging_default`]; one JSON object per line.
pub fn init_logging_json(fallback: Option<&str>) {
    let _ = fmt()
        .with_env_filter(filter(fallback))
        .with_target(true)
        .json()
        .with_writer(io::stdout)
        .try_init();
}
