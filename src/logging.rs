//! Logging setup shared by both binaries.

use tracing_subscriber::EnvFilter;

/// Map a `LOG_LEVEL` value (Python-style names included) to a tracing directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        _ => "info",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter is derived from `LOG_LEVEL`, with
/// request tracing from `tower_http` kept at the same level.
pub fn init_logging(log_level: &str) {
    let directive = level_directive(log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "dsa_notes_agent={0},dsa_agent_api={0},dsa_agent_ui={0},tower_http={0}",
            directive
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_level_names() {
        assert_eq!(level_directive("INFO"), "info");
        assert_eq!(level_directive("warning"), "warn");
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("Debug"), "debug");
        assert_eq!(level_directive("nonsense"), "info");
    }
}
