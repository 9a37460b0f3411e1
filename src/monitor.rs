//! Execution timing for agent components.

use std::future::Future;
use std::time::Instant;

/// Run `f`, logging how long it took under `component`.
pub fn time_component<T>(component: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    tracing::info!(
        "{} took {:.4} seconds",
        component,
        start.elapsed().as_secs_f64()
    );
    out
}

/// Await `fut`, logging how long it took under `component`.
pub async fn timed<F: Future>(component: &str, fut: F) -> F::Output {
    let start = Instant::now();
    let out = fut.await;
    tracing::info!(
        "{} took {:.4} seconds",
        component,
        start.elapsed().as_secs_f64()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_component_passes_value_through() {
        assert_eq!(time_component("sum", || 2 + 2), 4);
    }

    #[tokio::test]
    async fn test_timed_passes_value_through() {
        let value = timed("ready", async { "done" }).await;
        assert_eq!(value, "done");
    }
}
