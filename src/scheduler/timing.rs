//! Explicit duration instrumentation.
//!
//! Invoked around a call site rather than attached through interception, so
//! what is being measured is visible where it happens.

use std::future::Future;
use std::time::Instant;

/// Awaits `fut`, logging how long it took under `label`.
pub async fn time_it<T, F>(label: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let result = fut.await;
    tracing::debug!(
        "Timing {} {:.1} ms",
        label,
        started.elapsed().as_secs_f64() * 1000.0
    );
    result
}

/// Synchronous counterpart of [`time_it`].
pub fn time_it_sync<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let result = f();
    tracing::debug!(
        "Timing {} {:.1} ms",
        label,
        started.elapsed().as_secs_f64() * 1000.0
    );
    result
}
