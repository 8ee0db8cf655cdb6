//! Scheduler Module
//!
//! The periodic driver of order processing. Each tick runs the reclaim and
//! exhaustion sweeps, then claims and processes at most one order. A
//! per-instance bound on concurrently in-flight ticks keeps a slow processing
//! cycle from piling up behind the interval.
//!
//! ## Submodules
//! - **`scheduler`**: The `OrderScheduler` loop and the processing cycle.
//! - **`timing`**: Explicit duration instrumentation around calls.

pub mod scheduler;
pub mod timing;
