use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an order.
///
/// Sequential integer assigned by the store on creation. Kept numeric because
/// the source image reference is derived from it (`(id % 1000) + 1`).
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct OrderId(pub i64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    /// Placed but not yet picked up by any worker. Also the state an order
    /// returns to after a failed or abandoned processing attempt.
    Queued,
    /// Exclusively leased to one worker instance. The lease lapses when
    /// `date_processing` grows older than the configured lock timeout.
    Processing,
    /// Processed successfully. Terminal.
    Complete,
    /// Retries exhausted. Terminal; never offered to a worker again.
    Failed,
}

/// A single order record.
///
/// Mutated only through `OrderStore` operations; the status transitions move
/// strictly along Queued -> Processing -> {Complete | Queued} and
/// Queued -> Failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product: String,
    pub customer: String,
    pub status: OrderStatus,
    /// Set at creation, never changed.
    pub date_placed: DateTime<Utc>,
    /// Stamped on every claim; the lease start. Overwritten on re-claim.
    pub date_processing: Option<DateTime<Utc>>,
    /// Non-null exactly when status is Complete.
    pub date_processed: Option<DateTime<Utc>>,
    /// Identity of the worker instance holding (or last holding) the lease.
    pub processed_by: Option<String>,
    /// Opaque payload attached at creation time.
    pub download: Vec<u8>,
    /// Percentage of edge pixels in the rendered output, set on completion.
    pub edginess: Option<f64>,
    /// Number of abandoned or failed processing attempts. Never decreases.
    pub failed_count: u32,
}
