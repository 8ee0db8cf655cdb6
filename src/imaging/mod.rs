//! Image I/O Adapter Module
//!
//! Thin contract between the processing cycle and image storage: fetch source
//! bytes by derived image id, persist output bytes under the same id. Output
//! keys are deterministic, so a duplicate write after a lease expiry is a
//! harmless overwrite rather than corruption.
//!
//! ## Submodules
//! - **`adapters`**: The `ImageSource`/`ImageSink` contracts, the HTTP fetch
//!   implementation, and the filesystem sink.

pub mod adapters;

pub use adapters::{FsImageSink, HttpImageSource, ImageSink, ImageSource};

use crate::store::types::OrderId;

/// Derives the source image reference for an order. The image library cycles
/// every 1000 orders.
pub fn image_id(order_id: OrderId) -> i64 {
    (order_id.0 % 1000) + 1
}
