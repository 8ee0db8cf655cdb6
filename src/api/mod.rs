//! HTTP API Module
//!
//! The thin HTTP surface over the order store: submission, listing with
//! dashboard counts, total count, and the administrative reset. No core
//! state transition happens here beyond order creation; error detail never
//! crosses this boundary beyond a generic failure message.
//!
//! ## Submodules
//! - **`protocol`**: Request/response DTOs.
//! - **`handlers`**: The axum handlers.

pub mod handlers;
pub mod protocol;
