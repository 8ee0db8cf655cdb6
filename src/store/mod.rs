//! Order Store Module
//!
//! The single shared source of truth for order state, and the only
//! synchronization primitive in the system: every status transition is an
//! atomic operation on the store, so multiple worker instances can run
//! against it with no in-process lock and no external lock service.
//!
//! ## Submodules
//! - **`types`**: The order record, its status enum, and the id type.
//! - **`orders`**: The `OrderStore` with the claim/reclaim/fail/complete
//!   transitions and the read surface used by the dashboard endpoints.

pub mod orders;
pub mod types;

#[cfg(test)]
mod tests;
