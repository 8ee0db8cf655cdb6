//! Order Fulfilment Service Library
//!
//! This library crate defines the core modules that make up the order fulfilment
//! system. It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of five loosely coupled subsystems:
//!
//! - **`store`**: The shared order store. Holds every order record and exposes the
//!   atomic state transitions (claim, reclaim, fail, complete) that give at most
//!   one worker instance an active lease on any order.
//! - **`scheduler`**: The periodic driver. Each tick sweeps expired leases, fails
//!   orders that exhausted their retries, then claims and processes at most one order.
//! - **`detect`**: The edge detection engine. A pure, deterministic six-stage Canny
//!   pipeline turning a source image into an edge map and an "edginess" score.
//! - **`imaging`**: The image I/O adapter. Fetches source bytes by derived image id
//!   and persists the rendered edge map under the same id.
//! - **`api`**: The HTTP surface for order submission, listing, and counts.

pub mod api;
pub mod config;
pub mod detect;
pub mod imaging;
pub mod scheduler;
pub mod store;
