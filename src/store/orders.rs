//! The shared order store.
//!
//! Backed by a `DashMap` keyed by order id. Every state transition happens
//! under the entry lock of the order it touches, with the current status
//! re-checked before writing, so a transition is an atomic compare-and-set:
//! two workers racing for the same order cannot both win the claim, and a
//! reclaim cannot resurrect an order that completed in the meantime.

use super::types::{Order, OrderId, OrderStatus};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// How far back the dashboard's "recent" window reaches.
const DISPLAY_WINDOW_MINUTES: i64 = 10;

/// Maximum number of orders returned for display.
const DISPLAY_LIMIT: usize = 20;

/// The central component managing order state.
///
/// Shared between the HTTP handlers (submission, listing) and any number of
/// scheduler instances (claim, reclaim, complete). All synchronization between
/// workers goes through this store; there is no other lock in the system.
pub struct OrderStore {
    orders: DashMap<OrderId, Order>,
    next_id: AtomicI64,
}

impl OrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Creates a new order record.
    ///
    /// Orders start Queued unless a processed date is supplied at creation,
    /// in which case they are recorded as already Complete (used when seeding
    /// historical data).
    pub fn add_order(
        &self,
        product: &str,
        customer: &str,
        date_placed: DateTime<Utc>,
        date_processed: Option<DateTime<Utc>>,
        download: Vec<u8>,
    ) -> Order {
        let id = OrderId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let status = if date_processed.is_some() {
            OrderStatus::Complete
        } else {
            OrderStatus::Queued
        };
        let order = Order {
            id,
            product: product.to_string(),
            customer: customer.to_string(),
            status,
            date_placed,
            date_processing: None,
            date_processed,
            processed_by: None,
            download,
            edginess: None,
            failed_count: 0,
        };
        self.orders.insert(id, order.clone());
        tracing::debug!("Added order {} ({}, {})", id, product, customer);
        order
    }

    /// Claims the next order for exclusive processing by `worker`.
    ///
    /// Selects the Queued order with the earliest `date_placed` (ties broken
    /// by ascending id), transitions it to Processing, stamps the lease start
    /// and the worker identity, and returns the updated record. Returns `None`
    /// when nothing is queued.
    ///
    /// The transition is a compare-and-set under the entry lock: the status is
    /// re-checked after the lock is taken, so a concurrent claimer that won the
    /// race makes this call fall through to the next candidate rather than
    /// double-claim.
    pub fn claim_next(&self, worker: &str, now: DateTime<Utc>) -> Option<Order> {
        let mut candidates: Vec<(DateTime<Utc>, OrderId)> = self
            .orders
            .iter()
            .filter(|entry| entry.value().status == OrderStatus::Queued)
            .map(|entry| (entry.value().date_placed, *entry.key()))
            .collect();
        candidates.sort();

        for (_, id) in candidates {
            if let Some(mut entry) = self.orders.get_mut(&id) {
                let order = entry.value_mut();
                // Another worker may have claimed it between the scan and here.
                if order.status != OrderStatus::Queued {
                    continue;
                }
                order.status = OrderStatus::Processing;
                order.date_processing = Some(now);
                order.processed_by = Some(worker.to_string());
                tracing::debug!("Order {} claimed by {}", id, worker);
                return Some(order.clone());
            }
        }

        None
    }

    /// Returns every lease-expired order to the queue.
    ///
    /// An order whose lease started more than `lock_timeout` before `now` is
    /// assumed abandoned by a crashed or hung worker: it goes back to Queued
    /// with `failed_count` incremented by one. This sweep is the only way an
    /// abandoned claim is ever released. Returns the number of orders moved.
    pub fn reclaim_stuck(&self, lock_timeout: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - lock_timeout;
        let mut reclaimed = 0;

        for mut entry in self.orders.iter_mut() {
            let order = entry.value_mut();
            if order.status != OrderStatus::Processing {
                continue;
            }
            let expired = matches!(order.date_processing, Some(started) if started < cutoff);
            if expired {
                order.status = OrderStatus::Queued;
                order.failed_count += 1;
                reclaimed += 1;
                tracing::info!(
                    "Reclaimed order {} from {:?} (attempt {})",
                    order.id,
                    order.processed_by,
                    order.failed_count
                );
            }
        }

        reclaimed
    }

    /// Marks every Queued order that has exceeded its retry budget as Failed.
    ///
    /// Failed is terminal: these orders are never offered by `claim_next`
    /// again and surface to operators only through the listing counts.
    /// Returns the number of orders moved.
    pub fn fail_exhausted(&self, max_retries: u32) -> usize {
        let mut failed = 0;

        for mut entry in self.orders.iter_mut() {
            let order = entry.value_mut();
            if order.status == OrderStatus::Queued && order.failed_count > max_retries {
                order.status = OrderStatus::Failed;
                failed += 1;
                tracing::warn!(
                    "Order {} failed permanently after {} attempts",
                    order.id,
                    order.failed_count
                );
            }
        }

        failed
    }

    /// Returns a Processing order to the queue after a failed attempt,
    /// incrementing `failed_count`. Called by the scheduler when the
    /// processing cycle raised an error.
    pub fn mark_for_retry(&self, id: OrderId) -> Result<()> {
        let mut entry = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("Order {} not found", id))?;
        let order = entry.value_mut();
        if order.status != OrderStatus::Processing {
            return Err(anyhow::anyhow!(
                "Order {} not processing (status: {:?})",
                id,
                order.status
            ));
        }
        order.status = OrderStatus::Queued;
        order.failed_count += 1;
        Ok(())
    }

    /// Completes a Processing order, recording its edginess score and the
    /// completion time. Terminal transition.
    pub fn complete(&self, id: OrderId, edginess: f64, now: DateTime<Utc>) -> Result<Order> {
        let mut entry = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("Order {} not found", id))?;
        let order = entry.value_mut();
        if order.status != OrderStatus::Processing {
            return Err(anyhow::anyhow!(
                "Order {} not processing (status: {:?})",
                id,
                order.status
            ));
        }
        order.status = OrderStatus::Complete;
        order.edginess = Some(edginess);
        order.date_processed = Some(now);
        Ok(order.clone())
    }

    /// Looks up a single order.
    pub fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).map(|entry| entry.value().clone())
    }

    /// Orders for the dashboard: everything unfinished plus anything that
    /// completed within the display window, oldest placed first, bounded.
    pub fn orders_to_display(&self, now: DateTime<Utc>) -> Vec<Order> {
        let cutoff = display_cutoff(now);
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| match entry.value().date_processed {
                None => true,
                Some(processed) => processed >= cutoff,
            })
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|order| (order.date_placed, order.id));
        orders.truncate(DISPLAY_LIMIT);
        orders
    }

    /// Orders still waiting on a worker (Queued or currently Processing).
    pub fn queued_count(&self) -> usize {
        self.orders
            .iter()
            .filter(|entry| {
                matches!(
                    entry.value().status,
                    OrderStatus::Queued | OrderStatus::Processing
                )
            })
            .count()
    }

    /// Orders placed within the display window.
    pub fn recently_placed_count(&self, now: DateTime<Utc>) -> usize {
        let cutoff = display_cutoff(now);
        self.orders
            .iter()
            .filter(|entry| entry.value().date_placed >= cutoff)
            .count()
    }

    /// Orders completed within the display window.
    pub fn recently_processed_count(&self, now: DateTime<Utc>) -> usize {
        let cutoff = display_cutoff(now);
        self.orders
            .iter()
            .filter(|entry| matches!(entry.value().date_processed, Some(p) if p >= cutoff))
            .count()
    }

    /// Total number of orders in the store.
    pub fn count_orders(&self) -> usize {
        self.orders.len()
    }

    /// Administrative bulk clear. Returns the number of rows removed.
    pub fn clear_orders(&self) -> usize {
        let removed = self.orders.len();
        self.orders.clear();
        removed
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

fn display_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::minutes(DISPLAY_WINDOW_MINUTES)
}
