//! Order Store Tests
//!
//! Validates the atomic state transitions and the lease mechanics.
//!
//! ## Test Scopes
//! - **Claiming**: FIFO ordering, tie-breaking, lease stamping, and mutual
//!   exclusion between concurrent claimers.
//! - **Sweeps**: Lease-expiry reclaim and retry exhaustion.
//! - **Lifecycle**: The full claim -> timeout -> reclaim -> exhaustion scenario.

#[cfg(test)]
mod tests {
    use crate::store::orders::OrderStore;
    use crate::store::types::{OrderId, OrderStatus};
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn base_time() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    fn seed(store: &OrderStore, count: usize, placed: DateTime<Utc>) {
        for i in 0..count {
            store.add_order(
                &format!("product-{}", i),
                "customer",
                placed + Duration::seconds(i as i64),
                None,
                Vec::new(),
            );
        }
    }

    // ============================================================
    // CLAIMING
    // ============================================================

    #[test]
    fn test_claim_returns_earliest_placed() {
        let store = OrderStore::new();
        let now = base_time();

        // Insert out of placement order
        store.add_order("late", "c", now + Duration::minutes(5), None, Vec::new());
        let earliest = store.add_order("early", "c", now, None, Vec::new());
        store.add_order("middle", "c", now + Duration::minutes(2), None, Vec::new());

        let claimed = store.claim_next("worker-1", now).expect("should claim");
        assert_eq!(claimed.id, earliest.id);
        assert_eq!(claimed.product, "early");
    }

    #[test]
    fn test_claim_ties_broken_by_ascending_id() {
        let store = OrderStore::new();
        let now = base_time();

        let first = store.add_order("a", "c", now, None, Vec::new());
        let second = store.add_order("b", "c", now, None, Vec::new());

        let claimed = store.claim_next("worker-1", now).unwrap();
        assert_eq!(claimed.id, first.id);

        let claimed = store.claim_next("worker-1", now).unwrap();
        assert_eq!(claimed.id, second.id);
    }

    #[test]
    fn test_claim_stamps_lease_fields() {
        let store = OrderStore::new();
        let now = base_time();
        store.add_order("a", "c", now, None, Vec::new());

        let claimed = store.claim_next("worker-7", now).unwrap();

        assert_eq!(claimed.status, OrderStatus::Processing);
        assert_eq!(claimed.date_processing, Some(now));
        assert_eq!(claimed.processed_by, Some("worker-7".to_string()));
        assert_eq!(claimed.date_processed, None);
    }

    #[test]
    fn test_claim_empty_store_returns_none() {
        let store = OrderStore::new();
        assert!(store.claim_next("worker-1", base_time()).is_none());
    }

    #[test]
    fn test_claim_skips_non_queued_orders() {
        let store = OrderStore::new();
        let now = base_time();
        let order = store.add_order("a", "c", now, None, Vec::new());

        store.claim_next("worker-1", now).unwrap();

        // The only order is Processing now; nothing left to claim
        assert!(store.claim_next("worker-2", now).is_none());
        assert_eq!(
            store.get(order.id).unwrap().processed_by,
            Some("worker-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_concurrent_claims_are_mutually_exclusive() {
        // ARRANGE: 4 queued orders, 8 racing claimers
        let store = Arc::new(OrderStore::new());
        let now = base_time();
        seed(&store, 4, now);

        // ACT: all claimers race against the same store
        let mut handles = Vec::new();
        for worker in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.claim_next(&format!("worker-{}", worker), now)
            }));
        }

        let mut claimed_ids = Vec::new();
        for handle in handles {
            if let Some(order) = handle.await.unwrap() {
                claimed_ids.push(order.id);
            }
        }

        // ASSERT: each order went to exactly one claimer
        assert_eq!(claimed_ids.len(), 4, "every queued order claimed once");
        let unique: HashSet<OrderId> = claimed_ids.iter().copied().collect();
        assert_eq!(unique.len(), 4, "no order claimed twice");
    }

    // ============================================================
    // RECLAIM SWEEP
    // ============================================================

    #[test]
    fn test_reclaim_moves_only_expired_leases() {
        let store = OrderStore::new();
        let now = base_time();
        let stale = store.add_order("stale", "c", now, None, Vec::new());
        let fresh = store.add_order("fresh", "c", now, None, Vec::new());

        store.claim_next("worker-1", now).unwrap();
        store.claim_next("worker-2", now + Duration::minutes(14)).unwrap();

        let sweep_time = now + Duration::minutes(16);
        let reclaimed = store.reclaim_stuck(Duration::minutes(15), sweep_time);

        assert_eq!(reclaimed, 1);
        let stale = store.get(stale.id).unwrap();
        assert_eq!(stale.status, OrderStatus::Queued);
        assert_eq!(stale.failed_count, 1);
        let fresh = store.get(fresh.id).unwrap();
        assert_eq!(fresh.status, OrderStatus::Processing);
        assert_eq!(fresh.failed_count, 0);
    }

    #[test]
    fn test_reclaim_is_idempotent_after_full_sweep() {
        let store = OrderStore::new();
        let now = base_time();
        store.add_order("a", "c", now, None, Vec::new());
        store.claim_next("worker-1", now).unwrap();

        let sweep_time = now + Duration::minutes(20);
        assert_eq!(store.reclaim_stuck(Duration::minutes(15), sweep_time), 1);
        // Immediately re-running reclaims nothing further
        assert_eq!(store.reclaim_stuck(Duration::minutes(15), sweep_time), 0);
    }

    #[test]
    fn test_reclaimed_order_is_claimable_again() {
        let store = OrderStore::new();
        let now = base_time();
        let order = store.add_order("a", "c", now, None, Vec::new());

        store.claim_next("worker-1", now).unwrap();
        let later = now + Duration::minutes(16);
        store.reclaim_stuck(Duration::minutes(15), later);

        let reclaimed = store.claim_next("worker-2", later).unwrap();
        assert_eq!(reclaimed.id, order.id);
        // The lease start is overwritten on re-claim
        assert_eq!(reclaimed.date_processing, Some(later));
        assert_eq!(reclaimed.processed_by, Some("worker-2".to_string()));
    }

    // ============================================================
    // RETRY EXHAUSTION
    // ============================================================

    #[test]
    fn test_fail_exhausted_only_touches_queued_over_threshold() {
        let store = OrderStore::new();
        let now = base_time();

        // Processing order, untouched by the exhaustion sweep
        let processing = store.add_order("processing", "c", now, None, Vec::new());
        store.claim_next("worker-1", now).unwrap();

        // Queued order driven over the threshold through retries
        let exhausted =
            store.add_order("exhausted", "c", now + Duration::minutes(1), None, Vec::new());
        for _ in 0..3 {
            store.claim_next("worker-1", now).unwrap();
            store.mark_for_retry(exhausted.id).unwrap();
        }

        // Queued order under the threshold
        let healthy =
            store.add_order("healthy", "c", now + Duration::minutes(2), None, Vec::new());

        // Completed order, untouched
        let complete = store.add_order("done", "c", now, Some(now), Vec::new());

        let failed = store.fail_exhausted(2);

        assert_eq!(failed, 1);
        assert_eq!(store.get(exhausted.id).unwrap().status, OrderStatus::Failed);
        assert_eq!(store.get(healthy.id).unwrap().status, OrderStatus::Queued);
        assert_eq!(
            store.get(processing.id).unwrap().status,
            OrderStatus::Processing
        );
        assert_eq!(store.get(complete.id).unwrap().status, OrderStatus::Complete);
    }

    // ============================================================
    // RETRY AND COMPLETION
    // ============================================================

    #[test]
    fn test_mark_for_retry_requeues_and_increments() {
        let store = OrderStore::new();
        let now = base_time();
        let order = store.add_order("a", "c", now, None, Vec::new());
        store.claim_next("worker-1", now).unwrap();

        store.mark_for_retry(order.id).unwrap();

        let order = store.get(order.id).unwrap();
        assert_eq!(order.status, OrderStatus::Queued);
        assert_eq!(order.failed_count, 1);
    }

    #[test]
    fn test_mark_for_retry_rejects_unclaimed_order() {
        let store = OrderStore::new();
        let order = store.add_order("a", "c", base_time(), None, Vec::new());

        assert!(store.mark_for_retry(order.id).is_err());
    }

    #[test]
    fn test_complete_stamps_score_and_processed_date() {
        let store = OrderStore::new();
        let now = base_time();
        let order = store.add_order("a", "c", now, None, Vec::new());
        store.claim_next("worker-1", now).unwrap();

        let finished = now + Duration::seconds(30);
        let completed = store.complete(order.id, 12.5, finished).unwrap();

        assert_eq!(completed.status, OrderStatus::Complete);
        assert_eq!(completed.edginess, Some(12.5));
        assert_eq!(completed.date_processed, Some(finished));
    }

    #[test]
    fn test_complete_rejects_unclaimed_order() {
        let store = OrderStore::new();
        let order = store.add_order("a", "c", base_time(), None, Vec::new());

        assert!(store.complete(order.id, 1.0, base_time()).is_err());
    }

    // ============================================================
    // FULL LIFECYCLE SCENARIO
    // ============================================================

    #[test]
    fn test_lifecycle_claim_timeout_retries_exhaustion() {
        let store = OrderStore::new();
        let mut now = base_time();

        // Submit: order starts Queued
        let order = store.add_order("A", "B", now, None, Vec::new());
        assert_eq!(order.status, OrderStatus::Queued);

        // Claim: Processing with a live lease
        let claimed = store.claim_next("worker-1", now).unwrap();
        assert_eq!(claimed.status, OrderStatus::Processing);
        assert!(claimed.date_processing.is_some());

        // 16 minutes later the 15 minute lease has lapsed
        now = now + Duration::minutes(16);
        assert_eq!(store.reclaim_stuck(Duration::minutes(15), now), 1);
        let reclaimed = store.get(order.id).unwrap();
        assert_eq!(reclaimed.status, OrderStatus::Queued);
        assert_eq!(reclaimed.failed_count, 1);

        // Two more claim + failure rounds
        for expected in 2..=3 {
            store.claim_next("worker-1", now).unwrap();
            store.mark_for_retry(order.id).unwrap();
            assert_eq!(store.get(order.id).unwrap().failed_count, expected);
        }

        // Over the threshold of 2: terminally Failed, never claimed again
        assert_eq!(store.fail_exhausted(2), 1);
        assert_eq!(store.get(order.id).unwrap().status, OrderStatus::Failed);
        assert!(store.claim_next("worker-1", now).is_none());
    }

    // ============================================================
    // READ SURFACE
    // ============================================================

    #[test]
    fn test_counts_and_display_window() {
        let store = OrderStore::new();
        let now = base_time();

        // Queued now
        store.add_order("q", "c", now, None, Vec::new());
        // Completed recently
        store.add_order("recent", "c", now - Duration::minutes(30), Some(now), Vec::new());
        // Completed long ago, outside the window
        store.add_order(
            "old",
            "c",
            now - Duration::hours(2),
            Some(now - Duration::hours(1)),
            Vec::new(),
        );

        assert_eq!(store.count_orders(), 3);
        assert_eq!(store.queued_count(), 1);
        assert_eq!(store.recently_placed_count(now), 1);
        assert_eq!(store.recently_processed_count(now), 1);

        let display = store.orders_to_display(now);
        // The stale completed order is filtered out
        assert_eq!(display.len(), 2);
        // Oldest placement first
        assert_eq!(display[0].product, "recent");
        assert_eq!(display[1].product, "q");
    }

    #[test]
    fn test_display_limit_is_bounded() {
        let store = OrderStore::new();
        let now = base_time();
        seed(&store, 30, now);

        assert_eq!(store.orders_to_display(now).len(), 20);
    }

    #[test]
    fn test_clear_orders_reports_rows_removed() {
        let store = OrderStore::new();
        seed(&store, 5, base_time());

        assert_eq!(store.clear_orders(), 5);
        assert_eq!(store.count_orders(), 0);
    }
}
