//! The scheduler loop and the order processing cycle.
//!
//! Multiple instances of this loop may run against one shared store; the
//! store's atomic transitions are the only coordination between them. A
//! processing failure never escapes a tick: it is converted into a requeue
//! with an incremented retry count, and the loop carries on.

use crate::detect::pipeline::EdgePipeline;
use crate::imaging::{image_id, ImageSink, ImageSource};
use crate::scheduler::timing::{time_it, time_it_sync};
use crate::store::orders::OrderStore;
use crate::store::types::Order;

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Tunables for one scheduler instance.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Time between ticks.
    pub interval: Duration,
    /// Maximum ticks concurrently in flight for this instance. A saturated
    /// bound skips the tick; it never queues.
    pub max_in_flight: usize,
    /// Age at which a Processing lease is considered abandoned.
    pub lock_timeout: chrono::Duration,
    /// Retry budget before an order is terminally failed.
    pub max_retries: u32,
    /// When false the loop never starts.
    pub enabled: bool,
    /// Identity stamped on claims made by this instance.
    pub worker_id: String,
}

/// Periodic driver: sweep, then claim and process at most one order per tick.
pub struct OrderScheduler {
    store: Arc<OrderStore>,
    source: Arc<dyn ImageSource>,
    sink: Arc<dyn ImageSink>,
    pipeline: Arc<EdgePipeline>,
    settings: SchedulerSettings,
    in_flight: Arc<Semaphore>,
}

impl OrderScheduler {
    pub fn new(
        store: Arc<OrderStore>,
        source: Arc<dyn ImageSource>,
        sink: Arc<dyn ImageSink>,
        pipeline: Arc<EdgePipeline>,
        settings: SchedulerSettings,
    ) -> Arc<Self> {
        let in_flight = Arc::new(Semaphore::new(settings.max_in_flight));
        Arc::new(Self {
            store,
            source,
            sink,
            pipeline,
            settings,
            in_flight,
        })
    }

    /// Starts the interval loop in the background and returns immediately.
    /// When the instance is disabled this logs and spawns nothing.
    pub fn start(self: &Arc<Self>) {
        if !self.settings.enabled {
            tracing::warn!("Scheduled job disabled");
            return;
        }

        tracing::info!(
            "Starting scheduler (worker {}, every {:?}, max {} in flight)",
            self.settings.worker_id,
            self.settings.interval,
            self.settings.max_in_flight
        );

        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.settings.interval);
            loop {
                interval.tick().await;

                // Bound concurrently running ticks for this instance
                let permit = match scheduler.in_flight.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!("All tick slots busy, skipping this interval");
                        continue;
                    }
                };

                let scheduler = scheduler.clone();
                tokio::spawn(async move {
                    scheduler.run_tick().await;
                    drop(permit);
                });
            }
        });
    }

    /// One full tick: reclaim expired leases, fail exhausted orders, then
    /// claim and process at most one order. Processing errors are caught here
    /// and turned into a requeue; they never propagate out.
    pub async fn run_tick(&self) {
        let now = Utc::now();

        let reclaimed = self
            .store
            .reclaim_stuck(self.settings.lock_timeout, now);
        if reclaimed > 0 {
            tracing::info!("Requeued {} stuck orders", reclaimed);
        }

        let exhausted = self.store.fail_exhausted(self.settings.max_retries);
        if exhausted > 0 {
            tracing::warn!("Marked {} orders as permanently failed", exhausted);
        }

        let order = match self.store.claim_next(&self.settings.worker_id, now) {
            Some(order) => order,
            None => {
                tracing::debug!("No orders to process");
                return;
            }
        };

        tracing::info!("Processing order {}", order.id);
        match self.process_order(&order).await {
            Ok(edginess) => {
                tracing::info!(
                    "Successfully processed order {} (edginess {:.2})",
                    order.id,
                    edginess
                );
            }
            Err(e) => {
                tracing::error!("Failed to process order {}: {:#}", order.id, e);
                if let Err(e) = self.store.mark_for_retry(order.id) {
                    tracing::error!("Failed to requeue order {}: {}", order.id, e);
                }
            }
        }
    }

    /// The processing cycle for one claimed order: fetch the source image,
    /// run the edge pipeline on a blocking thread, persist the rendered map,
    /// and complete the order with its score.
    async fn process_order(&self, order: &Order) -> Result<f64> {
        let image_id = image_id(order.id);

        let bytes = time_it("load_img", self.source.fetch(image_id)).await?;

        let pipeline = self.pipeline.clone();
        let processed = tokio::task::spawn_blocking(move || {
            time_it_sync("process_image", || pipeline.process(&bytes))
        })
        .await??;

        time_it("save_image", self.sink.persist(image_id, &processed.png)).await?;

        self.store
            .complete(order.id, processed.edginess, Utc::now())?;

        Ok(processed.edginess)
    }
}
