use axum::{
    routing::{get, post},
    Extension, Router,
};
use edgemill::api::handlers::{
    handle_count_orders, handle_list_orders, handle_new_order, handle_reset_orders,
};
use edgemill::config::Config;
use edgemill::detect::canny::CannyEdgeDetector;
use edgemill::detect::pipeline::EdgePipeline;
use edgemill::imaging::{FsImageSink, HttpImageSource};
use edgemill::scheduler::scheduler::{OrderScheduler, SchedulerSettings};
use edgemill::store::orders::OrderStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting instance {}", config.instance_id);

    // 1. Shared order store:
    let store = Arc::new(OrderStore::new());

    // 2. Image adapters and the detection pipeline:
    let source = Arc::new(HttpImageSource::new(&config.image_base_url));
    let sink = Arc::new(FsImageSink::new(config.image_output_dir.clone()));
    let detector = CannyEdgeDetector {
        kernel_size: config.gaussian_kernel_size,
        sigma: config.gaussian_sigma,
        low_ratio: config.low_threshold_ratio,
        high_ratio: config.high_threshold_ratio,
        ..CannyEdgeDetector::default()
    };
    let pipeline = Arc::new(EdgePipeline::new(detector, config.target_pixels));

    // 3. Scheduler loop:
    let scheduler = OrderScheduler::new(
        store.clone(),
        source,
        sink,
        pipeline,
        SchedulerSettings {
            interval: config.job_interval,
            max_in_flight: config.max_in_flight,
            lock_timeout: chrono::Duration::minutes(config.lock_timeout_minutes),
            max_retries: config.max_retries,
            enabled: config.job_enabled,
            worker_id: config.instance_id.clone(),
        },
    );
    scheduler.start();

    // 4. HTTP router:
    let app = Router::new()
        .route("/orders", post(handle_new_order).get(handle_list_orders))
        .route("/orders/count", get(handle_count_orders))
        .route("/orders/reset", post(handle_reset_orders))
        .layer(Extension(store));

    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
