//! HTTP handlers for order submission, listing, and administration.

use super::protocol::{
    CountResponse, ListOrdersResponse, NewOrderRequest, NewOrderResponse, OrderSummary,
    ResetResponse,
};
use crate::store::orders::OrderStore;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

/// Creates a Queued order with its download payload attached.
pub async fn handle_new_order(
    Extension(store): Extension<Arc<OrderStore>>,
    Json(request): Json<NewOrderRequest>,
) -> (StatusCode, Json<NewOrderResponse>) {
    let date_placed = request.date_placed.unwrap_or_else(Utc::now);
    let download = create_product_download(&request.product);

    let order = store.add_order(
        &request.product,
        &request.customer,
        date_placed,
        request.date_processed,
        download,
    );

    tracing::info!("Added order {} ({})", order.id, order.product);

    (
        StatusCode::CREATED,
        Json(NewOrderResponse {
            id: order.id,
            status: order.status,
        }),
    )
}

/// The dashboard read: a bounded recent window of orders plus the counts.
pub async fn handle_list_orders(
    Extension(store): Extension<Arc<OrderStore>>,
) -> Json<ListOrdersResponse> {
    let now = Utc::now();
    let orders = store
        .orders_to_display(now)
        .into_iter()
        .map(OrderSummary::from)
        .collect();

    Json(ListOrdersResponse {
        orders,
        queue_count: store.queued_count(),
        recently_placed_count: store.recently_placed_count(now),
        recently_processed_count: store.recently_processed_count(now),
        total_count: store.count_orders(),
    })
}

pub async fn handle_count_orders(
    Extension(store): Extension<Arc<OrderStore>>,
) -> Json<CountResponse> {
    Json(CountResponse {
        count: store.count_orders(),
    })
}

/// Administrative bulk clear.
pub async fn handle_reset_orders(
    Extension(store): Extension<Arc<OrderStore>>,
) -> Json<ResetResponse> {
    let deleted = store.clear_orders();
    tracing::warn!("Deleted {} orders", deleted);
    Json(ResetResponse { deleted })
}

/// Builds the opaque download payload attached to an order at creation.
fn create_product_download(product: &str) -> Vec<u8> {
    serde_json::json!({
        "product": product,
        "generated_at": Utc::now().to_rfc3339(),
    })
    .to_string()
    .into_bytes()
}
