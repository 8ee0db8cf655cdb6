//! Data Transfer Objects for the HTTP surface.

use crate::store::types::{Order, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub product: String,
    pub customer: String,
    /// Defaults to the submission time when omitted.
    pub date_placed: Option<DateTime<Utc>>,
    /// Supplied only when seeding already-processed historical orders.
    pub date_processed: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewOrderResponse {
    pub id: OrderId,
    pub status: OrderStatus,
}

/// One order as shown on the dashboard. The download payload stays server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub product: String,
    pub customer: String,
    pub status: OrderStatus,
    pub date_placed: DateTime<Utc>,
    pub date_processed: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub edginess: Option<f64>,
    pub failed_count: u32,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            product: order.product,
            customer: order.customer,
            status: order.status,
            date_placed: order.date_placed,
            date_processed: order.date_processed,
            processed_by: order.processed_by,
            edginess: order.edginess,
            failed_count: order.failed_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderSummary>,
    pub queue_count: usize,
    pub recently_placed_count: usize,
    pub recently_processed_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub deleted: usize,
}
