use serde::{Deserialize, Serialize};

use crate::entity::{customer_order, order_product};
use crate::error::AppError;
use crate::models::shared::validate_barcode;

/// Request body for creating an inbound order.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateOrderRequest {
    /// Barcodes expected in this delivery.
    #[schema(example = json!(["4607012345678", "4607012345679"]))]
    pub barcodes: Vec<String>,
}

pub fn validate_create_order_request(payload: &CreateOrderRequest) -> Result<(), AppError> {
    if payload.barcodes.is_empty() {
        return Err(AppError::Validation("Barcodes must not be empty".into()));
    }
    if payload.barcodes.len() > 1000 {
        return Err(AppError::Validation(
            "Too many barcodes: max 1000 per order".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for barcode in &payload.barcodes {
        validate_barcode(barcode)?;
        if !seen.insert(barcode.trim()) {
            return Err(AppError::Validation(format!(
                "Duplicate barcode {barcode} in order"
            )));
        }
    }
    Ok(())
}

/// One line item of an order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OrderProductResponse {
    pub barcode: String,
    pub accepted: bool,
    pub accepted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub accepted_by: Option<i32>,
}

impl From<order_product::Model> for OrderProductResponse {
    fn from(line: order_product::Model) -> Self {
        Self {
            barcode: line.barcode,
            accepted: line.accepted,
            accepted_at: line.accepted_at,
            accepted_by: line.accepted_by,
        }
    }
}

/// Order representation returned by all order endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    /// Sequential human-facing order number.
    #[schema(example = 105)]
    pub order_number: i32,
    #[schema(example = "Assembly")]
    pub status: String,
    pub creator_id: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub assembly_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub accept_finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub products: Vec<OrderProductResponse>,
}

impl OrderResponse {
    pub fn from_parts(order: customer_order::Model, lines: Vec<order_product::Model>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            status: order.status.as_str().to_string(),
            creator_id: order.creator_id,
            created_at: order.created_at,
            assembly_started_at: order.assembly_started_at,
            accept_finished_at: order.accept_finished_at,
            products: lines.into_iter().map(Into::into).collect(),
        }
    }
}
