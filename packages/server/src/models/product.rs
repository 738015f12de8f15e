use common::MoveStatus;
use serde::{Deserialize, Serialize};

use crate::entity::{product, product_operation};
use crate::error::AppError;
use crate::models::shared::{Pagination, validate_barcode};

/// One product row in an intake batch.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct IntakeItem {
    /// Seller-assigned barcode, globally unique.
    #[schema(example = "4607012345678")]
    pub barcode: String,
    /// Product name.
    #[schema(example = "Ceramic mug 350ml")]
    pub name: String,
    /// Category id, optional.
    pub category_id: Option<i32>,
    /// Seller name, optional.
    pub seller: Option<String>,
    /// Free-form notes.
    pub info: Option<String>,
}

/// Request body for product intake.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct IntakeRequest {
    pub products: Vec<IntakeItem>,
}

pub fn validate_intake_request(payload: &IntakeRequest) -> Result<(), AppError> {
    if payload.products.is_empty() {
        return Err(AppError::Validation("Products must not be empty".into()));
    }
    if payload.products.len() > 1000 {
        return Err(AppError::Validation(
            "Too many products: max 1000 per intake".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for item in &payload.products {
        validate_barcode(&item.barcode)?;
        if !seen.insert(item.barcode.trim()) {
            return Err(AppError::Validation(format!(
                "Duplicate barcode {} in intake list",
                item.barcode
            )));
        }
        let name = item.name.trim();
        if name.is_empty() || name.chars().count() > 256 {
            return Err(AppError::Validation(
                "Product name must be 1-256 characters".into(),
            ));
        }
    }
    Ok(())
}

/// Intake summary response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct IntakeResponse {
    /// Number of newly created products.
    #[schema(example = 12)]
    pub created: u64,
    /// Barcodes skipped because they already exist.
    pub skipped: Vec<String>,
}

/// Query parameters for the public product listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct CurrentProductsQuery {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page (max 100).
    pub per_page: Option<u64>,
    /// Substring match on barcode or name.
    pub search: Option<String>,
    /// Filter by move status.
    pub move_status: Option<String>,
}

/// Request body for marking a product defective.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct DefectRequest {
    /// What is wrong with the product.
    pub comment: Option<String>,
}

/// Product representation returned by list and detail endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub barcode: String,
    pub name: String,
    pub seller: Option<String>,
    pub category_id: Option<i32>,
    /// Physical-location/workflow state.
    #[schema(example = "OnShelf")]
    pub move_status: String,
    pub priority: bool,
    pub blocked_for_render: bool,
    pub info: Option<String>,
    pub income_at: Option<chrono::DateTime<chrono::Utc>>,
    pub outcome_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<product::Model> for ProductResponse {
    fn from(p: product::Model) -> Self {
        Self {
            barcode: p.barcode,
            name: p.name,
            seller: p.seller,
            category_id: p.category_id,
            move_status: p.move_status.as_str().to_string(),
            priority: p.priority,
            blocked_for_render: p.blocked_for_render,
            info: p.info,
            income_at: p.income_at,
            outcome_at: p.outcome_at,
        }
    }
}

/// Paginated product list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub pagination: Pagination,
}

/// One audit-log entry for a product.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OperationResponse {
    pub id: i32,
    /// Operation kind, e.g. `DefectMarked`.
    #[schema(example = "DefectMarked")]
    pub operation_type: String,
    pub user_id: Option<i32>,
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<product_operation::Model> for OperationResponse {
    fn from(op: product_operation::Model) -> Self {
        Self {
            id: op.id,
            operation_type: op.operation_type.as_str().to_string(),
            user_id: op.user_id,
            comment: op.comment,
            created_at: op.created_at,
        }
    }
}

/// Parse an optional `move_status` query value.
pub fn parse_move_status(raw: &str) -> Result<MoveStatus, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Unknown move status: {raw}")))
}
