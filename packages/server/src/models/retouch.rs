use common::{RetouchRequestStatus, RetouchStatus, SeniorRetouchStatus};
use serde::{Deserialize, Serialize};

use crate::entity::{retouch_request, retouch_request_product};
use crate::error::AppError;
use crate::models::shared::validate_bulk_ids;

/// Request body for creating a retouch request (batch assignment).
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRetouchRequest {
    /// Shooting-request product ids to assign. All must be off-retouch.
    #[schema(example = json!([101, 102, 103]))]
    pub st_request_product_ids: Vec<i32>,
    /// Retoucher receiving the batch.
    #[schema(example = 7)]
    pub retoucher_id: i32,
}

pub fn validate_create_retouch_request(payload: &CreateRetouchRequest) -> Result<(), AppError> {
    validate_bulk_ids(&payload.st_request_product_ids, "product", 500)
}

/// Retoucher-side update of one product's result.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateResultRequest {
    /// Retouch-request product id.
    pub retouch_request_product_id: i32,
    /// 1 = in work, 2 = ready for review, 3 = no retouch needed.
    #[schema(example = 2)]
    pub retouch_status: i32,
    /// Link to the retouched output; required for ready-for-review.
    pub retouch_link: Option<String>,
}

pub fn parse_retouch_status(id: i32) -> Result<RetouchStatus, AppError> {
    RetouchStatus::from_id(id)
        .ok_or_else(|| AppError::Validation(format!("Unknown retouch status id: {id}")))
}

pub fn parse_senior_retouch_status(id: i32) -> Result<SeniorRetouchStatus, AppError> {
    SeniorRetouchStatus::from_id(id)
        .ok_or_else(|| AppError::Validation(format!("Unknown senior retouch status id: {id}")))
}

/// Senior verdict on one product.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReviewRequest {
    /// 1 = verified, 2 = rejected.
    #[schema(example = 1)]
    pub senior_retouch_status: i32,
    /// Reviewer comment, kept on rejection for the retoucher.
    pub comment: Option<String>,
}

/// Request body for reassigning a whole request to another retoucher.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReassignRequest {
    #[schema(example = 9)]
    pub retoucher_id: i32,
}

/// One member product of a retouch request.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RetouchProductResponse {
    pub id: i32,
    /// Source shooting-request product id.
    pub st_product_id: i32,
    pub barcode: String,
    /// 1 = in work, 2 = ready for review, 3 = no retouch needed.
    pub retouch_status: i32,
    /// 1 = verified, 2 = rejected, null while unreviewed.
    pub senior_retouch_status: Option<i32>,
    pub retouch_link: Option<String>,
    pub comment: Option<String>,
    pub checked_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl RetouchProductResponse {
    pub fn from_parts(line: retouch_request_product::Model, barcode: String) -> Self {
        Self {
            id: line.id,
            st_product_id: line.st_product_id,
            barcode,
            retouch_status: line.retouch_status.as_id(),
            senior_retouch_status: line.senior_retouch_status.map(|s| s.as_id()),
            retouch_link: line.retouch_link,
            comment: line.comment,
            checked_at: line.checked_at,
        }
    }
}

/// Retouch request representation.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RetouchRequestResponse {
    pub id: i32,
    #[schema(example = 87)]
    pub request_number: i32,
    /// 2 = in progress, 3 = on review, 4 = rework, 5 = completed.
    #[schema(example = 2)]
    pub status: i32,
    pub retoucher_id: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub products: Vec<RetouchProductResponse>,
}

impl RetouchRequestResponse {
    pub fn from_parts(
        request: retouch_request::Model,
        products: Vec<RetouchProductResponse>,
    ) -> Self {
        Self {
            id: request.id,
            request_number: request.request_number,
            status: request.status.as_id(),
            retoucher_id: request.retoucher_id,
            created_at: request.created_at,
            completed_at: request.completed_at,
            products,
        }
    }
}

pub fn parse_request_status(id: i32) -> Result<RetouchRequestStatus, AppError> {
    RetouchRequestStatus::from_id(id)
        .ok_or_else(|| AppError::Validation(format!("Unknown request status id: {id}")))
}

/// Query parameters for listing retouch requests.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct RetouchListQuery {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page (max 100).
    pub per_page: Option<u64>,
    /// Filter by status id.
    pub status: Option<i32>,
}

/// Paginated retouch request list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RetouchListResponse {
    pub requests: Vec<RetouchRequestResponse>,
    pub pagination: crate::models::shared::Pagination,
}

/// Archive download-state response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DownloadResponse {
    /// `ready` or `in_progress`.
    #[schema(example = "ready")]
    pub status: &'static str,
    /// Path of the finished archive, present when ready.
    pub archive_path: Option<String>,
}
