use serde::{Deserialize, Serialize};

use crate::entity::{shooting_request, shooting_request_product};
use crate::error::AppError;

/// Request body for creating a shooting request. Products are attached
/// afterwards, barcode by barcode.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateShootingRequest {
    /// Optional initial set of barcodes.
    #[serde(default)]
    pub barcodes: Vec<String>,
}

/// Manual request-type override; locks automatic recomputation.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TypeOverrideRequest {
    /// Shooting type to pin the request to.
    #[schema(example = 2)]
    pub request_type: i32,
}

/// Request body for finishing a shooting session on one product.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ShootingResultRequest {
    /// `Done` or `Defect`.
    #[schema(example = "Done")]
    pub photo_status: String,
    /// Remote folder the shots were uploaded to; required for `Done`.
    pub photo_folder: Option<String>,
}

/// Parse and validate a shooting result into the final photo status and
/// the trimmed folder reference.
pub fn parse_shooting_result(
    payload: &ShootingResultRequest,
) -> Result<(common::PhotoStatus, Option<String>), AppError> {
    let folder = payload
        .photo_folder
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string);

    match payload.photo_status.as_str() {
        "Done" => {
            if folder.is_none() {
                return Err(AppError::Validation(
                    "Finishing as Done requires a photo folder".into(),
                ));
            }
            Ok((common::PhotoStatus::Done, folder))
        }
        "Defect" => Ok((common::PhotoStatus::Defect, folder)),
        other => Err(AppError::Validation(format!(
            "Photo status must be Done or Defect, got {other}"
        ))),
    }
}

/// Senior photo verdict on one shot product.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct PhotoCheckRequest {
    /// Accept or reject the shots.
    pub accepted: bool,
}

/// One member product of a shooting request.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ShootingProductResponse {
    pub id: i32,
    pub barcode: String,
    #[schema(example = "Done")]
    pub photo_status: String,
    #[schema(example = "Accepted")]
    pub senior_photo_status: String,
    pub shooting_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub shooting_ended_at: Option<chrono::DateTime<chrono::Utc>>,
    pub photo_folder: Option<String>,
    pub on_retouch: bool,
}

impl From<shooting_request_product::Model> for ShootingProductResponse {
    fn from(p: shooting_request_product::Model) -> Self {
        Self {
            id: p.id,
            barcode: p.barcode,
            photo_status: p.photo_status.as_str().to_string(),
            senior_photo_status: p.senior_photo_status.as_str().to_string(),
            shooting_started_at: p.shooting_started_at,
            shooting_ended_at: p.shooting_ended_at,
            photo_folder: p.photo_folder,
            on_retouch: p.on_retouch,
        }
    }
}

/// Shooting request representation.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ShootingRequestResponse {
    pub id: i32,
    #[schema(example = 311)]
    pub request_number: i32,
    #[schema(example = "InShooting")]
    pub status: String,
    pub request_type: Option<i32>,
    pub type_locked: bool,
    pub photographer_id: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub photo_at: Option<chrono::DateTime<chrono::Utc>>,
    pub checked_at: Option<chrono::DateTime<chrono::Utc>>,
    pub products: Vec<ShootingProductResponse>,
}

impl ShootingRequestResponse {
    pub fn from_parts(
        request: shooting_request::Model,
        products: Vec<shooting_request_product::Model>,
    ) -> Self {
        Self {
            id: request.id,
            request_number: request.request_number,
            status: request.status.as_str().to_string(),
            request_type: request.request_type,
            type_locked: request.type_locked,
            photographer_id: request.photographer_id,
            created_at: request.created_at,
            photo_at: request.photo_at,
            checked_at: request.checked_at,
            products: products.into_iter().map(Into::into).collect(),
        }
    }
}

/// Query parameters for listing shooting requests.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ShootingListQuery {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page (max 100).
    pub per_page: Option<u64>,
    /// Filter by status name (e.g. `PendingCheck`).
    pub status: Option<String>,
}

/// Paginated shooting request list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ShootingListResponse {
    pub requests: Vec<ShootingRequestResponse>,
    pub pagination: crate::models::shared::Pagination,
}

/// Parse a shooting request status name from a query string.
pub fn parse_request_status(name: &str) -> Result<common::ShootingRequestStatus, AppError> {
    use common::ShootingRequestStatus as S;
    match name {
        "Draft" => Ok(S::Draft),
        "InShooting" => Ok(S::InShooting),
        "PendingCheck" => Ok(S::PendingCheck),
        "Checked" => Ok(S::Checked),
        other => Err(AppError::Validation(format!(
            "Unknown shooting request status: {other}"
        ))),
    }
}
