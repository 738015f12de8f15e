#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Photographer-side state of a single product inside a shooting request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum PhotoStatus {
    /// Waiting for a photographer to pick the product up.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Pending"))]
    Pending,
    /// Shooting session in progress.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "InShooting"))]
    InShooting,
    /// Source photos are in the photo folder.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Done"))]
    Done,
    /// Photographer flagged the product as unshootable.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Defect"))]
    Defect,
}

impl PhotoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InShooting => "InShooting",
            Self::Done => "Done",
            Self::Defect => "Defect",
        }
    }
}

impl fmt::Display for PhotoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for PhotoStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Senior photographer's check verdict on a shot product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum SeniorPhotoStatus {
    /// Not yet reviewed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Pending"))]
    Pending,
    /// Shots accepted for retouch.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Accepted"))]
    Accepted,
    /// Sent back for a reshoot.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Rejected"))]
    Rejected,
}

impl SeniorPhotoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for SeniorPhotoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SeniorPhotoStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Lifecycle state of a shooting request (a batch work order for photography).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum ShootingRequestStatus {
    /// Being assembled by a stockman.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Draft"))]
    Draft,
    /// At least one product is being shot.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "InShooting"))]
    InShooting,
    /// Shooting finished, awaiting senior photo check.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PendingCheck"))]
    PendingCheck,
    /// Every member passed the photo and senior-check conditions.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Checked"))]
    Checked,
}

impl ShootingRequestStatus {
    /// A product's membership satisfies the check condition once the
    /// photographer is done and the senior accepted the shots.
    pub fn member_checked(photo: PhotoStatus, senior: SeniorPhotoStatus) -> bool {
        photo == PhotoStatus::Done && senior == SeniorPhotoStatus::Accepted
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::InShooting => "InShooting",
            Self::PendingCheck => "PendingCheck",
            Self::Checked => "Checked",
        }
    }
}

impl fmt::Display for ShootingRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ShootingRequestStatus {
    fn default() -> Self {
        Self::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_checked_requires_both_sides() {
        assert!(ShootingRequestStatus::member_checked(
            PhotoStatus::Done,
            SeniorPhotoStatus::Accepted
        ));
        assert!(!ShootingRequestStatus::member_checked(
            PhotoStatus::Done,
            SeniorPhotoStatus::Pending
        ));
        assert!(!ShootingRequestStatus::member_checked(
            PhotoStatus::InShooting,
            SeniorPhotoStatus::Accepted
        ));
    }
}
