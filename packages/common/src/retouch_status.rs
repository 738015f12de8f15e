use serde::{Deserialize, Serialize};
use std::fmt;

/// Retoucher-side state of a single product inside a retouch request.
///
/// Numeric values are part of the public API (clients send them as ids).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "i32", db_type = "Integer")
)]
#[repr(i32)]
pub enum RetouchStatus {
    /// Being worked on.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 1))]
    InWork = 1,
    /// Retouched result uploaded, ready for senior review. Requires a link.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 2))]
    ReadyForReview = 2,
    /// Source shots are good enough as-is, no retouch performed.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 3))]
    NoRetouchNeeded = 3,
}

impl RetouchStatus {
    /// Statuses that submit the product for senior review and therefore
    /// require a non-empty result link.
    pub fn requires_link(&self) -> bool {
        matches!(self, Self::ReadyForReview)
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::InWork),
            2 => Some(Self::ReadyForReview),
            3 => Some(Self::NoRetouchNeeded),
            _ => None,
        }
    }

    pub fn as_id(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for RetouchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InWork => "InWork",
            Self::ReadyForReview => "ReadyForReview",
            Self::NoRetouchNeeded => "NoRetouchNeeded",
        };
        f.write_str(s)
    }
}

impl Default for RetouchStatus {
    fn default() -> Self {
        Self::InWork
    }
}

/// Senior retoucher's verification verdict on a retouched product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "i32", db_type = "Integer")
)]
#[repr(i32)]
pub enum SeniorRetouchStatus {
    /// Terminal approval: the product is done.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 1))]
    Verified = 1,
    /// Sent back to the retoucher.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 2))]
    Rejected = 2,
}

impl SeniorRetouchStatus {
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::Verified),
            2 => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_id(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for SeniorRetouchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Verified => "Verified",
            Self::Rejected => "Rejected",
        })
    }
}

/// Lifecycle state of a retouch request (a batch assigned to one retoucher).
///
/// Ids 4 and 5 are accepted on the close endpoint; the rest are internal
/// transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "i32", db_type = "Integer")
)]
#[repr(i32)]
pub enum RetouchRequestStatus {
    /// Assigned, retoucher is working.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 2))]
    InProgress = 2,
    /// Submitted for senior review.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 3))]
    OnReview = 3,
    /// Senior sent the batch back for rework.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 4))]
    Rework = 4,
    /// Every member verified; the batch is closed.
    #[cfg_attr(feature = "sea-orm", sea_orm(num_value = 5))]
    Completed = 5,
}

impl RetouchRequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            2 => Some(Self::InProgress),
            3 => Some(Self::OnReview),
            4 => Some(Self::Rework),
            5 => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_id(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for RetouchRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InProgress => "InProgress",
            Self::OnReview => "OnReview",
            Self::Rework => "Rework",
            Self::Completed => "Completed",
        })
    }
}

impl Default for RetouchRequestStatus {
    fn default() -> Self {
        Self::InProgress
    }
}
