#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical-location/workflow state of a product in the warehouse.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum MoveStatus {
    /// Announced by an intake import but not yet seen in the warehouse.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "NotReceived"))]
    NotReceived,
    /// Accepted against an order at the intake desk.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Accepted"))]
    Accepted,
    /// Placed on a storage shelf, available for shooting.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "OnShelf"))]
    OnShelf,
    /// Packaging was opened for shooting.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Opened"))]
    Opened,
    /// Marked defective by warehouse staff.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Defect"))]
    Defect,
    /// Shipped back to the seller.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Shipped"))]
    Shipped,
}

impl MoveStatus {
    /// Returns true if the product is physically present in the warehouse.
    pub fn is_in_warehouse(&self) -> bool {
        !matches!(self, Self::NotReceived | Self::Shipped)
    }

    /// All possible status values.
    pub const ALL: &'static [MoveStatus] = &[
        Self::NotReceived,
        Self::Accepted,
        Self::OnShelf,
        Self::Opened,
        Self::Defect,
        Self::Shipped,
    ];

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReceived => "NotReceived",
            Self::Accepted => "Accepted",
            Self::OnShelf => "OnShelf",
            Self::Opened => "Opened",
            Self::Defect => "Defect",
            Self::Shipped => "Shipped",
        }
    }
}

impl fmt::Display for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for MoveStatus {
    fn default() -> Self {
        Self::NotReceived
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoveStatusError {
    invalid: String,
}

impl fmt::Display for ParseMoveStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid move status '{}'. Valid values: {}",
            self.invalid,
            MoveStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseMoveStatusError {}

impl FromStr for MoveStatus {
    type Err = ParseMoveStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoveStatus::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| ParseMoveStatusError {
                invalid: s.to_string(),
            })
    }
}
