#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a customer order at the intake desk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum OrderStatus {
    /// Created, no acceptance started.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Created"))]
    Created,
    /// A stockman started accepting line items.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Assembly"))]
    Assembly,
    /// Every line item was accepted.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "FullyAccepted"))]
    FullyAccepted,
    /// Acceptance finished with at least one line item missing.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "AcceptedWithDiscrepancies"))]
    AcceptedWithDiscrepancies,
}

impl OrderStatus {
    /// Returns true once acceptance has finished, with or without discrepancies.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::FullyAccepted | Self::AcceptedWithDiscrepancies)
    }

    pub const ALL: &'static [OrderStatus] = &[
        Self::Created,
        Self::Assembly,
        Self::FullyAccepted,
        Self::AcceptedWithDiscrepancies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Assembly => "Assembly",
            Self::FullyAccepted => "FullyAccepted",
            Self::AcceptedWithDiscrepancies => "AcceptedWithDiscrepancies",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Created
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOrderStatusError {
    invalid: String,
}

impl fmt::Display for ParseOrderStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid order status '{}'", self.invalid)
    }
}

impl std::error::Error for ParseOrderStatusError {}

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| ParseOrderStatusError {
                invalid: s.to_string(),
            })
    }
}
