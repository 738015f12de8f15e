#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::retouch_status::RetouchStatus;

/// Type tag of an append-only product audit log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum OperationType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Intake"))]
    Intake,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "OrderAccepted"))]
    OrderAccepted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DefectMarked"))]
    DefectMarked,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ShootingStarted"))]
    ShootingStarted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ShootingFinished"))]
    ShootingFinished,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "RetouchAssigned"))]
    RetouchAssigned,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "RetouchDone"))]
    RetouchDone,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "RetouchSkipped"))]
    RetouchSkipped,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "Intake",
            Self::OrderAccepted => "OrderAccepted",
            Self::DefectMarked => "DefectMarked",
            Self::ShootingStarted => "ShootingStarted",
            Self::ShootingFinished => "ShootingFinished",
            Self::RetouchAssigned => "RetouchAssigned",
            Self::RetouchDone => "RetouchDone",
            Self::RetouchSkipped => "RetouchSkipped",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed mapping used on senior verification: which audit operation is
/// written for a product, keyed by the retouch status it was verified in.
/// Products still `InWork` when verified get no audit entry.
pub fn audit_operation_for(status: RetouchStatus) -> Option<OperationType> {
    match status {
        RetouchStatus::ReadyForReview => Some(OperationType::RetouchDone),
        RetouchStatus::NoRetouchNeeded => Some(OperationType::RetouchSkipped),
        RetouchStatus::InWork => None,
    }
}
