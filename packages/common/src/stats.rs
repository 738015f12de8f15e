use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mq::Message;

/// Daily product-count statistics row, exported to the external spreadsheet
/// by the worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsExport {
    /// Export identifier (UUID).
    pub export_id: String,
    /// The day this row describes.
    pub date: NaiveDate,
    /// Counts keyed by move status name, in stable order.
    pub counts: Vec<(String, u64)>,
}

impl StatsExport {
    pub fn new(date: NaiveDate, counts: Vec<(String, u64)>) -> Self {
        Self {
            export_id: Uuid::new_v4().to_string(),
            date,
            counts,
        }
    }

    /// Render the row as it is appended to the spreadsheet.
    pub fn as_row(&self) -> Vec<String> {
        let mut row = vec![self.date.to_string()];
        row.extend(self.counts.iter().map(|(_, n)| n.to_string()));
        row
    }
}

impl Message for StatsExport {
    fn message_type() -> &'static str {
        "stats_export"
    }

    fn message_id(&self) -> &str {
        &self.export_id
    }
}
