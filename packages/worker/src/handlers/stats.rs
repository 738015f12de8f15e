use common::stats::StatsExport;
use serde_json::json;
use tracing::{debug, info};

use crate::config::StatsConfig;
use crate::error::{Result, WorkerError};

/// Append one daily stats row to the external spreadsheet endpoint.
pub async fn handle_stats_export(
    client: &reqwest::Client,
    config: &StatsConfig,
    export: &StatsExport,
) -> Result<()> {
    let Some(ref url) = config.spreadsheet_url else {
        debug!(export_id = %export.export_id, "Spreadsheet endpoint not configured, dropping row");
        return Ok(());
    };

    let mut request = client.post(url).json(&json!({
        "date": export.date,
        "row": export.as_row(),
    }));
    if let Some(ref token) = config.token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(WorkerError::Task(format!(
            "Spreadsheet endpoint returned {}",
            response.status()
        )));
    }

    info!(export_id = %export.export_id, date = %export.date, "Appended stats row");
    Ok(())
}
