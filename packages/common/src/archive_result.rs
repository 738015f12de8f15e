use serde::{Deserialize, Serialize};

use crate::mq::Message;

/// Structured error info attached to a failed archive build.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveErrorInfo {
    /// Machine-readable error code (e.g., "STORAGE_ERROR", "TIMEOUT").
    pub code: String,
    /// Human-readable error description.
    pub message: String,
}

impl ArchiveErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Result from the worker after an archive-build attempt.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ArchiveResult {
    /// Original job ID.
    pub job_id: String,
    /// Retouch request the archive belongs to.
    pub retouch_request_id: i32,
    /// Path of the produced archive on the shared volume. None on
    /// total failure.
    pub archive_path: Option<String>,
    /// Number of product folders successfully packed.
    pub folders_packed: usize,
    /// Total number of product folders in the job.
    pub folders_total: usize,
    /// Error info; present only on total failure.
    pub error_info: Option<ArchiveErrorInfo>,
}

impl ArchiveResult {
    /// Build a success (possibly partial) result.
    pub fn completed(
        job_id: String,
        retouch_request_id: i32,
        archive_path: String,
        folders_packed: usize,
        folders_total: usize,
    ) -> Self {
        Self {
            job_id,
            retouch_request_id,
            archive_path: Some(archive_path),
            folders_packed,
            folders_total,
            error_info: None,
        }
    }

    /// Build a total-failure result (no output produced).
    pub fn failed(job_id: String, retouch_request_id: i32, error_info: ArchiveErrorInfo) -> Self {
        Self {
            job_id,
            retouch_request_id,
            archive_path: None,
            folders_packed: 0,
            folders_total: 0,
            error_info: Some(error_info),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_info.is_none() && self.archive_path.is_some()
    }
}

impl Message for ArchiveResult {
    fn message_type() -> &'static str {
        "archive_result"
    }

    fn message_id(&self) -> &str {
        &self.job_id
    }
}
