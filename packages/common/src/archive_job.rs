use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mq::Message;

/// One product's remote source-photo folder inside an archive job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductFolder {
    /// Product barcode; used as the subdirectory name inside the archive.
    pub barcode: String,
    /// Remote folder reference (prefix/path in the photo store).
    pub folder: String,
}

/// An archive-build job message sent to the worker queue.
///
/// The worker downloads every file from each product folder and writes them
/// into `{request_number}.zip`, one subdirectory per barcode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveJob {
    /// Job identifier (UUID), also stamped on the retouch request.
    pub job_id: String,
    /// ID of the retouch request the archive belongs to.
    pub retouch_request_id: i32,
    /// Human-facing request number; names the output archive.
    pub request_number: i32,
    /// Source folders, one per member product. Products without a folder
    /// reference are filtered out before enqueueing.
    pub folders: Vec<ProductFolder>,
    /// Overall build timeout in seconds.
    pub timeout_secs: u64,
}

impl ArchiveJob {
    /// Create a new archive job with a generated UUID.
    pub fn new(
        retouch_request_id: i32,
        request_number: i32,
        folders: Vec<ProductFolder>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            retouch_request_id,
            request_number,
            folders,
            timeout_secs,
        }
    }

    /// Archive filename for this job, relative to the output directory.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.request_number)
    }
}

impl Message for ArchiveJob {
    fn message_type() -> &'static str {
        "archive_job"
    }

    fn message_id(&self) -> &str {
        &self.job_id
    }
}
