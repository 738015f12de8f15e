use std::io::Write;
use std::path::Path;
use std::time::Duration;

use common::archive_job::ArchiveJob;
use common::archive_result::{ArchiveErrorInfo, ArchiveResult};
use common::storage::PhotoStore;
use tracing::{info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Result, WorkerError};

/// Build the archive for one job. Always yields a result message; a
/// total failure (nothing packed) carries error info instead of a path.
pub async fn handle_archive_job(
    store: &dyn PhotoStore,
    output_dir: &Path,
    job: &ArchiveJob,
) -> ArchiveResult {
    let timeout = Duration::from_secs(job.timeout_secs);

    match tokio::time::timeout(timeout, build_archive(store, output_dir, job)).await {
        Ok(Ok(packed)) => {
            let path = output_dir.join(job.archive_name());
            ArchiveResult::completed(
                job.job_id.clone(),
                job.retouch_request_id,
                path.to_string_lossy().into_owned(),
                packed,
                job.folders.len(),
            )
        }
        Ok(Err(e)) => {
            let code = match e {
                WorkerError::Storage(_) => "STORAGE_ERROR",
                WorkerError::Io(_) | WorkerError::Zip(_) => "WRITE_ERROR",
                _ => "BUILD_ERROR",
            };
            ArchiveResult::failed(
                job.job_id.clone(),
                job.retouch_request_id,
                ArchiveErrorInfo::new(code, e.to_string()),
            )
        }
        Err(_) => ArchiveResult::failed(
            job.job_id.clone(),
            job.retouch_request_id,
            ArchiveErrorInfo::new(
                "TIMEOUT",
                format!("Build exceeded {} seconds", job.timeout_secs),
            ),
        ),
    }
}

/// Download every folder into `{request_number}.zip`, one subdirectory
/// per barcode. A folder failure is logged and skipped; the build as a
/// whole fails only when every folder failed.
async fn build_archive(store: &dyn PhotoStore, output_dir: &Path, job: &ArchiveJob) -> Result<usize> {
    std::fs::create_dir_all(output_dir)?;
    let archive_path = output_dir.join(job.archive_name());

    let file = std::fs::File::create(&archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let total = job.folders.len();
    let mut packed = 0;

    for (index, product) in job.folders.iter().enumerate() {
        match pack_folder(store, &mut writer, options, product.barcode.as_str(), &product.folder)
            .await
        {
            Ok(files) => {
                packed += 1;
                info!(
                    job_id = %job.job_id,
                    barcode = %product.barcode,
                    files,
                    progress = format!("{}/{}", index + 1, total),
                    "Packed product folder"
                );
            }
            Err(e) => {
                warn!(
                    job_id = %job.job_id,
                    barcode = %product.barcode,
                    folder = %product.folder,
                    error = %e,
                    "Skipping product folder"
                );
            }
        }
    }

    if packed == 0 && total > 0 {
        drop(writer);
        let _ = std::fs::remove_file(&archive_path);
        return Err(WorkerError::Task(format!(
            "All {total} product folders failed"
        )));
    }

    writer.finish()?;
    Ok(packed)
}

async fn pack_folder(
    store: &dyn PhotoStore,
    writer: &mut ZipWriter<std::fs::File>,
    options: SimpleFileOptions,
    barcode: &str,
    folder: &str,
) -> Result<usize> {
    let names = store.list_folder(folder).await?;

    for name in &names {
        let bytes = store.download(folder, name).await?;
        writer.start_file(format!("{barcode}/{name}"), options)?;
        writer.write_all(&bytes)?;
    }

    Ok(names.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::archive_job::ProductFolder;
    use common::storage::filesystem::FilesystemPhotoStore;

    fn seed_folder(base: &Path, folder: &str, files: &[(&str, &[u8])]) {
        let dir = base.join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        for (name, bytes) in files {
            std::fs::write(dir.join(name), bytes).unwrap();
        }
    }

    #[tokio::test]
    async fn builds_archive_per_barcode() {
        let photos = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        seed_folder(photos.path(), "shots/a", &[("1.jpg", b"one"), ("2.jpg", b"two")]);
        seed_folder(photos.path(), "shots/b", &[("3.jpg", b"three")]);

        let store = FilesystemPhotoStore::new(photos.path());
        let job = ArchiveJob::new(
            1,
            501,
            vec![
                ProductFolder {
                    barcode: "460001".into(),
                    folder: "shots/a".into(),
                },
                ProductFolder {
                    barcode: "460002".into(),
                    folder: "shots/b".into(),
                },
            ],
            60,
        );

        let result = handle_archive_job(&store, out.path(), &job).await;
        assert!(result.is_success());
        assert_eq!(result.folders_packed, 2);
        assert_eq!(result.folders_total, 2);

        let archive = std::fs::File::open(out.path().join("501.zip")).unwrap();
        let mut zip = zip::ZipArchive::new(archive).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"460001/1.jpg".to_string()));
        assert!(names.contains(&"460002/3.jpg".to_string()));
    }

    #[tokio::test]
    async fn missing_folder_is_skipped() {
        let photos = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        seed_folder(photos.path(), "shots/ok", &[("1.jpg", b"one")]);

        let store = FilesystemPhotoStore::new(photos.path());
        let job = ArchiveJob::new(
            2,
            502,
            vec![
                ProductFolder {
                    barcode: "460001".into(),
                    folder: "shots/ok".into(),
                },
                ProductFolder {
                    barcode: "460009".into(),
                    folder: "shots/missing".into(),
                },
            ],
            60,
        );

        let result = handle_archive_job(&store, out.path(), &job).await;
        assert!(result.is_success());
        assert_eq!(result.folders_packed, 1);
        assert_eq!(result.folders_total, 2);
    }

    #[tokio::test]
    async fn total_failure_publishes_error() {
        let photos = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let store = FilesystemPhotoStore::new(photos.path());
        let job = ArchiveJob::new(
            3,
            503,
            vec![ProductFolder {
                barcode: "460001".into(),
                folder: "shots/nowhere".into(),
            }],
            60,
        );

        let result = handle_archive_job(&store, out.path(), &job).await;
        assert!(!result.is_success());
        assert!(result.error_info.is_some());
        assert!(!out.path().join("503.zip").exists());
    }
}
