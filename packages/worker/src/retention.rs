use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{error, info, warn};

const SCAN_INTERVAL: Duration = Duration::from_secs(3600);

/// Delete finished archives older than the retention window.
pub async fn run_retention_sweep(output_dir: String, retention_hours: u64) {
    info!(output_dir = %output_dir, retention_hours, "Starting archive retention sweep");

    let max_age = Duration::from_secs(retention_hours * 3600);
    let mut interval = tokio::time::interval(SCAN_INTERVAL);

    loop {
        interval.tick().await;

        if let Err(e) = sweep_archives(Path::new(&output_dir), max_age) {
            error!(error = %e, "Archive retention sweep failed");
        }
    }
}

fn sweep_archives(output_dir: &Path, max_age: Duration) -> std::io::Result<()> {
    let entries = match std::fs::read_dir(output_dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "zip") {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age < max_age {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), age_hours = age.as_secs() / 3600, "Deleted expired archive"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete expired archive"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_fresh_and_non_zip_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("101.zip"), b"fresh").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        sweep_archives(dir.path(), Duration::from_secs(3600)).unwrap();

        assert!(dir.path().join("101.zip").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn deletes_expired_archives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("102.zip");
        std::fs::write(&path, b"old").unwrap();

        // Zero retention makes every archive expired.
        sweep_archives(dir.path(), Duration::ZERO).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn missing_output_dir_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(sweep_archives(&missing, Duration::from_secs(60)).is_ok());
    }
}
