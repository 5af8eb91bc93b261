//! Undo for annotation runs.

use crate::error::Result;
use std::path::Path;

/// Copies every file in `backup_dir` over its namesake in `live_dir`.
///
/// Returns the number of files restored. Files in `live_dir` without a backup
/// are left untouched, and a missing backup directory restores nothing.
pub async fn restore(live_dir: &Path, backup_dir: &Path) -> Result<usize> {
    if !tokio::fs::try_exists(backup_dir).await.unwrap_or(false) {
        tracing::info!(
            "no backup directory at {}, nothing to restore",
            backup_dir.display()
        );
        return Ok(0);
    }

    let mut backups = Vec::new();
    let mut dir = tokio::fs::read_dir(backup_dir).await?;
    while let Some(entry) = dir.next_entry().await? {
        if entry.file_type().await?.is_file() {
            backups.push(entry.file_name());
        }
    }
    backups.sort();

    tokio::fs::create_dir_all(live_dir).await?;
    for name in &backups {
        tokio::fs::copy(backup_dir.join(name), live_dir.join(name)).await?;
        tracing::info!("restored: {}", name.to_string_lossy());
    }

    tracing::info!(
        "{} files restored from {}",
        backups.len(),
        backup_dir.display()
    );
    Ok(backups.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_restore_copies_backups_over_live_files() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path();
        let backup = live.join("raw");
        std::fs::create_dir_all(&backup).unwrap();

        std::fs::write(backup.join("a.png"), b"original-a").unwrap();
        std::fs::write(live.join("a.png"), b"annotated-a").unwrap();
        std::fs::write(backup.join("b.png"), b"original-b").unwrap();
        std::fs::write(live.join("c.png"), b"untouched-c").unwrap();

        let count = restore(live, &backup).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(std::fs::read(live.join("a.png")).unwrap(), b"original-a");
        assert_eq!(std::fs::read(live.join("b.png")).unwrap(), b"original-b");
        assert_eq!(std::fs::read(live.join("c.png")).unwrap(), b"untouched-c");
        // Backups stay in place
        assert_eq!(std::fs::read(backup.join("a.png")).unwrap(), b"original-a");
    }

    #[tokio::test]
    async fn test_restore_without_backup_dir() {
        let dir = tempfile::tempdir().unwrap();
        let count = restore(dir.path(), &dir.path().join("raw")).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_restore_ignores_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join("raw");
        std::fs::create_dir_all(backup.join("nested")).unwrap();
        std::fs::write(backup.join("a.png"), b"a").unwrap();

        let count = restore(dir.path(), &backup).await.unwrap();
        assert_eq!(count, 1);
        assert!(!dir.path().join("nested").exists());
    }
}
