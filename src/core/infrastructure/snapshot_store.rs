//! Whole-report JSON snapshots with timestamped backups.
//!
//! The store assumes a single writer. Two concurrent saves may interleave
//! their rename and write steps.

use crate::core::domain::{
    error::{OpenStackError, OpenStackResult},
    model::report::Report,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const REPORT_FILE: &str = "openstack_report.json";
const BACKUP_PREFIX: &str = "backup_";

/// File-backed store for the latest [`Report`].
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        SnapshotStore::new(DEFAULT_DATA_DIR)
    }
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the canonical snapshot.
    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join(REPORT_FILE)
    }

    /// Writes `report`, moving any existing snapshot to a backup.
    ///
    /// The new document is encoded and staged next to the snapshot before
    /// the current file is touched, so a failed save leaves it in place.
    pub async fn save(&self, report: &Report) -> OpenStackResult<()> {
        let data = serde_json::to_vec_pretty(report)?;

        fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            OpenStackError::Storage(format!(
                "failed to create data directory {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let staging_path = self.staging_path();
        fs::write(&staging_path, data).await.map_err(|e| {
            OpenStackError::Storage(format!(
                "failed to write {}: {}",
                staging_path.display(),
                e
            ))
        })?;

        let report_path = self.report_path();
        if fs::try_exists(&report_path).await.unwrap_or(false) {
            let backup_path = self.next_backup_path().await;
            fs::rename(&report_path, &backup_path).await.map_err(|e| {
                OpenStackError::Storage(format!("failed to create backup: {}", e))
            })?;
            debug!(backup = %backup_path.display(), "previous snapshot moved to backup");
        }

        fs::rename(&staging_path, &report_path).await.map_err(|e| {
            OpenStackError::Storage(format!(
                "failed to move {} into place: {}",
                staging_path.display(),
                e
            ))
        })?;

        info!(path = %report_path.display(), resources = report.resources().len(), "snapshot saved");
        Ok(())
    }

    /// Reads the latest snapshot.
    pub async fn load(&self) -> OpenStackResult<Report> {
        let report_path = self.report_path();
        let data = match fs::read(&report_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OpenStackError::SnapshotNotFound(report_path));
            }
            Err(e) => {
                return Err(OpenStackError::Storage(format!(
                    "failed to read {}: {}",
                    report_path.display(),
                    e
                )));
            }
        };
        Ok(serde_json::from_slice(&data)?)
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(self.report_path()).await.unwrap_or(false)
    }

    /// Time since the snapshot was last written.
    pub async fn age(&self) -> OpenStackResult<Duration> {
        let report_path = self.report_path();
        let metadata = match fs::metadata(&report_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OpenStackError::SnapshotNotFound(report_path));
            }
            Err(e) => return Err(e.into()),
        };
        let modified = metadata.modified()?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }

    /// Backup files, sorted by name.
    pub async fn list_backups(&self) -> OpenStackResult<Vec<PathBuf>> {
        let mut backups = Vec::new();
        let mut entries = match fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(backups),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if is_backup(&entry.file_name().to_string_lossy()) && entry.file_type().await?.is_file() {
                backups.push(entry.path());
            }
        }
        backups.sort();
        Ok(backups)
    }

    /// Deletes backups last modified more than `max_age` ago. Returns how many were removed.
    pub async fn prune_backups(&self, max_age: Duration) -> OpenStackResult<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        for path in self.list_backups().await? {
            let modified = match fs::metadata(&path).await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable backup");
                    continue;
                }
            };
            if now.duration_since(modified).unwrap_or(Duration::ZERO) > max_age {
                fs::remove_file(&path).await.map_err(|e| {
                    OpenStackError::Storage(format!(
                        "failed to remove backup file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "old backups pruned");
        }
        Ok(removed)
    }

    fn staging_path(&self) -> PathBuf {
        self.data_dir.join(format!(".{}.tmp", REPORT_FILE))
    }

    async fn next_backup_path(&self) -> PathBuf {
        let stamp = Utc::now().timestamp_millis();
        let mut candidate = self
            .data_dir
            .join(format!("{}{}_{}", BACKUP_PREFIX, stamp, REPORT_FILE));
        let mut counter = 1;
        while fs::try_exists(&candidate).await.unwrap_or(false) {
            candidate = self
                .data_dir
                .join(format!("{}{}-{}_{}", BACKUP_PREFIX, stamp, counter, REPORT_FILE));
            counter += 1;
        }
        candidate
    }
}

fn is_backup(file_name: &str) -> bool {
    file_name.len() > BACKUP_PREFIX.len()
        && file_name.starts_with(BACKUP_PREFIX)
        && file_name.ends_with(REPORT_FILE)
}
