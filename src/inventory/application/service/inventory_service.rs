//! The operations exposed to callers: cached reads, refreshes and snapshot
//! housekeeping.

use super::{
    progress_reporter::{ChannelProgressReporter, Progress, ProgressReporter},
    report_builder::ReportBuilder,
};
use crate::core::{
    domain::{
        error::{OpenStackError, OpenStackResult},
        model::{
            progress::{ProgressEvent, ProgressKind},
            report::Report,
        },
    },
    infrastructure::snapshot_store::SnapshotStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Backups older than this are removed after each refresh.
pub const DEFAULT_BACKUP_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// State of the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStatus {
    pub path: PathBuf,
    pub exists: bool,
    /// Time since the snapshot was written, `None` when there is none.
    pub age: Option<Duration>,
}

pub struct InventoryService {
    builder: ReportBuilder,
    store: SnapshotStore,
    retention: Duration,
}

impl InventoryService {
    pub fn new(builder: ReportBuilder, store: SnapshotStore) -> Self {
        Self {
            builder,
            store,
            retention: DEFAULT_BACKUP_RETENTION,
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn builder(&self) -> &ReportBuilder {
        &self.builder
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Returns the cached snapshot, collecting and persisting a fresh one when
    /// there is none.
    ///
    /// # Errors
    ///
    /// [`OpenStackError::DataUnavailable`] when there is no usable snapshot
    /// and the cloud cannot be reached.
    pub async fn get_all(&self) -> OpenStackResult<Report> {
        match self.store.load().await {
            Ok(report) => return Ok(report),
            Err(OpenStackError::SnapshotNotFound(_)) => {
                info!("no cached report, collecting");
            }
            Err(e) => warn!(error = %e, "cached report unreadable, collecting"),
        }

        self.refresh(None, &CancellationToken::new())
            .await
            .map_err(|e| match e {
                OpenStackError::DataUnavailable(_) => e,
                other => OpenStackError::DataUnavailable(other.to_string()),
            })
    }

    /// Collects a fresh report and persists it.
    ///
    /// Persistence and pruning failures are logged; the report is still
    /// returned.
    pub async fn refresh(
        &self,
        reporter: Option<&dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> OpenStackResult<Report> {
        let progress = Progress::new(reporter);

        let report = match self.builder.build_report(reporter, cancel).await {
            Ok(report) => report,
            Err(e) => {
                progress.emit(ProgressEvent::new(
                    ProgressKind::Error,
                    format!("Resource collection failed: {}", e),
                ));
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(&report).await {
            warn!(error = %e, "failed to save report");
        }
        if let Err(e) = self.store.prune_backups(self.retention).await {
            warn!(error = %e, "failed to prune old backups");
        }

        let summary = report.summary();
        progress.emit(
            ProgressEvent::new(ProgressKind::Complete, "Resource collection completed")
                .count(summary.total_resources())
                .summary(summary.by_type()),
        );
        Ok(report)
    }

    /// Runs [`refresh`](Self::refresh) on a detached task.
    ///
    /// Progress is delivered through a channel of `capacity` events; events
    /// are dropped rather than stalling the collection when it is full.
    pub fn spawn_refresh(
        self: Arc<Self>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (JoinHandle<OpenStackResult<Report>>, mpsc::Receiver<ProgressEvent>) {
        let (reporter, receiver) = ChannelProgressReporter::channel(capacity);
        let handle = tokio::spawn(async move { self.refresh(Some(&reporter), &cancel).await });
        (handle, receiver)
    }

    pub async fn status(&self) -> OpenStackResult<SnapshotStatus> {
        let path = self.store.report_path();
        match self.store.age().await {
            Ok(age) => Ok(SnapshotStatus {
                path,
                exists: true,
                age: Some(age),
            }),
            Err(OpenStackError::SnapshotNotFound(_)) => Ok(SnapshotStatus {
                path,
                exists: false,
                age: None,
            }),
            Err(e) => Err(e),
        }
    }

    /// Removes backups older than `max_age`. Returns how many were removed.
    pub async fn prune(&self, max_age: Duration) -> OpenStackResult<usize> {
        self.store.prune_backups(max_age).await
    }
}
