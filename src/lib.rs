mod auth;
mod core;
mod inventory;

#[cfg(test)]
mod tests;

pub use crate::core::domain::error::{OpenStackError, OpenStackResult, ValidationError};
pub use crate::core::domain::model::{
    inventory_config::{InventoryConfig, InventoryConfigBuilder, RateLimitConfig},
    progress::{ProgressEvent, ProgressKind},
    report::{Report, Summary},
    resource::{
        ClusterProperties, ExternalGateway, FixedIp, FloatingIpProperties, LoadBalancerProperties,
        NetworkProperties, Resource, ResourceDetails, ResourceType, RouterProperties,
        ServerProperties, StaticRoute, Subnet, VolumeAttachment, VolumeProperties,
        VpnConnectionProperties,
    },
    scope::Scope,
};
pub use crate::core::infrastructure::{
    identity_cli::{IdentityCli, OpenStackCli},
    snapshot_store::SnapshotStore,
};
pub use crate::inventory::application::service::{
    inventory_service::{DEFAULT_BACKUP_RETENTION, SnapshotStatus},
    progress_reporter::{ChannelProgressReporter, ProgressReporter},
};
use crate::{
    core::infrastructure::session::SessionFactory,
    inventory::application::service::{
        inventory_service::InventoryService, report_builder::ReportBuilder,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

/// A client that inventories the resources of an OpenStack cloud.
///
/// This client provides:
/// - Project discovery with graceful fallbacks
/// - Sequential, failure-tolerant collection of every resource type
/// - A JSON snapshot of the latest report with timestamped backups
///
/// # Examples
///
/// ```no_run
/// use openstack_inventory::{InventoryClient, InventoryConfig, OpenStackResult};
///
/// #[tokio::main]
/// async fn main() -> OpenStackResult<()> {
///     let client = InventoryClient::builder()
///         .config(InventoryConfig::from_env()?)
///         .data_dir("data")
///         .build()?;
///
///     let report = client.get_all().await?;
///     println!("{} resources", report.summary().total_resources());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InventoryClient {
    service: Arc<InventoryService>,
}

/// Builder for InventoryClient configuration
#[derive(Default)]
pub struct InventoryClientBuilder {
    config: Option<InventoryConfig>,
    data_dir: Option<PathBuf>,
    retention: Option<Duration>,
    identity_cli: Option<Arc<dyn IdentityCli>>,
}

impl InventoryClientBuilder {
    pub fn config(mut self, config: InventoryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Directory holding the snapshot and its backups (default `data`).
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Age after which backups are pruned on refresh (default 7 days).
    pub fn backup_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Replaces the command line tool used as a discovery fallback.
    pub fn identity_cli(mut self, cli: Arc<dyn IdentityCli>) -> Self {
        self.identity_cli = Some(cli);
        self
    }

    pub fn build(self) -> OpenStackResult<InventoryClient> {
        let config = self.config.ok_or_else(|| ValidationError::Field {
            field: "config".to_string(),
            message: "Configuration is required".to_string(),
        })?;

        let cli = self
            .identity_cli
            .unwrap_or_else(|| Arc::new(OpenStackCli::new(&config)));
        let factory = Arc::new(SessionFactory::new(config)?);
        let store = self.data_dir.map(SnapshotStore::new).unwrap_or_default();

        let service = InventoryService::new(ReportBuilder::new(factory, cli), store)
            .with_retention(self.retention.unwrap_or(DEFAULT_BACKUP_RETENTION));

        Ok(InventoryClient {
            service: Arc::new(service),
        })
    }
}

impl InventoryClient {
    /// Creates a new builder for InventoryClient configuration
    pub fn builder() -> InventoryClientBuilder {
        InventoryClientBuilder::default()
    }

    /// Collects a report without touching the snapshot.
    ///
    /// # Errors
    ///
    /// This method will return an error if:
    /// - A configured project cannot be authenticated into
    /// - Discovery failed and the current project cannot be authenticated into
    pub async fn build_report(
        &self,
        reporter: Option<&dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> OpenStackResult<Report> {
        self.service.builder().build_report(reporter, cancel).await
    }

    /// Lists the projects a collection would cover.
    pub async fn resolve_scopes(&self) -> OpenStackResult<Vec<Scope>> {
        self.service.builder().resolver().resolve_scopes().await
    }

    /// Returns the cached report, collecting one when none exists.
    pub async fn get_all(&self) -> OpenStackResult<Report> {
        self.service.get_all().await
    }

    /// Collects, persists and returns a fresh report.
    pub async fn refresh(
        &self,
        reporter: Option<&dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> OpenStackResult<Report> {
        self.service.refresh(reporter, cancel).await
    }

    /// Refreshes on a background task, streaming progress events.
    pub fn spawn_refresh(
        &self,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (JoinHandle<OpenStackResult<Report>>, mpsc::Receiver<ProgressEvent>) {
        Arc::clone(&self.service).spawn_refresh(capacity, cancel)
    }

    pub async fn status(&self) -> OpenStackResult<SnapshotStatus> {
        self.service.status().await
    }

    /// Deletes snapshot backups older than `max_age`.
    pub async fn prune(&self, max_age: Duration) -> OpenStackResult<usize> {
        self.service.prune(max_age).await
    }
}
