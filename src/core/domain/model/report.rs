//! The inventory report and its derived summary.

use crate::core::domain::model::{
    resource::{Resource, ResourceType},
    scope::Scope,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete, immutable inventory snapshot.
///
/// The summary is always derived from the resource list, both when the report
/// is built and when it is read back from disk, so the two can never drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredReport")]
pub struct Report {
    generated_at: DateTime<Utc>,
    projects: Vec<Scope>,
    resources: Vec<Resource>,
    summary: Summary,
}

impl Report {
    pub fn new(generated_at: DateTime<Utc>, projects: Vec<Scope>, resources: Vec<Resource>) -> Self {
        let summary = Summary::from_resources(&resources, projects.len());
        Self {
            generated_at,
            projects,
            resources,
            summary,
        }
    }

    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Scopes seen during the collection, in discovery order.
    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.projects
    }

    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    #[must_use]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Resources of one type.
    pub fn resources_of(&self, kind: ResourceType) -> impl Iterator<Item = &Resource> {
        self.resources
            .iter()
            .filter(move |r| r.resource_type() == kind)
    }
}

/// On-disk representation; the summary in the file is ignored and recomputed.
#[derive(Deserialize)]
struct StoredReport {
    generated_at: DateTime<Utc>,
    #[serde(default)]
    projects: Vec<Scope>,
    #[serde(default)]
    resources: Vec<Resource>,
}

impl From<StoredReport> for Report {
    fn from(stored: StoredReport) -> Self {
        Report::new(stored.generated_at, stored.projects, stored.resources)
    }
}

/// Resource counts per type plus the number of scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_projects: usize,
    pub total_servers: usize,
    pub total_volumes: usize,
    pub total_floating_ips: usize,
    pub total_routers: usize,
    pub total_networks: usize,
    pub total_load_balancers: usize,
    pub total_vpn_connections: usize,
    pub total_clusters: usize,
}

impl Summary {
    pub fn from_resources(resources: &[Resource], total_projects: usize) -> Self {
        let mut summary = Summary {
            total_projects,
            ..Default::default()
        };
        for resource in resources {
            *summary.slot(resource.resource_type()) += 1;
        }
        summary
    }

    /// Count for one resource type.
    #[must_use]
    pub fn count(&self, kind: ResourceType) -> usize {
        match kind {
            ResourceType::Server => self.total_servers,
            ResourceType::Volume => self.total_volumes,
            ResourceType::FloatingIp => self.total_floating_ips,
            ResourceType::Router => self.total_routers,
            ResourceType::Network => self.total_networks,
            ResourceType::LoadBalancer => self.total_load_balancers,
            ResourceType::VpnConnection => self.total_vpn_connections,
            ResourceType::Cluster => self.total_clusters,
        }
    }

    /// Total number of resources across all types.
    #[must_use]
    pub fn total_resources(&self) -> usize {
        ResourceType::ALL.iter().map(|k| self.count(*k)).sum()
    }

    /// Type tag to count, only for types that are present.
    #[must_use]
    pub fn by_type(&self) -> BTreeMap<String, usize> {
        ResourceType::ALL
            .iter()
            .filter(|k| self.count(**k) > 0)
            .map(|k| (k.as_str().to_string(), self.count(*k)))
            .collect()
    }

    fn slot(&mut self, kind: ResourceType) -> &mut usize {
        match kind {
            ResourceType::Server => &mut self.total_servers,
            ResourceType::Volume => &mut self.total_volumes,
            ResourceType::FloatingIp => &mut self.total_floating_ips,
            ResourceType::Router => &mut self.total_routers,
            ResourceType::Network => &mut self.total_networks,
            ResourceType::LoadBalancer => &mut self.total_load_balancers,
            ResourceType::VpnConnection => &mut self.total_vpn_connections,
            ResourceType::Cluster => &mut self.total_clusters,
        }
    }
}
