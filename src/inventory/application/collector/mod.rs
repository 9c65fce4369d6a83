//! Per-type fetch-and-normalize routines.
//!
//! Collectors hold no state between runs. Each one lists its resource type
//! through a [`Session`], attributes every item to a project and enriches it
//! with best-effort secondary lookups.

mod clusters;
mod floating_ips;
mod load_balancers;
mod networks;
mod routers;
mod servers;
mod volumes;
mod vpn_connections;

pub use clusters::ClusterCollector;
pub use floating_ips::FloatingIpCollector;
pub use load_balancers::LoadBalancerCollector;
pub use networks::NetworkCollector;
pub use routers::RouterCollector;
pub use servers::ServerCollector;
pub use volumes::VolumeCollector;
pub use vpn_connections::VpnConnectionCollector;

use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{Resource, ResourceDetails, ResourceType},
            scope::ScopeNames,
        },
        value_object::serde_helpers::{lenient_timestamp, string_or_null},
    },
    infrastructure::{
        api_client::ServiceClient,
        session::{ListingMode, Session},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Fetches and normalizes one resource type.
#[async_trait]
pub trait ResourceCollector: Send + Sync {
    fn resource_type(&self) -> ResourceType;

    /// Lists every item of this type visible through `session`.
    ///
    /// An `Err` means the list call itself failed. Failed enrichment lookups
    /// never surface here.
    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>>;
}

/// Every collector, in collection order.
pub fn default_collectors() -> Vec<Box<dyn ResourceCollector>> {
    vec![
        Box::new(ServerCollector),
        Box::new(VolumeCollector),
        Box::new(FloatingIpCollector),
        Box::new(RouterCollector),
        Box::new(NetworkCollector),
        Box::new(LoadBalancerCollector),
        Box::new(VpnConnectionCollector),
        Box::new(ClusterCollector),
    ]
}

/// How a service narrows listings to tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tenancy {
    /// Nova and Cinder: project-scoped by the token, `all_tenants=1` widens.
    AllTenantsFlag,
    /// Neutron and Octavia: admins see everything, `project_id` narrows.
    ProjectFilter,
    /// No tenant parameters are sent.
    TokenOnly,
}

/// Lists a collection following the session's listing mode.
///
/// A shared session first asks for all tenants and retries scoped when that
/// is refused. A per-project session never asks for all tenants.
pub(crate) async fn list_for_session<T>(
    client: &ServiceClient,
    session: &Session,
    tenancy: Tenancy,
    path: &str,
    key: &str,
) -> OpenStackResult<Vec<T>>
where
    T: DeserializeOwned,
{
    let scope = session.scope();
    match (session.mode(), tenancy) {
        (ListingMode::AllTenants, Tenancy::AllTenantsFlag) => {
            match client.list(path, &[("all_tenants", "1")], key).await {
                Ok(items) => Ok(items),
                Err(e) => {
                    warn!(%path, error = %e, "all-tenants listing refused, retrying scoped");
                    client.list(path, &[], key).await
                }
            }
        }
        (ListingMode::Scoped, Tenancy::ProjectFilter) if !scope.is_placeholder() => {
            client.list(path, &[("project_id", scope.id.as_str())], key).await
        }
        _ => client.list(path, &[], key).await,
    }
}

/// Fields every OpenStack listing shares, under their per-service spellings.
#[derive(Debug, Deserialize)]
pub(crate) struct RawCommon {
    #[serde(alias = "uuid")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    pub status: String,
    #[serde(default, alias = "os-vol-tenant-attr:tenant_id")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default, alias = "created", deserialize_with = "lenient_timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated", deserialize_with = "lenient_timestamp::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RawCommon {
    /// The owning tenant as reported by the service, if any.
    pub fn tenant(&self) -> Option<&str> {
        [self.tenant_id.as_deref(), self.project_id.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
    }

    /// Builds the normalized resource, resolving the owner through `names`
    /// and falling back to the session's own project.
    pub fn into_resource(self, names: &ScopeNames, session: &Session, details: ResourceDetails) -> Resource {
        let (project_id, project_name) = names.attribute(self.tenant(), session.scope());
        Resource {
            id: self.id,
            name: self.name,
            project_id,
            project_name,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            details,
        }
    }
}

/// Memoized secondary lookups for one collector run.
#[derive(Debug, Default)]
pub(crate) struct LookupCache {
    server_names: HashMap<String, String>,
    flavor_names: HashMap<String, String>,
}

impl LookupCache {
    /// Resolves a server name, returning the raw id when the lookup fails.
    pub async fn server_name(&mut self, session: &Session, server_id: &str) -> String {
        if let Some(name) = self.server_names.get(server_id) {
            return name.clone();
        }

        #[derive(Deserialize)]
        struct ServerEnvelope {
            server: ServerName,
        }
        #[derive(Deserialize)]
        struct ServerName {
            #[serde(default, deserialize_with = "string_or_null::deserialize")]
            name: String,
        }

        let path = format!("servers/{}", server_id);
        let name = match session.compute.get::<ServerEnvelope>(&path, &[]).await {
            Ok(envelope) if !envelope.server.name.is_empty() => envelope.server.name,
            Ok(_) => server_id.to_string(),
            Err(e) => {
                debug!(server_id, error = %e, "server name lookup failed");
                server_id.to_string()
            }
        };
        self.server_names.insert(server_id.to_string(), name.clone());
        name
    }

    /// Resolves a flavor name, returning the raw id when the lookup fails.
    pub async fn flavor_name(&mut self, session: &Session, flavor_id: &str) -> String {
        if let Some(name) = self.flavor_names.get(flavor_id) {
            return name.clone();
        }

        #[derive(Deserialize)]
        struct FlavorEnvelope {
            flavor: FlavorName,
        }
        #[derive(Deserialize)]
        struct FlavorName {
            name: String,
        }

        let path = format!("flavors/{}", flavor_id);
        let name = match session.compute.get::<FlavorEnvelope>(&path, &[]).await {
            Ok(envelope) => envelope.flavor.name,
            Err(e) => {
                debug!(flavor_id, error = %e, "flavor lookup failed");
                flavor_id.to_string()
            }
        };
        self.flavor_names.insert(flavor_id.to_string(), name.clone());
        name
    }
}
