use super::{RawCommon, ResourceCollector, Tenancy, list_for_session};
use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{NetworkProperties, Resource, ResourceDetails, ResourceType, Subnet, UNKNOWN},
            scope::ScopeNames,
        },
        value_object::serde_helpers::string_or_null,
    },
    infrastructure::session::Session,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Networks with their subnets.
pub struct NetworkCollector;

#[derive(Deserialize)]
struct RawNetwork {
    #[serde(flatten)]
    common: RawCommon,
    #[serde(default)]
    admin_state_up: bool,
    #[serde(default)]
    shared: bool,
    #[serde(default, rename = "router:external")]
    external: bool,
    #[serde(default, rename = "provider:network_type")]
    network_type: Option<String>,
}

#[derive(Deserialize)]
struct RawSubnet {
    id: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    name: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    cidr: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    gateway_ip: String,
}

impl NetworkCollector {
    /// Subnets of one network; an empty list when the lookup fails.
    async fn subnets(session: &Session, network_id: &str) -> Vec<Subnet> {
        match session
            .network
            .list::<RawSubnet>("subnets", &[("network_id", network_id)], "subnets")
            .await
        {
            Ok(subnets) => subnets
                .into_iter()
                .map(|s| Subnet {
                    id: s.id,
                    name: s.name,
                    cidr: s.cidr,
                    gateway_ip: s.gateway_ip,
                })
                .collect(),
            Err(e) => {
                debug!(network_id, error = %e, "subnet lookup failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ResourceCollector for NetworkCollector {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Network
    }

    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>> {
        let raw: Vec<RawNetwork> =
            list_for_session(&session.network, session, Tenancy::ProjectFilter, "networks", "networks").await?;

        let mut resources = Vec::with_capacity(raw.len());
        for network in raw {
            let subnets = Self::subnets(session, &network.common.id).await;
            let details = ResourceDetails::Network(NetworkProperties {
                admin_state_up: network.admin_state_up,
                shared: network.shared,
                external: network.external,
                network_type: network
                    .network_type
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                subnets,
            });
            resources.push(network.common.into_resource(names, session, details));
        }
        Ok(resources)
    }
}
