use super::{RawCommon, ResourceCollector, Tenancy, list_for_session};
use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{ClusterProperties, Resource, ResourceDetails, ResourceType},
            scope::ScopeNames,
        },
        value_object::serde_helpers::string_or_null,
    },
    infrastructure::session::Session,
};
use async_trait::async_trait;
use serde::Deserialize;

/// Magnum container clusters. Empty when the capability is unavailable.
pub struct ClusterCollector;

#[derive(Deserialize)]
struct RawCluster {
    #[serde(flatten)]
    common: RawCommon,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    cluster_template_id: String,
    #[serde(default)]
    node_count: Option<u32>,
    #[serde(default)]
    master_count: Option<u32>,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    keypair: String,
}

#[async_trait]
impl ResourceCollector for ClusterCollector {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Cluster
    }

    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>> {
        let Some(client) = &session.container_infra else {
            return Ok(Vec::new());
        };
        let raw: Vec<RawCluster> =
            list_for_session(client, session, Tenancy::TokenOnly, "clusters", "clusters").await?;

        Ok(raw
            .into_iter()
            .map(|cluster| {
                let details = ResourceDetails::Cluster(ClusterProperties {
                    cluster_template_id: cluster.cluster_template_id,
                    node_count: cluster.node_count.unwrap_or(0),
                    master_count: cluster.master_count.unwrap_or(0),
                    keypair: cluster.keypair,
                });
                cluster.common.into_resource(names, session, details)
            })
            .collect())
    }
}
