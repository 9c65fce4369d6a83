use super::{RawCommon, ResourceCollector, Tenancy, list_for_session};
use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{LoadBalancerProperties, Resource, ResourceDetails, ResourceType},
            scope::ScopeNames,
        },
        value_object::serde_helpers::string_or_null,
    },
    infrastructure::session::Session,
};
use async_trait::async_trait;
use serde::Deserialize;

/// Octavia load balancers. Empty when the capability is unavailable.
pub struct LoadBalancerCollector;

#[derive(Deserialize)]
struct RawLoadBalancer {
    #[serde(flatten)]
    common: RawCommon,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    description: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    vip_address: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    vip_subnet_id: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    provisioning_status: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    operating_status: String,
}

#[async_trait]
impl ResourceCollector for LoadBalancerCollector {
    fn resource_type(&self) -> ResourceType {
        ResourceType::LoadBalancer
    }

    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>> {
        let Some(client) = &session.load_balancer else {
            return Ok(Vec::new());
        };
        let raw: Vec<RawLoadBalancer> =
            list_for_session(client, session, Tenancy::ProjectFilter, "lbaas/loadbalancers", "loadbalancers")
                .await?;

        Ok(raw
            .into_iter()
            .map(|mut lb| {
                // Octavia has no separate status field
                lb.common.status = lb.provisioning_status.clone();
                let details = ResourceDetails::LoadBalancer(LoadBalancerProperties {
                    description: lb.description,
                    vip_address: lb.vip_address,
                    vip_subnet_id: lb.vip_subnet_id,
                    provisioning_status: lb.provisioning_status,
                    operating_status: lb.operating_status,
                });
                lb.common.into_resource(names, session, details)
            })
            .collect())
    }
}
