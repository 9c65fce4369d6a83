use super::{LookupCache, RawCommon, ResourceCollector, Tenancy, list_for_session};
use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{FloatingIpProperties, Resource, ResourceDetails, ResourceType},
            scope::ScopeNames,
        },
        value_object::serde_helpers::string_or_null,
    },
    infrastructure::session::Session,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Floating IPs, with the owner of the bound port resolved.
pub struct FloatingIpCollector;

#[derive(Deserialize)]
struct RawFloatingIp {
    #[serde(flatten)]
    common: RawCommon,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    floating_ip_address: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    fixed_ip_address: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    port_id: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    floating_network_id: String,
}

#[derive(Deserialize)]
struct PortEnvelope {
    port: RawPort,
}

#[derive(Deserialize)]
struct RawPort {
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    device_id: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    device_owner: String,
}

impl FloatingIpCollector {
    /// Compute-owned ports resolve to the server name, other owners to the
    /// device id. A failed port lookup shows the port id.
    async fn attached_resource_name(session: &Session, port_id: &str, cache: &mut LookupCache) -> String {
        if port_id.is_empty() {
            return String::new();
        }
        let path = format!("ports/{}", port_id);
        match session.network.get::<PortEnvelope>(&path, &[]).await {
            Ok(PortEnvelope { port }) if port.device_id.is_empty() => String::new(),
            Ok(PortEnvelope { port }) if port.device_owner.starts_with("compute:") => {
                cache.server_name(session, &port.device_id).await
            }
            Ok(PortEnvelope { port }) => port.device_id,
            Err(e) => {
                debug!(port_id, error = %e, "port lookup failed");
                port_id.to_string()
            }
        }
    }
}

#[async_trait]
impl ResourceCollector for FloatingIpCollector {
    fn resource_type(&self) -> ResourceType {
        ResourceType::FloatingIp
    }

    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>> {
        let raw: Vec<RawFloatingIp> =
            list_for_session(&session.network, session, Tenancy::ProjectFilter, "floatingips", "floatingips")
                .await?;

        let mut cache = LookupCache::default();
        let mut resources = Vec::with_capacity(raw.len());
        for mut fip in raw {
            let attached_resource_name = Self::attached_resource_name(session, &fip.port_id, &mut cache).await;
            // Floating IPs are named by their address
            if fip.common.name.is_empty() {
                fip.common.name = fip.floating_ip_address.clone();
            }
            let details = ResourceDetails::FloatingIp(FloatingIpProperties {
                floating_ip_address: fip.floating_ip_address,
                fixed_ip_address: fip.fixed_ip_address,
                port_id: fip.port_id,
                floating_network_id: fip.floating_network_id,
                attached_resource_name,
            });
            resources.push(fip.common.into_resource(names, session, details));
        }
        Ok(resources)
    }
}
