use super::{RawCommon, ResourceCollector, Tenancy, list_for_session};
use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{Resource, ResourceDetails, ResourceType, VpnConnectionProperties},
            scope::ScopeNames,
        },
        value_object::serde_helpers::string_or_null,
    },
    infrastructure::session::Session,
};
use async_trait::async_trait;
use serde::Deserialize;

/// IPsec site connections of the VPN-as-a-service extension.
pub struct VpnConnectionCollector;

#[derive(Deserialize)]
struct RawConnection {
    #[serde(flatten)]
    common: RawCommon,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    description: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    peer_address: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    peer_id: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    auth_mode: String,
    #[serde(default)]
    mtu: u32,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    vpnservice_id: String,
}

/// Unnamed connections are labelled from the first eight characters of their id.
fn fallback_name(id: &str) -> String {
    format!("vpn-connection-{}", id.chars().take(8).collect::<String>())
}

#[async_trait]
impl ResourceCollector for VpnConnectionCollector {
    fn resource_type(&self) -> ResourceType {
        ResourceType::VpnConnection
    }

    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>> {
        let raw: Vec<RawConnection> = list_for_session(
            &session.network,
            session,
            Tenancy::ProjectFilter,
            "vpn/ipsec-site-connections",
            "ipsec_site_connections",
        )
        .await?;

        Ok(raw
            .into_iter()
            .map(|mut conn| {
                if conn.common.name.trim().is_empty() {
                    conn.common.name = fallback_name(&conn.common.id);
                }
                let details = ResourceDetails::VpnConnection(VpnConnectionProperties {
                    description: conn.description,
                    peer_address: conn.peer_address,
                    peer_id: conn.peer_id,
                    auth_mode: conn.auth_mode,
                    mtu: conn.mtu,
                    vpnservice_id: conn.vpnservice_id,
                });
                conn.common.into_resource(names, session, details)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_name() {
        assert_eq!(
            fallback_name("0f3c9a2e-1111-2222-3333-444455556666"),
            "vpn-connection-0f3c9a2e"
        );
        assert_eq!(fallback_name("abc"), "vpn-connection-abc");
    }
}
