use super::{RawCommon, ResourceCollector, Tenancy, list_for_session};
use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{ExternalGateway, Resource, ResourceDetails, ResourceType, RouterProperties, StaticRoute},
            scope::ScopeNames,
        },
    },
    infrastructure::session::Session,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub struct RouterCollector;

#[derive(Deserialize)]
struct RawRouter {
    #[serde(flatten)]
    common: RawCommon,
    #[serde(default = "admin_up")]
    admin_state_up: bool,
    #[serde(default)]
    external_gateway_info: Value,
    #[serde(default)]
    routes: Value,
}

fn admin_up() -> bool {
    true
}

/// `null`, `{}` and malformed gateway info all mean "no gateway".
fn decode_gateway(value: Value) -> Option<ExternalGateway> {
    serde_json::from_value::<ExternalGateway>(value)
        .ok()
        .filter(|gw| !gw.network_id.is_empty())
}

fn decode_routes(value: Value) -> Vec<StaticRoute> {
    serde_json::from_value(value).unwrap_or_default()
}

#[async_trait]
impl ResourceCollector for RouterCollector {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Router
    }

    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>> {
        let raw: Vec<RawRouter> =
            list_for_session(&session.network, session, Tenancy::ProjectFilter, "routers", "routers").await?;

        Ok(raw
            .into_iter()
            .map(|router| {
                let details = ResourceDetails::Router(RouterProperties {
                    admin_state_up: router.admin_state_up,
                    external_gateway: decode_gateway(router.external_gateway_info),
                    routes: decode_routes(router.routes),
                });
                router.common.into_resource(names, session, details)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_gateway() {
        let gw = decode_gateway(json!({
            "network_id": "ext-net",
            "enable_snat": true,
            "external_fixed_ips": [{"subnet_id": "sn-1", "ip_address": "203.0.113.10"}]
        }))
        .unwrap();
        assert_eq!(gw.network_id, "ext-net");
        assert_eq!(gw.enable_snat, Some(true));
        assert_eq!(gw.external_fixed_ips[0].ip_address, "203.0.113.10");

        assert!(decode_gateway(Value::Null).is_none());
        assert!(decode_gateway(json!({})).is_none());
    }

    #[test]
    fn test_decode_routes() {
        let routes = decode_routes(json!([{"destination": "10.1.0.0/16", "nexthop": "10.0.0.1"}]));
        assert_eq!(routes.len(), 1);
        assert!(decode_routes(Value::Null).is_empty());
    }
}
