use super::{LookupCache, RawCommon, ResourceCollector, Tenancy, list_for_session};
use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{Resource, ResourceDetails, ResourceType, ServerProperties, UNKNOWN},
            scope::ScopeNames,
        },
    },
    infrastructure::session::Session,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Compute instances, with flavor names resolved.
pub struct ServerCollector;

#[derive(Deserialize)]
struct RawServer {
    #[serde(flatten)]
    common: RawCommon,
    #[serde(default)]
    flavor: Value,
    #[serde(default)]
    addresses: Value,
}

/// The two shapes Nova uses for `flavor`: a reference (`{"id": ...}`) before
/// microversion 2.47, an embedded copy (`{"original_name": ...}`) after.
#[derive(Debug, PartialEq, Eq)]
enum FlavorRef {
    Embedded { name: String, id: String },
    Reference(String),
    Missing,
}

impl FlavorRef {
    fn decode(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match (field("original_name"), field("id")) {
            (Some(name), id) => FlavorRef::Embedded {
                name,
                id: id.unwrap_or_default(),
            },
            (None, Some(id)) => FlavorRef::Reference(id),
            (None, None) => FlavorRef::Missing,
        }
    }
}

/// First address per network; malformed entries are skipped.
fn decode_networks(addresses: &Value) -> BTreeMap<String, String> {
    addresses
        .as_object()
        .map(|networks| {
            networks
                .iter()
                .filter_map(|(network, entries)| {
                    let addr = entries.as_array()?.first()?.get("addr")?.as_str()?;
                    Some((network.clone(), addr.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ResourceCollector for ServerCollector {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Server
    }

    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>> {
        let raw: Vec<RawServer> = list_for_session(
            &session.compute,
            session,
            Tenancy::AllTenantsFlag,
            "servers/detail",
            "servers",
        )
        .await?;

        let mut cache = LookupCache::default();
        let mut resources = Vec::with_capacity(raw.len());
        for server in raw {
            let (flavor_name, flavor_id) = match FlavorRef::decode(&server.flavor) {
                FlavorRef::Embedded { name, id } => (name, id),
                FlavorRef::Reference(id) => (cache.flavor_name(session, &id).await, id),
                FlavorRef::Missing => (UNKNOWN.to_string(), String::new()),
            };
            let details = ResourceDetails::Server(ServerProperties {
                flavor_name,
                flavor_id,
                networks: decode_networks(&server.addresses),
            });
            resources.push(server.common.into_resource(names, session, details));
        }
        Ok(resources)
    }
}
