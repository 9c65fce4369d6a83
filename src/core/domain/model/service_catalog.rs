//! Service catalog returned with every Keystone token.

use crate::core::domain::error::{OpenStackError, OpenStackResult};
use serde::Deserialize;
use std::fmt;
use url::Url;

/// Control-plane capabilities the collectors talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Compute,
    BlockStorage,
    Network,
    Identity,
    LoadBalancer,
    ContainerInfra,
}

impl ServiceKind {
    /// Catalog `type` values accepted for this capability, in preference order.
    #[must_use]
    pub fn catalog_types(self) -> &'static [&'static str] {
        match self {
            ServiceKind::Compute => &["compute"],
            ServiceKind::BlockStorage => &["volumev3", "block-storage", "volumev2", "volume"],
            ServiceKind::Network => &["network"],
            ServiceKind::Identity => &["identity"],
            ServiceKind::LoadBalancer => &["load-balancer"],
            ServiceKind::ContainerInfra => &["container-infra"],
        }
    }

    /// Path segment the endpoint must end with. Compute and block storage
    /// catalog URLs already carry their version and project.
    #[must_use]
    pub fn version_suffix(self) -> Option<&'static str> {
        match self {
            ServiceKind::Network => Some("v2.0"),
            ServiceKind::Identity => Some("v3"),
            ServiceKind::LoadBalancer => Some("v2"),
            ServiceKind::ContainerInfra => Some("v1"),
            ServiceKind::Compute | ServiceKind::BlockStorage => None,
        }
    }

    /// Optional capabilities never fail a session when absent.
    #[must_use]
    pub fn is_optional(self) -> bool {
        matches!(self, ServiceKind::LoadBalancer | ServiceKind::ContainerInfra)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_types()[0])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEndpoint {
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog(Vec<CatalogEntry>);

impl ServiceCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self(entries)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Picks the endpoint for a capability, normalized so that relative paths
    /// can be joined onto it (trailing slash, version suffix present).
    pub fn endpoint(
        &self,
        kind: ServiceKind,
        interface: &str,
        region: Option<&str>,
    ) -> OpenStackResult<Url> {
        let raw = kind
            .catalog_types()
            .iter()
            .find_map(|service_type| {
                self.0
                    .iter()
                    .filter(|entry| entry.service_type == *service_type)
                    .flat_map(|entry| entry.endpoints.iter())
                    .find(|ep| {
                        ep.interface.eq_ignore_ascii_case(interface)
                            && region.is_none_or(|r| {
                                ep.region.as_deref() == Some(r) || ep.region_id.as_deref() == Some(r)
                            })
                    })
            })
            .ok_or_else(|| {
                OpenStackError::Catalog(format!(
                    "No {} endpoint for interface '{}'{}",
                    kind,
                    interface,
                    region.map(|r| format!(" in region '{}'", r)).unwrap_or_default()
                ))
            })?;

        normalize_endpoint(&raw.url, kind.version_suffix())
    }
}

fn normalize_endpoint(raw: &str, suffix: Option<&str>) -> OpenStackResult<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| OpenStackError::Catalog(format!("Invalid endpoint URL '{}': {}", raw, e)))?;

    let mut path = url.path().trim_end_matches('/').to_string();
    if let Some(suffix) = suffix {
        let has_suffix = path.rsplit('/').next().is_some_and(|last| last == suffix);
        if !has_suffix {
            path.push('/');
            path.push_str(suffix);
        }
    }
    path.push('/');
    url.set_path(&path);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> ServiceCatalog {
        serde_json::from_value(json!([
            {"type": "compute", "name": "nova", "endpoints": [
                {"interface": "internal", "region": "RegionOne", "url": "http://nova.internal/v2.1/p1"},
                {"interface": "public", "region": "RegionOne", "url": "https://nova.example.com/v2.1/p1"},
                {"interface": "public", "region": "RegionTwo", "url": "https://nova2.example.com/v2.1/p1"}
            ]},
            {"type": "volumev2", "endpoints": [
                {"interface": "public", "url": "https://cinder.example.com/v2/p1"}
            ]},
            {"type": "volumev3", "endpoints": [
                {"interface": "public", "url": "https://cinder.example.com/v3/p1"}
            ]},
            {"type": "network", "endpoints": [
                {"interface": "public", "region_id": "RegionOne", "url": "https://neutron.example.com:9696"}
            ]},
            {"type": "identity", "endpoints": [
                {"interface": "public", "url": "https://keystone.example.com:5000/v3/"}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_endpoint_selection() {
        let catalog = catalog();
        assert_eq!(
            catalog
                .endpoint(ServiceKind::Compute, "public", Some("RegionTwo"))
                .unwrap()
                .as_str(),
            "https://nova2.example.com/v2.1/p1/"
        );
        assert_eq!(
            catalog
                .endpoint(ServiceKind::Compute, "internal", None)
                .unwrap()
                .as_str(),
            "http://nova.internal/v2.1/p1/"
        );
        assert_eq!(
            catalog
                .endpoint(ServiceKind::BlockStorage, "public", None)
                .unwrap()
                .as_str(),
            "https://cinder.example.com/v3/p1/"
        );
    }

    #[test]
    fn test_version_suffix_appended_once() {
        let catalog = catalog();
        assert_eq!(
            catalog
                .endpoint(ServiceKind::Network, "public", Some("RegionOne"))
                .unwrap()
                .as_str(),
            "https://neutron.example.com:9696/v2.0/"
        );
        assert_eq!(
            catalog
                .endpoint(ServiceKind::Identity, "public", None)
                .unwrap()
                .as_str(),
            "https://keystone.example.com:5000/v3/"
        );
    }

    #[test]
    fn test_missing_service() {
        let result = catalog().endpoint(ServiceKind::LoadBalancer, "public", None);
        assert!(matches!(result, Err(OpenStackError::Catalog(_))));
        assert!(ServiceKind::LoadBalancer.is_optional());
        assert!(!ServiceKind::Compute.is_optional());
    }
}
