//! Domain models for collected resources.
//!
//! Every collected item is normalized into a [`Resource`]. The type-specific
//! payload lives in [`ResourceDetails`], an adjacently tagged enum flattened
//! into the resource, so the JSON keeps the `type` + `properties` shape while
//! the type and the payload can never disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder shown for resources without a display name.
pub const UNNAMED: &str = "unnamed";

/// Default used when a loosely typed API field is missing or malformed.
pub const UNKNOWN: &str = "Unknown";

/// The closed set of resource types the engine collects.
///
/// The declaration order is the collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Server,
    Volume,
    FloatingIp,
    Router,
    Network,
    LoadBalancer,
    VpnConnection,
    Cluster,
}

impl ResourceType {
    /// All types, in collection order.
    pub const ALL: [ResourceType; 8] = [
        ResourceType::Server,
        ResourceType::Volume,
        ResourceType::FloatingIp,
        ResourceType::Router,
        ResourceType::Network,
        ResourceType::LoadBalancer,
        ResourceType::VpnConnection,
        ResourceType::Cluster,
    ];

    /// Singular tag used in the report (`"server"`, `"floating_ip"`, ...).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Server => "server",
            ResourceType::Volume => "volume",
            ResourceType::FloatingIp => "floating_ip",
            ResourceType::Router => "router",
            ResourceType::Network => "network",
            ResourceType::LoadBalancer => "load_balancer",
            ResourceType::VpnConnection => "vpn_connection",
            ResourceType::Cluster => "cluster",
        }
    }

    /// Plural tag used in progress events (`"servers"`, `"floating_ips"`, ...).
    #[must_use]
    pub fn collection_name(&self) -> &'static str {
        match self {
            ResourceType::Server => "servers",
            ResourceType::Volume => "volumes",
            ResourceType::FloatingIp => "floating_ips",
            ResourceType::Router => "routers",
            ResourceType::Network => "networks",
            ResourceType::LoadBalancer => "load_balancers",
            ResourceType::VpnConnection => "vpn_connections",
            ResourceType::Cluster => "k8s_clusters",
        }
    }

    /// Human label used in progress messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Server => "servers",
            ResourceType::Volume => "volumes",
            ResourceType::FloatingIp => "floating IPs",
            ResourceType::Router => "routers",
            ResourceType::Network => "networks",
            ResourceType::LoadBalancer => "load balancers",
            ResourceType::VpnConnection => "VPN connections",
            ResourceType::Cluster => "K8s clusters",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized resource discovered in one project.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Resource {
    /// Identifier, unique within its type and project.
    pub id: String,
    /// Display name as reported by the service (may be empty).
    #[serde(default)]
    pub name: String,
    /// Owning project id.
    pub project_id: String,
    /// Owning project name.
    pub project_name: String,
    /// Free-text lifecycle state reported by the service.
    #[serde(default)]
    pub status: String,
    /// Creation time, `None` when the service does not expose it.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time, `None` when the service does not expose it.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Type tag and type-specific payload.
    #[serde(flatten)]
    pub details: ResourceDetails,
}

impl Resource {
    /// The resource type, derived from the payload.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.details.resource_type()
    }

    /// The name to render, `"unnamed"` when empty.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNNAMED
        } else {
            &self.name
        }
    }
}

/// Type-specific payload of a [`Resource`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "properties", rename_all = "snake_case")]
pub enum ResourceDetails {
    Server(ServerProperties),
    Volume(VolumeProperties),
    FloatingIp(FloatingIpProperties),
    Router(RouterProperties),
    Network(NetworkProperties),
    LoadBalancer(LoadBalancerProperties),
    VpnConnection(VpnConnectionProperties),
    Cluster(ClusterProperties),
}

impl ResourceDetails {
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceDetails::Server(_) => ResourceType::Server,
            ResourceDetails::Volume(_) => ResourceType::Volume,
            ResourceDetails::FloatingIp(_) => ResourceType::FloatingIp,
            ResourceDetails::Router(_) => ResourceType::Router,
            ResourceDetails::Network(_) => ResourceType::Network,
            ResourceDetails::LoadBalancer(_) => ResourceType::LoadBalancer,
            ResourceDetails::VpnConnection(_) => ResourceType::VpnConnection,
            ResourceDetails::Cluster(_) => ResourceType::Cluster,
        }
    }
}

/// A compute instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerProperties {
    /// Flavor name, `"Unknown"` when it cannot be decoded.
    pub flavor_name: String,
    /// Flavor id (empty when the API only exposes the embedded flavor).
    #[serde(default)]
    pub flavor_id: String,
    /// Network name to first address.
    #[serde(default)]
    pub networks: BTreeMap<String, String>,
}

/// A block storage volume.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VolumeProperties {
    /// Size in GiB.
    pub size: u64,
    #[serde(default)]
    pub volume_type: String,
    #[serde(default)]
    pub bootable: bool,
    /// Attachments in the order the service lists them.
    #[serde(default)]
    pub attachments: Vec<VolumeAttachment>,
    /// Display value for the first attachment (server name, or its raw id).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attached_to: String,
}

/// One attachment of a volume to a server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VolumeAttachment {
    pub server_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device: String,
}

/// A floating IP.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FloatingIpProperties {
    pub floating_ip_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fixed_ip_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub port_id: String,
    pub floating_network_id: String,
    /// Name of whatever owns the bound port.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attached_resource_name: String,
}

/// A router.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouterProperties {
    pub admin_state_up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_gateway: Option<ExternalGateway>,
    #[serde(default)]
    pub routes: Vec<StaticRoute>,
}

/// External gateway of a router.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExternalGateway {
    pub network_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_snat: Option<bool>,
    #[serde(default)]
    pub external_fixed_ips: Vec<FixedIp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FixedIp {
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub ip_address: String,
}

/// A static route on a router.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticRoute {
    pub destination: String,
    pub nexthop: String,
}

/// A network with its subnets.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkProperties {
    pub admin_state_up: bool,
    pub shared: bool,
    pub external: bool,
    /// Provider network type, `"Unknown"` when not visible to the caller.
    pub network_type: String,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subnet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub cidr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gateway_ip: String,
}

/// An Octavia load balancer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoadBalancerProperties {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub vip_address: String,
    pub vip_subnet_id: String,
    pub provisioning_status: String,
    pub operating_status: String,
}

/// An IPsec site connection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VpnConnectionProperties {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub peer_address: String,
    pub peer_id: String,
    pub auth_mode: String,
    pub mtu: u32,
    /// Parent VPN service.
    pub vpnservice_id: String,
}

/// A container orchestration (Magnum) cluster.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterProperties {
    pub cluster_template_id: String,
    pub node_count: u32,
    pub master_count: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keypair: String,
}
