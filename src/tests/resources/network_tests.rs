use crate::{
    ResourceDetails, Scope,
    core::domain::model::scope::ScopeNames,
    inventory::application::collector::{
        FloatingIpCollector, NetworkCollector, ResourceCollector, RouterCollector, VpnConnectionCollector,
    },
    tests::support::{MockCloud, router},
};
use serde_json::{Value, json};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn names() -> ScopeNames {
    ScopeNames::from_scopes([&Scope::new("a-id", "alpha")])
}

fn floating_ip(id: &str, address: &str, port_id: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": null,
        "status": "ACTIVE",
        "tenant_id": "a-id",
        "project_id": "a-id",
        "floating_ip_address": address,
        "fixed_ip_address": port_id.map(|_| "10.0.0.5"),
        "port_id": port_id,
        "floating_network_id": "ext-net",
        "created_at": "2024-05-01T10:00:00Z"
    })
}

async fn mount_port(cloud: &MockCloud, id: &str, device_id: &str, device_owner: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/network/v2.0/ports/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "port": {"id": id, "device_id": device_id, "device_owner": device_owner}
        })))
        .mount(&cloud.server)
        .await;
}

#[tokio::test]
async fn test_floating_ips_resolve_port_owners() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;
    cloud
        .mount_listing(
            "/network/v2.0/floatingips",
            Some(("project_id", "a-id")),
            "floatingips",
            &[
                floating_ip("f-1", "203.0.113.10", Some("port-vm")),
                floating_ip("f-2", "203.0.113.11", Some("port-lb")),
                floating_ip("f-3", "203.0.113.12", Some("port-gone")),
                floating_ip("f-4", "203.0.113.13", None),
            ],
            false,
        )
        .await;
    mount_port(&cloud, "port-vm", "s-1", "compute:nova").await;
    mount_port(&cloud, "port-lb", "lb-1", "Octavia").await;
    Mock::given(method("GET"))
        .and(path("/compute/a-id/servers/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"server": {"id": "s-1", "name": "web"}})))
        .expect(1)
        .mount(&cloud.server)
        .await;

    let fips = FloatingIpCollector.collect(&session, &names()).await.unwrap();

    let attached: Vec<String> = fips
        .iter()
        .map(|r| match &r.details {
            ResourceDetails::FloatingIp(props) => props.attached_resource_name.clone(),
            other => panic!("Expected floating IP, got {:?}", other),
        })
        .collect();
    assert_eq!(attached, vec!["web", "lb-1", "port-gone", ""]);
    assert_eq!(fips[0].name, "203.0.113.10");
    assert_eq!(fips[0].project_name, "alpha");
}

#[tokio::test]
async fn test_router_gateway_and_routes() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;
    let mut edge = router("r-1", "edge", "a-id");
    edge["external_gateway_info"] = json!({
        "network_id": "ext-net",
        "enable_snat": false,
        "external_fixed_ips": [{"subnet_id": "sn-ext", "ip_address": "203.0.113.1"}]
    });
    edge["routes"] = json!([{"destination": "10.1.0.0/16", "nexthop": "10.0.0.254"}]);
    let mut internal = router("r-2", "internal", "a-id");
    internal["external_gateway_info"] = json!({});
    internal.as_object_mut().unwrap().remove("admin_state_up");

    cloud
        .mount_listing(
            "/network/v2.0/routers",
            Some(("project_id", "a-id")),
            "routers",
            &[edge, internal],
            false,
        )
        .await;

    let routers = RouterCollector.collect(&session, &names()).await.unwrap();
    assert_eq!(routers.len(), 2);

    match &routers[0].details {
        ResourceDetails::Router(props) => {
            let gw = props.external_gateway.as_ref().unwrap();
            assert_eq!(gw.network_id, "ext-net");
            assert_eq!(gw.enable_snat, Some(false));
            assert_eq!(props.routes[0].nexthop, "10.0.0.254");
        }
        other => panic!("Expected router, got {:?}", other),
    }
    match &routers[1].details {
        ResourceDetails::Router(props) => {
            assert!(props.external_gateway.is_none());
            assert!(props.admin_state_up);
            assert!(props.routes.is_empty());
        }
        other => panic!("Expected router, got {:?}", other),
    }
}

#[tokio::test]
async fn test_networks_with_subnets() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;
    cloud
        .mount_listing(
            "/network/v2.0/networks",
            Some(("project_id", "a-id")),
            "networks",
            &[
                json!({
                    "id": "n-1", "name": "private", "status": "ACTIVE", "project_id": "a-id",
                    "admin_state_up": true, "shared": false,
                    "router:external": false, "provider:network_type": "vxlan"
                }),
                json!({
                    "id": "n-2", "name": "public", "status": "ACTIVE", "project_id": "a-id",
                    "admin_state_up": true, "shared": true, "router:external": true
                }),
            ],
            false,
        )
        .await;
    Mock::given(method("GET"))
        .and(path("/network/v2.0/subnets"))
        .and(query_param("network_id", "n-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"subnets": [
            {"id": "sn-1", "name": "private-v4", "cidr": "10.0.0.0/24", "gateway_ip": "10.0.0.1"},
            {"id": "sn-2", "name": null, "cidr": "fd00::/64", "gateway_ip": null}
        ]})))
        .mount(&cloud.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/network/v2.0/subnets"))
        .and(query_param("network_id", "n-2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&cloud.server)
        .await;

    let networks = NetworkCollector.collect(&session, &names()).await.unwrap();

    match &networks[0].details {
        ResourceDetails::Network(props) => {
            assert_eq!(props.network_type, "vxlan");
            assert!(!props.external);
            assert_eq!(props.subnets.len(), 2);
            assert_eq!(props.subnets[0].cidr, "10.0.0.0/24");
            assert_eq!(props.subnets[1].gateway_ip, "");
        }
        other => panic!("Expected network, got {:?}", other),
    }
    match &networks[1].details {
        ResourceDetails::Network(props) => {
            assert_eq!(props.network_type, "Unknown");
            assert!(props.external);
            assert!(props.shared);
            // A failed subnet lookup leaves the network in the report
            assert!(props.subnets.is_empty());
        }
        other => panic!("Expected network, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unnamed_vpn_connections_get_a_label() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;
    cloud
        .mount_listing(
            "/network/v2.0/vpn/ipsec-site-connections",
            Some(("project_id", "a-id")),
            "ipsec_site_connections",
            &[
                json!({
                    "id": "0123456789abcdef", "name": "", "status": "ACTIVE", "project_id": "a-id",
                    "peer_address": "198.51.100.7", "peer_id": "198.51.100.7",
                    "auth_mode": "psk", "mtu": 1500, "vpnservice_id": "vs-1"
                }),
                json!({"id": "fedcba98", "name": "branch-office", "status": "DOWN", "project_id": "a-id"}),
            ],
            false,
        )
        .await;

    let connections = VpnConnectionCollector.collect(&session, &names()).await.unwrap();

    assert_eq!(connections[0].name, "vpn-connection-01234567");
    assert_eq!(connections[1].name, "branch-office");
    match &connections[0].details {
        ResourceDetails::VpnConnection(props) => {
            assert_eq!(props.peer_address, "198.51.100.7");
            assert_eq!(props.mtu, 1500);
        }
        other => panic!("Expected VPN connection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_vpn_extension_is_an_error() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;
    Mock::given(method("GET"))
        .and(path("/network/v2.0/vpn/ipsec-site-connections"))
        .respond_with(ResponseTemplate::new(404).set_body_string("The resource could not be found."))
        .mount(&cloud.server)
        .await;

    let result = VpnConnectionCollector.collect(&session, &names()).await;
    assert!(matches!(result, Err(ref e) if e.is_status(404)));
}
