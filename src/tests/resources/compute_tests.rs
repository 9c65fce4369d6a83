use crate::{
    ResourceDetails, Scope,
    core::domain::model::scope::ScopeNames,
    inventory::application::collector::{ResourceCollector, ServerCollector, VolumeCollector},
    tests::support::{MockCloud, server, volume},
};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn names() -> ScopeNames {
    ScopeNames::from_scopes([&Scope::new("a-id", "alpha"), &Scope::new("b-id", "beta")])
}

#[tokio::test]
async fn test_servers_with_flavor_lookup() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;

    let mut by_reference = server("s-2", "legacy", "b-id");
    by_reference["flavor"] = json!({"id": "f-42", "links": []});
    let mut unknown_flavor = server("s-3", "odd", "zzz");
    unknown_flavor["flavor"] = json!(null);
    unknown_flavor["addresses"] = json!("garbage");
    let mut broken_reference = server("s-4", "orphan", "a-id");
    broken_reference["flavor"] = json!({"id": "f-gone"});

    cloud
        .mount_listing(
            "/compute/a-id/servers/detail",
            None,
            "servers",
            &[server("s-1", "web", "a-id"), by_reference, unknown_flavor, broken_reference],
            false,
        )
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/a-id/flavors/f-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"flavor": {"id": "f-42", "name": "m1.large"}})))
        .expect(1)
        .mount(&cloud.server)
        .await;

    let servers = ServerCollector.collect(&session, &names()).await.unwrap();
    assert_eq!(servers.len(), 4);

    let flavor = |i: usize| match &servers[i].details {
        ResourceDetails::Server(props) => (props.flavor_name.clone(), props.flavor_id.clone(), props.networks.len()),
        other => panic!("Expected server, got {:?}", other),
    };
    assert_eq!(flavor(0), ("m1.small".to_string(), String::new(), 1));
    assert_eq!(flavor(1), ("m1.large".to_string(), "f-42".to_string(), 1));
    assert_eq!(flavor(2), ("Unknown".to_string(), String::new(), 0));
    assert_eq!(flavor(3), ("f-gone".to_string(), "f-gone".to_string(), 1));

    assert_eq!(servers[0].project_name, "alpha");
    assert_eq!(servers[1].project_name, "beta");
    // Unknown tenants belong to the session's project
    assert_eq!(servers[2].project_id, "a-id");
    assert!(servers[0].created_at.is_some());
    assert_eq!(servers[0].status, "ACTIVE");
}

#[tokio::test]
async fn test_volume_attached_to_unresolvable_server_shows_raw_id() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;
    cloud
        .mount_listing(
            "/volume/a-id/volumes/detail",
            Some(("project_id", "a-id")),
            "volumes",
            &[
                volume("v-1", "a-id", Some("s1")),
                volume("v-2", "a-id", Some("s2")),
                volume("v-3", "a-id", None),
            ],
            false,
        )
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/a-id/servers/s1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Instance s1 could not be found."))
        .mount(&cloud.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/a-id/servers/s2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"server": {"id": "s2", "name": "web"}})))
        .mount(&cloud.server)
        .await;

    let volumes = VolumeCollector.collect(&session, &names()).await.unwrap();
    assert_eq!(volumes.len(), 3);

    let props = |i: usize| match &volumes[i].details {
        ResourceDetails::Volume(props) => props.clone(),
        other => panic!("Expected volume, got {:?}", other),
    };
    assert_eq!(props(0).attached_to, "s1");
    assert_eq!(props(0).attachments[0].server_name, "s1");
    assert_eq!(props(0).attachments[0].device, "/dev/vdb");
    assert_eq!(props(1).attached_to, "web");
    assert_eq!(props(2).attached_to, "");
    assert!(props(2).attachments.is_empty());
    assert!(!props(0).bootable);
    assert_eq!(props(0).size, 20);
    assert_eq!(volumes[0].status, "in-use");
}

#[tokio::test]
async fn test_refused_volume_filter_attributes_to_session_project() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;
    Mock::given(method("GET"))
        .and(path("/volume/a-id/volumes/detail"))
        .and(query_param("project_id", "a-id"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid filter keys: project_id"))
        .mount(&cloud.server)
        .await;
    cloud
        .mount_listing(
            "/volume/a-id/volumes/detail",
            None,
            "volumes",
            &[volume("v-1", "b-id", None)],
            false,
        )
        .await;

    let volumes = VolumeCollector.collect(&session, &names()).await.unwrap();

    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].project_id, "a-id");
    assert_eq!(volumes[0].project_name, "alpha");
}

#[tokio::test]
async fn test_server_listing_failure_is_an_error() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;
    cloud
        .mount_listing("/compute/a-id/servers/detail", None, "servers", &[], true)
        .await;

    let result = ServerCollector.collect(&session, &names()).await;
    assert!(matches!(result, Err(crate::OpenStackError::Api { status: 500, .. })));
}
