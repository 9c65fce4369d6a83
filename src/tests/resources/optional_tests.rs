use crate::{
    ResourceDetails, Scope,
    core::domain::model::scope::ScopeNames,
    inventory::application::collector::{ClusterCollector, LoadBalancerCollector, ResourceCollector},
    tests::support::MockCloud,
};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn names() -> ScopeNames {
    ScopeNames::from_scopes([&Scope::new("a-id", "alpha")])
}

#[tokio::test]
async fn test_absent_capabilities_yield_nothing() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", false).await;

    assert!(session.load_balancer.is_none());
    assert!(session.container_infra.is_none());
    assert!(LoadBalancerCollector.collect(&session, &names()).await.unwrap().is_empty());
    assert!(ClusterCollector.collect(&session, &names()).await.unwrap().is_empty());

    // No listing was attempted against either service
    let requests = cloud.server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "POST"));
}

#[tokio::test]
async fn test_load_balancers_take_provisioning_status() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", true).await;
    Mock::given(method("GET"))
        .and(path("/lb/v2/lbaas/loadbalancers"))
        .and(query_param("project_id", "a-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"loadbalancers": [{
            "id": "lb-1",
            "name": "frontend",
            "project_id": "a-id",
            "description": "public entrypoint",
            "vip_address": "10.0.0.20",
            "vip_subnet_id": "sn-1",
            "provisioning_status": "ACTIVE",
            "operating_status": "ONLINE",
            "created_at": "2024-05-01T10:00:00"
        }]})))
        .mount(&cloud.server)
        .await;

    let lbs = LoadBalancerCollector.collect(&session, &names()).await.unwrap();

    assert_eq!(lbs.len(), 1);
    assert_eq!(lbs[0].status, "ACTIVE");
    assert!(lbs[0].created_at.is_some());
    match &lbs[0].details {
        ResourceDetails::LoadBalancer(props) => {
            assert_eq!(props.vip_address, "10.0.0.20");
            assert_eq!(props.operating_status, "ONLINE");
        }
        other => panic!("Expected load balancer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_clusters_listed_by_token_scope() {
    let cloud = MockCloud::start().await;
    let session = cloud.session("a-id", "alpha", true).await;
    Mock::given(method("GET"))
        .and(path("/magnum/v1/clusters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"clusters": [
            {
                "uuid": "c-1", "name": "k8s", "status": "CREATE_COMPLETE", "project_id": "a-id",
                "cluster_template_id": "tpl-1", "node_count": 3, "master_count": 1, "keypair": "ops"
            },
            {"uuid": "c-2", "name": "pending", "status": "CREATE_IN_PROGRESS", "node_count": null}
        ]})))
        .mount(&cloud.server)
        .await;

    let clusters = ClusterCollector.collect(&session, &names()).await.unwrap();

    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].id, "c-1");
    match &clusters[1].details {
        ResourceDetails::Cluster(props) => {
            assert_eq!(props.node_count, 0);
            assert_eq!(props.master_count, 0);
        }
        other => panic!("Expected cluster, got {:?}", other),
    }
    assert_eq!(clusters[1].project_name, "alpha");

    let requests = cloud.server.received_requests().await.unwrap();
    let listing = requests.iter().find(|r| r.url.path() == "/magnum/v1/clusters").unwrap();
    assert!(listing.url.query().is_none());
}
