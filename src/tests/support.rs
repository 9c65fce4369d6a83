//! A wiremock stand-in for Keystone and the services of its catalog.

use crate::{
    InventoryConfig, InventoryConfigBuilder, OpenStackError, ResourceType, Scope,
    auth::application::request::token_request::ScopeTarget,
    core::infrastructure::{
        identity_cli::{IdentityCli, MockIdentityCli},
        session::{ListingMode, Session, SessionFactory},
    },
    inventory::application::service::report_builder::ReportBuilder,
};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path, query_param},
};

pub(crate) const TOKENS_PATH: &str = "/identity/v3/auth/tokens";

/// What one project exposes through its services.
#[derive(Debug, Default, Clone)]
pub(crate) struct ProjectData {
    pub servers: Vec<Value>,
    pub volumes: Vec<Value>,
    pub floating_ips: Vec<Value>,
    pub routers: Vec<Value>,
    pub networks: Vec<Value>,
    pub vpn_connections: Vec<Value>,
    /// Listings answered with `500`.
    pub failing: Vec<ResourceType>,
}

pub(crate) struct MockCloud {
    pub server: MockServer,
}

impl MockCloud {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self) -> InventoryConfigBuilder {
        InventoryConfig::builder()
            .auth_url(format!("{}/identity", self.uri()))
            .credentials("inventory", "s3cret")
    }

    pub fn factory(&self, builder: InventoryConfigBuilder) -> Arc<SessionFactory> {
        Arc::new(SessionFactory::new(builder.build().unwrap()).unwrap())
    }

    /// A report builder whose CLI fallback must not be reached.
    pub fn report_builder(&self, builder: InventoryConfigBuilder) -> ReportBuilder {
        ReportBuilder::new(self.factory(builder), Arc::new(MockIdentityCli::new()))
    }

    /// A report builder whose CLI fallback fails.
    pub fn report_builder_without_cli(&self, builder: InventoryConfigBuilder) -> ReportBuilder {
        ReportBuilder::new(self.factory(builder), failing_cli())
    }

    pub fn catalog(&self, project_id: &str, optional: bool) -> Value {
        let uri = self.uri();
        let mut catalog = vec![
            service("compute", format!("{}/compute/{}", uri, project_id)),
            service("volumev3", format!("{}/volume/{}", uri, project_id)),
            service("network", format!("{}/network", uri)),
            service("identity", format!("{}/identity/v3", uri)),
        ];
        if optional {
            catalog.push(service("load-balancer", format!("{}/lb", uri)));
            catalog.push(service("container-infra", format!("{}/magnum", uri)));
        }
        Value::Array(catalog)
    }

    /// Tokens scoped to the project with this id.
    pub async fn mount_project_token(&self, id: &str, name: &str, optional: bool) {
        Mock::given(method("POST"))
            .and(path(TOKENS_PATH))
            .and(body_partial_json(json!({"auth": {"scope": {"project": {"id": id}}}})))
            .respond_with(self.token_response(Some((id, name)), optional))
            .mount(&self.server)
            .await;
    }

    /// Tokens scoped to a project addressed by name.
    pub async fn mount_named_project_token(&self, id: &str, name: &str) {
        Mock::given(method("POST"))
            .and(path(TOKENS_PATH))
            .and(body_partial_json(json!({"auth": {"scope": {"project": {"name": name}}}})))
            .respond_with(self.token_response(Some((id, name)), false))
            .mount(&self.server)
            .await;
    }

    /// Domain-scoped tokens, used for project discovery.
    pub async fn mount_domain_token(&self) {
        Mock::given(method("POST"))
            .and(path(TOKENS_PATH))
            .and(body_partial_json(json!({"auth": {"scope": {"domain": {"name": "Default"}}}})))
            .respond_with(self.token_response(None, false))
            .mount(&self.server)
            .await;
    }

    /// Tokens for any request no other token mock claims.
    pub async fn mount_default_token(&self, project: Option<(&str, &str)>) {
        let catalog_id = project.map(|(id, _)| id).unwrap_or("default");
        Mock::given(method("POST"))
            .and(path(TOKENS_PATH))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Subject-Token", "tok-default")
                    .set_body_json(json!({"token": {
                        "expires_at": "2099-01-01T00:00:00.000000Z",
                        "project": project.map(|(id, name)| json!({"id": id, "name": name})),
                        "catalog": self.catalog(catalog_id, false),
                    }})),
            )
            .with_priority(10)
            .mount(&self.server)
            .await;
    }

    /// Rejects every token request not claimed by a more specific mock.
    pub async fn reject_other_tokens(&self) {
        Mock::given(method("POST"))
            .and(path(TOKENS_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("The request you have made requires authentication."))
            .with_priority(10)
            .mount(&self.server)
            .await;
    }

    fn token_response(&self, project: Option<(&str, &str)>, optional: bool) -> ResponseTemplate {
        let catalog_id = project.map(|(id, _)| id).unwrap_or("domain");
        ResponseTemplate::new(201)
            .insert_header("X-Subject-Token", format!("tok-{}", catalog_id))
            .set_body_json(json!({"token": {
                "expires_at": "2099-01-01T00:00:00.000000Z",
                "project": project.map(|(id, name)| json!({"id": id, "name": name, "domain": {"id": "default", "name": "Default"}})),
                "catalog": self.catalog(catalog_id, optional),
            }}))
    }

    /// A per-project session backed by this cloud.
    pub async fn session(&self, id: &str, name: &str, optional: bool) -> Session {
        self.mount_project_token(id, name, optional).await;
        self.factory(self.config())
            .new_session(
                ScopeTarget::ProjectId(id.to_string()),
                &Scope::new(id, name),
                ListingMode::Scoped,
            )
            .await
            .unwrap()
    }

    /// Keystone project listing answered to domain-scoped tokens.
    pub async fn mount_projects(&self, projects: Value) {
        Mock::given(method("GET"))
            .and(path("/identity/v3/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": projects,
                "links": {"self": format!("{}/identity/v3/projects", self.uri()), "next": null}
            })))
            .mount(&self.server)
            .await;
    }

    /// Token plus every listing of one project.
    pub async fn mount_project(&self, id: &str, name: &str, data: ProjectData) {
        self.mount_project_token(id, name, false).await;

        let compute = format!("/compute/{}/servers/detail", id);
        self.mount_listing(&compute, None, "servers", &data.servers, data.fails(ResourceType::Server))
            .await;
        let volume = format!("/volume/{}/volumes/detail", id);
        self.mount_listing(&volume, None, "volumes", &data.volumes, data.fails(ResourceType::Volume))
            .await;
        let scoped = Some(("project_id", id));
        self.mount_listing(
            "/network/v2.0/floatingips",
            scoped,
            "floatingips",
            &data.floating_ips,
            data.fails(ResourceType::FloatingIp),
        )
        .await;
        self.mount_listing("/network/v2.0/routers", scoped, "routers", &data.routers, data.fails(ResourceType::Router))
            .await;
        self.mount_listing(
            "/network/v2.0/networks",
            scoped,
            "networks",
            &data.networks,
            data.fails(ResourceType::Network),
        )
        .await;
        self.mount_listing(
            "/network/v2.0/vpn/ipsec-site-connections",
            scoped,
            "ipsec_site_connections",
            &data.vpn_connections,
            data.fails(ResourceType::VpnConnection),
        )
        .await;
    }

    pub async fn mount_listing(
        &self,
        at: &str,
        query: Option<(&str, &str)>,
        key: &str,
        items: &[Value],
        fail: bool,
    ) {
        let response = if fail {
            ResponseTemplate::new(500).set_body_string("internal error")
        } else {
            ResponseTemplate::new(200).set_body_json(json!({ key: items }))
        };
        let mock = Mock::given(method("GET")).and(path(at));
        let mock = match query {
            Some((name, value)) => mock.and(query_param(name, value)),
            None => mock,
        };
        mock.respond_with(response).mount(&self.server).await;
    }
}

impl ProjectData {
    fn fails(&self, kind: ResourceType) -> bool {
        self.failing.contains(&kind)
    }
}

fn service(kind: &str, url: String) -> Value {
    json!({
        "type": kind,
        "name": kind,
        "endpoints": [
            {"interface": "public", "region": "RegionOne", "region_id": "RegionOne", "url": url},
            {"interface": "internal", "region": "RegionOne", "region_id": "RegionOne", "url": "http://10.0.0.1:9999"}
        ]
    })
}

pub(crate) fn failing_cli() -> Arc<dyn IdentityCli> {
    let mut cli = MockIdentityCli::new();
    cli.expect_list_projects()
        .returning(|| Err(OpenStackError::Discovery("openstack: command not found".to_string())));
    Arc::new(cli)
}

pub(crate) fn server(id: &str, name: &str, tenant: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": "ACTIVE",
        "tenant_id": tenant,
        "created": "2024-05-01T10:00:00Z",
        "updated": "2024-05-02T10:00:00Z",
        "flavor": {"original_name": "m1.small", "vcpus": 1, "ram": 2048},
        "addresses": {"private": [{"addr": "10.0.0.5", "version": 4}]}
    })
}

pub(crate) fn volume(id: &str, tenant: &str, attached_server: Option<&str>) -> Value {
    let attachments: Vec<Value> = attached_server
        .map(|s| json!({"server_id": s, "device": "/dev/vdb"}))
        .into_iter()
        .collect();
    json!({
        "id": id,
        "name": format!("vol-{}", id),
        "status": if attachments.is_empty() { "available" } else { "in-use" },
        "os-vol-tenant-attr:tenant_id": tenant,
        "size": 20,
        "volume_type": "ssd",
        "bootable": "false",
        "attachments": attachments,
        "created_at": "2024-05-01T10:00:00.000000"
    })
}

pub(crate) fn router(id: &str, name: &str, tenant: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": "ACTIVE",
        "tenant_id": tenant,
        "project_id": tenant,
        "admin_state_up": true,
        "external_gateway_info": null,
        "routes": []
    })
}

pub(crate) fn project(id: &str, name: &str) -> Value {
    json!({"id": id, "name": name, "description": "", "domain_id": "default", "enabled": true})
}
