//! Authenticated, scope-bound sessions and the factory that creates them.

use crate::{
    auth::application::{request::token_request::ScopeTarget, response::token_response::ScopedProject},
    core::{
        domain::{
            error::{OpenStackError, OpenStackResult},
            model::{
                inventory_config::InventoryConfig,
                scope::Scope,
                service_catalog::{ServiceCatalog, ServiceKind},
            },
        },
        infrastructure::api_client::{ApiClient, ServiceClient, build_rate_limiter},
    },
};
use governor::DefaultDirectRateLimiter;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// How collectors list resources through a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    /// Only the session's own project is requested.
    Scoped,
    /// One shared session for every project: ask for all tenants first and
    /// fall back to the session's project when that is refused.
    AllTenants,
}

/// Sub-clients for one authenticated scope.
///
/// Load balancing and container orchestration are optional capabilities and
/// are `None` when the catalog does not offer them.
#[derive(Debug, Clone)]
pub struct Session {
    pub compute: ServiceClient,
    pub block_storage: ServiceClient,
    pub network: ServiceClient,
    pub identity: ServiceClient,
    pub load_balancer: Option<ServiceClient>,
    pub container_infra: Option<ServiceClient>,
    scope: Scope,
    mode: ListingMode,
}

impl Session {
    /// The project this session is authenticated into.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn mode(&self) -> ListingMode {
        self.mode
    }
}

/// Creates sessions that share one HTTP client and one request limiter.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    config: Arc<InventoryConfig>,
    http_client: Client,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl SessionFactory {
    /// Builds the shared transport. TLS validation is only disabled when the
    /// configuration explicitly asks for it.
    pub fn new(config: InventoryConfig) -> OpenStackResult<Self> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(config.insecure())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| OpenStackError::Connection(e.to_string()))?;
        let rate_limiter = build_rate_limiter(config.rate_limit());

        Ok(Self {
            config: Arc::new(config),
            http_client,
            rate_limiter,
        })
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Scope target for single-scope mode (the configured project name).
    pub fn configured_target(&self) -> Option<ScopeTarget> {
        self.config.project_name().map(|name| ScopeTarget::ProjectName {
            name: name.to_string(),
            domain: self.config.project_domain().as_str().to_string(),
        })
    }

    /// Scope target for the inferred current project.
    pub fn default_target(&self) -> ScopeTarget {
        match self.config.project_id() {
            Some(id) => ScopeTarget::ProjectId(id.to_string()),
            None => ScopeTarget::Default,
        }
    }

    /// Scope target for domain-wide project discovery.
    pub fn domain_target(&self) -> ScopeTarget {
        ScopeTarget::Domain(self.config.user_domain().as_str().to_string())
    }

    fn api_client(&self, target: ScopeTarget) -> Arc<ApiClient> {
        Arc::new(ApiClient::new(
            self.http_client.clone(),
            Arc::clone(&self.config),
            target,
            self.rate_limiter.clone(),
        ))
    }

    /// Authenticates a session into `target`.
    ///
    /// `fallback` names the session's scope when the token does not carry a
    /// project. Authentication failure is returned to the caller, which
    /// decides whether it is fatal.
    pub async fn new_session(
        &self,
        target: ScopeTarget,
        fallback: &Scope,
        mode: ListingMode,
    ) -> OpenStackResult<Session> {
        let api = self.api_client(target);
        let issued = api.authenticate().await?;
        let scope = token_scope(issued.project.as_ref(), fallback);

        let catalog = &issued.catalog;
        let session = Session {
            compute: self.required(&api, catalog, ServiceKind::Compute)?,
            block_storage: self.required(&api, catalog, ServiceKind::BlockStorage)?,
            network: self.required(&api, catalog, ServiceKind::Network)?,
            identity: self.identity(&api, catalog)?,
            load_balancer: self.optional(&api, catalog, ServiceKind::LoadBalancer),
            container_infra: self.optional(&api, catalog, ServiceKind::ContainerInfra),
            scope,
            mode,
        };

        info!(
            project = %session.scope.name,
            load_balancer = session.load_balancer.is_some(),
            container_infra = session.container_infra.is_some(),
            "session established"
        );
        Ok(session)
    }

    /// Authenticates into `target` and returns the project the token is
    /// scoped to, without requiring any service from the catalog.
    pub async fn authenticated_scope(&self, target: ScopeTarget, fallback: &Scope) -> OpenStackResult<Scope> {
        let issued = self.api_client(target).authenticate().await?;
        Ok(token_scope(issued.project.as_ref(), fallback))
    }

    /// Authenticates an identity-only client, used for project discovery.
    pub async fn identity_client(&self, target: ScopeTarget) -> OpenStackResult<ServiceClient> {
        let api = self.api_client(target);
        let issued = api.authenticate().await?;
        self.identity(&api, &issued.catalog)
    }

    fn endpoint(&self, catalog: &ServiceCatalog, kind: ServiceKind) -> OpenStackResult<Url> {
        catalog.endpoint(kind, self.config.interface(), self.config.region())
    }

    fn required(
        &self,
        api: &Arc<ApiClient>,
        catalog: &ServiceCatalog,
        kind: ServiceKind,
    ) -> OpenStackResult<ServiceClient> {
        let base = self.endpoint(catalog, kind)?;
        Ok(ServiceClient::new(Arc::clone(api), kind, base))
    }

    fn optional(
        &self,
        api: &Arc<ApiClient>,
        catalog: &ServiceCatalog,
        kind: ServiceKind,
    ) -> Option<ServiceClient> {
        match self.endpoint(catalog, kind) {
            Ok(base) => Some(ServiceClient::new(Arc::clone(api), kind, base)),
            Err(e) => {
                debug!(service = %kind, error = %e, "optional capability unavailable");
                None
            }
        }
    }

    /// Identity is looked up in the catalog, falling back to the auth URL.
    fn identity(&self, api: &Arc<ApiClient>, catalog: &ServiceCatalog) -> OpenStackResult<ServiceClient> {
        let base = match self.endpoint(catalog, ServiceKind::Identity) {
            Ok(base) => base,
            Err(_) => {
                let root = format!("{}/", self.config.auth_url().v3_root());
                Url::parse(&root).map_err(|e| OpenStackError::Catalog(e.to_string()))?
            }
        };
        Ok(ServiceClient::new(Arc::clone(api), ServiceKind::Identity, base))
    }
}

/// The token's project, keeping what `fallback` knows about it when the ids match.
fn token_scope(project: Option<&ScopedProject>, fallback: &Scope) -> Scope {
    match project {
        Some(project) if project.id == fallback.id => Scope {
            name: project.name.clone(),
            ..fallback.clone()
        },
        Some(project) => Scope::new(project.id.clone(), project.name.clone()),
        None => fallback.clone(),
    }
}
