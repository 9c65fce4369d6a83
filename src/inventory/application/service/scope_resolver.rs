//! Project discovery.
//!
//! Resolution stops at the first step that succeeds:
//!
//! 1. A configured project name: authenticate into it and use it alone.
//! 2. A domain-scoped token listing every project in the user's domain.
//! 3. The external identity CLI.
//! 4. The inferred current project, collected through one shared session.
//!
//! Discovery never fails the run. Only an unusable configured project does.

use crate::core::{
    domain::{
        error::{OpenStackError, OpenStackResult},
        model::scope::Scope,
        value_object::serde_helpers::string_or_null,
    },
    infrastructure::{
        identity_cli::IdentityCli,
        session::{ListingMode, Session, SessionFactory},
    },
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// How the report builder should walk the resolved scopes.
#[derive(Debug)]
pub enum ScopePlan {
    /// Explicitly configured project, already authenticated.
    Single(Session),
    /// Discovered projects, each collected through its own session.
    PerScope(Vec<Scope>),
    /// Discovery failed; one shared session lists every visible tenant.
    Shared(Scope),
}

impl ScopePlan {
    pub fn scopes(&self) -> Vec<Scope> {
        match self {
            ScopePlan::Single(session) => vec![session.scope().clone()],
            ScopePlan::PerScope(scopes) => scopes.clone(),
            ScopePlan::Shared(scope) => vec![scope.clone()],
        }
    }
}

#[derive(Deserialize)]
struct KeystoneProject {
    id: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    name: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    description: String,
    #[serde(default)]
    domain_id: Option<String>,
    #[serde(default = "enabled")]
    enabled: bool,
}

fn enabled() -> bool {
    true
}

impl From<KeystoneProject> for Scope {
    fn from(project: KeystoneProject) -> Self {
        Scope {
            id: project.id,
            name: project.name,
            description: project.description,
            domain_id: project.domain_id,
            enabled: project.enabled,
        }
    }
}

pub struct ScopeResolver {
    factory: Arc<SessionFactory>,
    cli: Arc<dyn IdentityCli>,
}

impl ScopeResolver {
    pub fn new(factory: Arc<SessionFactory>, cli: Arc<dyn IdentityCli>) -> Self {
        Self { factory, cli }
    }

    /// Lists the scopes a collection would cover.
    ///
    /// A configured project is resolved from its token alone, so a catalog
    /// missing collector services does not fail resolution.
    pub async fn resolve_scopes(&self) -> OpenStackResult<Vec<Scope>> {
        if let Some(target) = self.factory.configured_target() {
            let scope = self.factory.authenticated_scope(target, &self.configured_fallback()).await?;
            return Ok(vec![scope]);
        }
        Ok(self.plan().await?.scopes())
    }

    fn configured_fallback(&self) -> Scope {
        let config = self.factory.config();
        Scope::inferred(config.project_id(), config.project_name())
    }

    /// Resolves the scopes together with the way they must be collected.
    ///
    /// # Errors
    ///
    /// Only when a project name is configured and authenticating into it fails.
    pub async fn plan(&self) -> OpenStackResult<ScopePlan> {
        let config = self.factory.config();

        if let Some(target) = self.factory.configured_target() {
            let fallback = self.configured_fallback();
            info!(project = %fallback.name, "single project mode");
            let session = self
                .factory
                .new_session(target, &fallback, ListingMode::Scoped)
                .await?;
            return Ok(ScopePlan::Single(session));
        }

        match self.discover_via_identity().await {
            Ok(scopes) => {
                info!(count = scopes.len(), "projects discovered through identity API");
                return Ok(ScopePlan::PerScope(scopes));
            }
            Err(e) => warn!(error = %e, "identity API project listing failed, trying CLI"),
        }

        match self.discover_via_cli().await {
            Ok(scopes) => {
                info!(count = scopes.len(), "projects discovered through identity CLI");
                return Ok(ScopePlan::PerScope(scopes));
            }
            Err(e) => warn!(error = %e, "CLI project listing failed, using current project"),
        }

        Ok(ScopePlan::Shared(Scope::inferred(config.project_id(), None)))
    }

    async fn discover_via_identity(&self) -> OpenStackResult<Vec<Scope>> {
        let identity = self
            .factory
            .identity_client(self.factory.domain_target())
            .await?;
        let projects: Vec<KeystoneProject> = identity.list("projects", &[], "projects").await?;
        non_empty(projects.into_iter().map(Scope::from).collect(), "identity API")
    }

    async fn discover_via_cli(&self) -> OpenStackResult<Vec<Scope>> {
        let scopes = self.cli.list_projects().await?;
        non_empty(scopes, "identity CLI")
    }
}

fn non_empty(scopes: Vec<Scope>, source: &str) -> OpenStackResult<Vec<Scope>> {
    if scopes.is_empty() {
        Err(OpenStackError::Discovery(format!("{} returned no projects", source)))
    } else {
        Ok(scopes)
    }
}
