//! Aggregates every collector over every resolved scope into a [`Report`].
//!
//! Collection is sequential: scopes one after another, and inside a scope
//! the resource types in their fixed order. A failing collector or scope is
//! recorded as a progress event and a log line, and the run continues.

use super::{
    progress_reporter::{Progress, ProgressReporter},
    scope_resolver::{ScopePlan, ScopeResolver},
};
use crate::{
    auth::application::request::token_request::ScopeTarget,
    core::{
        domain::{
            error::OpenStackResult,
            model::{
                progress::{ProgressEvent, ProgressKind},
                report::Report,
                resource::Resource,
                scope::{Scope, ScopeNames},
            },
        },
        infrastructure::{
            identity_cli::IdentityCli,
            session::{ListingMode, Session, SessionFactory},
        },
    },
    inventory::application::collector::{ResourceCollector, default_collectors},
};
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct ReportBuilder {
    factory: Arc<SessionFactory>,
    resolver: ScopeResolver,
    collectors: Vec<Box<dyn ResourceCollector>>,
}

impl ReportBuilder {
    pub fn new(factory: Arc<SessionFactory>, cli: Arc<dyn IdentityCli>) -> Self {
        Self {
            resolver: ScopeResolver::new(Arc::clone(&factory), cli),
            factory,
            collectors: default_collectors(),
        }
    }

    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// Runs a full collection.
    ///
    /// Cancellation is observed before each scope and each resource type; a
    /// request already in flight is allowed to finish and whatever was
    /// gathered so far is returned.
    ///
    /// # Errors
    ///
    /// * the configured project cannot be authenticated into
    /// * discovery failed and the shared session cannot be authenticated
    ///
    /// Projects that cannot be reached are reported as `ProjectError` events
    /// and stay in the report's scopes without resources.
    pub async fn build_report(
        &self,
        reporter: Option<&dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> OpenStackResult<Report> {
        let started = Utc::now();
        let progress = Progress::new(reporter);
        progress.emit(ProgressEvent::new(ProgressKind::Start, "Starting resource collection"));

        let (scopes, resources) = match self.resolver.plan().await? {
            ScopePlan::Single(session) => {
                progress.emit(ProgressEvent::new(
                    ProgressKind::Progress,
                    format!("Single project mode: {}", session.scope().name),
                ));
                self.collect_single(session, progress, cancel).await
            }
            ScopePlan::Shared(fallback) => {
                progress.emit(ProgressEvent::new(
                    ProgressKind::Progress,
                    "Project discovery failed, collecting through the current project",
                ));
                let session = self
                    .factory
                    .new_session(self.factory.default_target(), &fallback, ListingMode::AllTenants)
                    .await?;
                self.collect_single(session, progress, cancel).await
            }
            ScopePlan::PerScope(scopes) => {
                progress.emit(
                    ProgressEvent::new(
                        ProgressKind::Progress,
                        format!("Found {} projects, starting resource collection", scopes.len()),
                    )
                    .step(0, scopes.len()),
                );
                let resources = self.collect_per_scope(&scopes, progress, cancel).await;
                (scopes, resources)
            }
        };

        let report = Report::new(started, scopes, resources);
        let summary = report.summary();
        let total = report.scopes().len();
        progress.emit(
            ProgressEvent::new(
                ProgressKind::Summary,
                format!(
                    "Total {} resources collected from {} projects",
                    summary.total_resources(),
                    total
                ),
            )
            .step(total, total)
            .count(summary.total_resources())
            .summary(summary.by_type()),
        );
        info!(
            projects = total,
            resources = summary.total_resources(),
            cancelled = cancel.is_cancelled(),
            "report built"
        );
        Ok(report)
    }

    async fn collect_single(
        &self,
        session: Session,
        progress: Progress<'_>,
        cancel: &CancellationToken,
    ) -> (Vec<Scope>, Vec<Resource>) {
        let scope = session.scope().clone();
        let names = ScopeNames::from_scopes([&scope]);
        let resources = self
            .collect_scope(&session, &names, &scope.name, progress, cancel)
            .await;
        (vec![scope], resources)
    }

    async fn collect_per_scope(
        &self,
        scopes: &[Scope],
        progress: Progress<'_>,
        cancel: &CancellationToken,
    ) -> Vec<Resource> {
        let names = ScopeNames::from_scopes(scopes);
        let total = scopes.len();
        let mut resources = Vec::new();

        for (index, scope) in scopes.iter().enumerate() {
            let step = index + 1;
            if cancel.is_cancelled() {
                warn!(remaining = total - index, "collection cancelled");
                progress.emit(ProgressEvent::new(
                    ProgressKind::Progress,
                    "Collection cancelled, returning partial results",
                ));
                break;
            }
            progress.emit(
                ProgressEvent::new(
                    ProgressKind::ProjectStart,
                    format!("Collecting resources from project: {}", scope.name),
                )
                .step(step, total)
                .project(&scope.name),
            );

            // Disabled projects are tried too; Keystone decides
            let session = match self
                .factory
                .new_session(ScopeTarget::ProjectId(scope.id.clone()), scope, ListingMode::Scoped)
                .await
            {
                Ok(session) => session,
                Err(e) => {
                    warn!(project = %scope.name, error = %e, "skipping project without a session");
                    progress.emit(
                        ProgressEvent::new(
                            ProgressKind::ProjectError,
                            format!("Failed to get resources for project {}: {}", scope.name, e),
                        )
                        .step(step, total)
                        .project(&scope.name),
                    );
                    continue;
                }
            };

            let found = self
                .collect_scope(&session, &names, &scope.name, progress, cancel)
                .await;
            progress.emit(
                ProgressEvent::new(
                    ProgressKind::ProjectComplete,
                    format!("Found {} resources in project {}", found.len(), scope.name),
                )
                .step(step, total)
                .project(&scope.name)
                .count(found.len()),
            );
            resources.extend(found);
        }

        resources
    }

    /// Runs every collector against one session. Failures yield zero items.
    async fn collect_scope(
        &self,
        session: &Session,
        names: &ScopeNames,
        project: &str,
        progress: Progress<'_>,
        cancel: &CancellationToken,
    ) -> Vec<Resource> {
        let mut resources = Vec::new();

        for collector in &self.collectors {
            if cancel.is_cancelled() {
                warn!(project, "collection cancelled");
                break;
            }
            let kind = collector.resource_type();
            progress.emit(
                ProgressEvent::new(ProgressKind::ResourceStart, format!("Collecting {}", kind.label()))
                    .project(project)
                    .resource(kind),
            );

            match collector.collect(session, names).await {
                Ok(found) => {
                    progress.emit(
                        ProgressEvent::new(
                            ProgressKind::ResourceComplete,
                            format!("Collected {} {}", found.len(), kind.label()),
                        )
                        .project(project)
                        .resource(kind)
                        .count(found.len()),
                    );
                    resources.extend(found);
                }
                Err(e) => {
                    warn!(project, resource_type = %kind, error = %e, "collector failed");
                    progress.emit(
                        ProgressEvent::new(
                            ProgressKind::ResourceError,
                            format!("Failed to collect {}: {}", kind.label(), e),
                        )
                        .project(project)
                        .resource(kind),
                    );
                }
            }
        }
        resources
    }
}
