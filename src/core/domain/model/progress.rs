//! Progress events emitted while a report is being built.

use crate::core::domain::model::resource::ResourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle stage an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    Start,
    Progress,
    ResourceStart,
    ResourceComplete,
    ResourceError,
    ProjectStart,
    ProjectComplete,
    ProjectError,
    Complete,
    Error,
    Summary,
}

/// A purely observational status update.
///
/// Serializes to the flat shape server-push consumers expect
/// (`{"type": "resource_complete", "project": "alpha", ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub current_step: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_steps: usize,
    /// Name of the scope the event refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Plural resource tag (`"routers"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<BTreeMap<String, usize>>,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl ProgressEvent {
    pub fn new(kind: ProgressKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            current_step: 0,
            total_steps: 0,
            project: None,
            resource_type: None,
            count: 0,
            summary: None,
        }
    }

    #[must_use]
    pub fn step(mut self, current: usize, total: usize) -> Self {
        self.current_step = current;
        self.total_steps = total;
        self
    }

    #[must_use]
    pub fn project(mut self, name: impl Into<String>) -> Self {
        self.project = Some(name.into());
        self
    }

    #[must_use]
    pub fn resource(mut self, kind: ResourceType) -> Self {
        self.resource_type = Some(kind.collection_name().to_string());
        self
    }

    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: BTreeMap<String, usize>) -> Self {
        self.summary = Some(summary);
        self
    }

    /// True for events after which no further events follow.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, ProgressKind::Complete | ProgressKind::Error)
    }
}
