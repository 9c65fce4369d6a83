//! Tenant scopes (Keystone projects).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Id used for the synthetic scope when nothing better is known.
pub const CURRENT_SCOPE_ID: &str = "current-project";
/// Name used for the synthetic scope when nothing better is known.
pub const CURRENT_SCOPE_NAME: &str = "Current Project";

/// A project visible to the configured identity.
///
/// Scopes are discovered fresh on every collection and only persisted as
/// part of a report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Scope {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Scope {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            domain_id: None,
            enabled: true,
        }
    }

    /// The scope inferred from configuration when discovery is impossible.
    pub fn inferred(id: Option<&str>, name: Option<&str>) -> Self {
        let id = id.filter(|v| !v.trim().is_empty()).unwrap_or(CURRENT_SCOPE_ID);
        let name = name
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(CURRENT_SCOPE_NAME);
        Self {
            description: "Current working project".to_string(),
            ..Self::new(id, name)
        }
    }

    /// True for the synthetic placeholder scope.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.id == CURRENT_SCOPE_ID
    }
}

/// Lookup from project id to project name used to attribute resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeNames(HashMap<String, String>);

impl ScopeNames {
    pub fn from_scopes<'a>(scopes: impl IntoIterator<Item = &'a Scope>) -> Self {
        Self(
            scopes
                .into_iter()
                .map(|s| (s.id.clone(), s.name.clone()))
                .collect(),
        )
    }

    /// Resolves the owner of an item: the reported tenant when it is known,
    /// otherwise the fallback scope (normally the authenticated one).
    #[must_use]
    pub fn attribute(&self, tenant_id: Option<&str>, fallback: &Scope) -> (String, String) {
        match tenant_id.and_then(|id| self.0.get_key_value(id)) {
            Some((id, name)) if !name.is_empty() => (id.clone(), name.clone()),
            _ => (fallback.id.clone(), fallback.name.clone()),
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
