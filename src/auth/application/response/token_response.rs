use crate::core::domain::{
    model::service_catalog::ServiceCatalog, value_object::serde_helpers::lenient_timestamp,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: TokenBody,
}

#[derive(Debug, Deserialize)]
pub struct TokenBody {
    #[serde(default, with = "lenient_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Present only for project-scoped tokens.
    #[serde(default)]
    pub project: Option<ScopedProject>,
    /// Absent for unscoped tokens.
    #[serde(default)]
    pub catalog: ServiceCatalog,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScopedProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub domain: Option<DomainRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
