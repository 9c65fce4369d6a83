use crate::core::domain::model::inventory_config::InventoryConfig;
use serde::Serialize;

/// What a token is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeTarget {
    /// A project addressed by id.
    ProjectId(String),
    /// A project addressed by name within a domain.
    ProjectName { name: String, domain: String },
    /// A whole domain, used for project discovery.
    Domain(String),
    /// Whatever default project Keystone assigns to the user.
    Default,
}

impl ScopeTarget {
    /// Short human-readable form used in log lines.
    pub fn describe(&self) -> String {
        match self {
            ScopeTarget::ProjectId(id) => format!("project id {}", id),
            ScopeTarget::ProjectName { name, domain } => format!("project {} ({})", name, domain),
            ScopeTarget::Domain(name) => format!("domain {}", name),
            ScopeTarget::Default => "default scope".to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct TokenRequest<'a> {
    auth: AuthBody<'a>,
}

#[derive(Serialize)]
struct AuthBody<'a> {
    identity: Identity<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<ScopeBody<'a>>,
}

#[derive(Serialize)]
struct Identity<'a> {
    methods: [&'static str; 1],
    password: PasswordMethod<'a>,
}

#[derive(Serialize)]
struct PasswordMethod<'a> {
    user: UserBody<'a>,
}

#[derive(Serialize)]
struct UserBody<'a> {
    name: &'a str,
    domain: NamedRef<'a>,
    password: &'a str,
}

#[derive(Serialize)]
struct NamedRef<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum ScopeBody<'a> {
    Project(ProjectRef<'a>),
    Domain(NamedRef<'a>),
}

#[derive(Serialize)]
#[serde(untagged)]
enum ProjectRef<'a> {
    Id { id: &'a str },
    Name { name: &'a str, domain: NamedRef<'a> },
}

impl<'a> TokenRequest<'a> {
    /// Builds a password authentication body for the configured user.
    pub fn password(config: &'a InventoryConfig, target: &'a ScopeTarget) -> Self {
        let scope = match target {
            ScopeTarget::ProjectId(id) => Some(ScopeBody::Project(ProjectRef::Id { id })),
            ScopeTarget::ProjectName { name, domain } => Some(ScopeBody::Project(ProjectRef::Name {
                name,
                domain: NamedRef { name: domain },
            })),
            ScopeTarget::Domain(name) => Some(ScopeBody::Domain(NamedRef { name })),
            ScopeTarget::Default => None,
        };

        Self {
            auth: AuthBody {
                identity: Identity {
                    methods: ["password"],
                    password: PasswordMethod {
                        user: UserBody {
                            name: config.username().as_str(),
                            domain: NamedRef {
                                name: config.user_domain().as_str(),
                            },
                            password: config.password().as_str(),
                        },
                    },
                },
                scope,
            },
        }
    }
}
