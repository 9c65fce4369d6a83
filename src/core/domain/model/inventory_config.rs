//! Connection and collection settings.

use crate::core::domain::{
    error::{OpenStackResult, ValidationError},
    value_object::{AuthUrl, DomainName, Password, Username, validate_name},
};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_INTERFACE: &str = "public";
const DEFAULT_CLI_COMMAND: &str = "openstack";

/// Client-side request throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Everything the engine needs to authenticate and collect.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    auth_url: AuthUrl,
    username: Username,
    password: Password,
    user_domain: DomainName,
    project_domain: DomainName,
    project_name: Option<String>,
    project_id: Option<String>,
    region: Option<String>,
    interface: String,
    insecure: bool,
    cli_command: String,
    request_timeout: Duration,
    rate_limit: Option<RateLimitConfig>,
}

impl InventoryConfig {
    pub fn builder() -> InventoryConfigBuilder {
        InventoryConfigBuilder::default()
    }

    /// Reads the usual `OS_*` variables from the process environment.
    pub fn from_env() -> OpenStackResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the `OS_*` settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> OpenStackResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder()
            .auth_url(get("OS_AUTH_URL").unwrap_or_default())
            .credentials(
                get("OS_USERNAME").unwrap_or_default(),
                get("OS_PASSWORD").unwrap_or_default(),
            )
            .insecure(
                get("OS_INSECURE")
                    .map(|v| v.trim().eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            );

        if let Some(domain) = get("OS_USER_DOMAIN_NAME") {
            builder = builder.user_domain(domain);
        }
        if let Some(domain) = get("OS_PROJECT_DOMAIN_NAME") {
            builder = builder.project_domain(domain);
        }
        if let Some(name) = get("OS_PROJECT_NAME") {
            builder = builder.project_name(name);
        }
        if let Some(id) = get("OS_PROJECT_ID") {
            builder = builder.project_id(id);
        }
        if let Some(region) = get("OS_REGION_NAME") {
            builder = builder.region(region);
        }
        if let Some(interface) = get("OS_INTERFACE") {
            builder = builder.interface(interface);
        }
        if let Some(command) = get("OS_CLI_COMMAND") {
            builder = builder.cli_command(command);
        }

        builder.build()
    }

    pub fn auth_url(&self) -> &AuthUrl {
        &self.auth_url
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn user_domain(&self) -> &DomainName {
        &self.user_domain
    }

    pub fn project_domain(&self) -> &DomainName {
        &self.project_domain
    }

    /// The explicitly configured project; `Some` means single-scope mode.
    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Whether TLS certificate validation is disabled.
    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn cli_command(&self) -> &str {
        &self.cli_command
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn rate_limit(&self) -> Option<RateLimitConfig> {
        self.rate_limit
    }

    /// Whether only one explicitly named project is inventoried.
    pub fn is_single_scope(&self) -> bool {
        self.project_name.is_some()
    }
}

/// Builder for [`InventoryConfig`]
#[derive(Debug, Default)]
pub struct InventoryConfigBuilder {
    auth_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    user_domain: Option<String>,
    project_domain: Option<String>,
    project_name: Option<String>,
    project_id: Option<String>,
    region: Option<String>,
    interface: Option<String>,
    insecure: bool,
    cli_command: Option<String>,
    request_timeout: Option<Duration>,
    rate_limit: Option<RateLimitConfig>,
}

impl InventoryConfigBuilder {
    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn user_domain(mut self, domain: impl Into<String>) -> Self {
        self.user_domain = Some(domain.into());
        self
    }

    pub fn project_domain(mut self, domain: impl Into<String>) -> Self {
        self.project_domain = Some(domain.into());
        self
    }

    /// Restricts collection to one named project.
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Disables TLS certificate validation. Off unless explicitly requested.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn cli_command(mut self, command: impl Into<String>) -> Self {
        self.cli_command = Some(command.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn build(self) -> OpenStackResult<InventoryConfig> {
        let auth_url = AuthUrl::new(required("auth_url", self.auth_url)?)?;
        let username = Username::new(required("username", self.username)?)?;
        let password = Password::new(required("password", self.password)?)?;

        let user_domain = match self.user_domain {
            Some(domain) => DomainName::new(domain)?,
            None => DomainName::default(),
        };
        let project_domain = match self.project_domain {
            Some(domain) => DomainName::new(domain)?,
            None => user_domain.clone(),
        };

        let project_name = trimmed(self.project_name);
        if let Some(name) = &project_name {
            validate_name("project_name", name)?;
        }

        let interface = normalize_interface(
            self.interface.as_deref().unwrap_or(DEFAULT_INTERFACE),
        )?;

        if let Some(rl) = &self.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                return Err(ValidationError::ConstraintViolation(
                    "Rate limit values must be greater than zero".to_string(),
                )
                .into());
            }
        }

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(ValidationError::Field {
                field: "request_timeout".to_string(),
                message: "Timeout must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(InventoryConfig {
            auth_url,
            username,
            password,
            user_domain,
            project_domain,
            project_name,
            project_id: trimmed(self.project_id),
            region: trimmed(self.region),
            interface,
            insecure: self.insecure,
            cli_command: trimmed(self.cli_command).unwrap_or_else(|| DEFAULT_CLI_COMMAND.to_string()),
            request_timeout,
            rate_limit: self.rate_limit,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ValidationError::Field {
            field: field.to_string(),
            message: format!("{} is required", field),
        })
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts `public`, `internal`, `admin` and the legacy `publicURL` style.
fn normalize_interface(value: &str) -> Result<String, ValidationError> {
    let lower = value.trim().to_ascii_lowercase();
    let lower = lower.strip_suffix("url").unwrap_or(&lower);
    match lower {
        "public" | "internal" | "admin" => Ok(lower.to_string()),
        other => Err(ValidationError::ConstraintViolation(format!(
            "Invalid interface '{}'. Must be one of: public, internal, admin",
            other
        ))),
    }
}
