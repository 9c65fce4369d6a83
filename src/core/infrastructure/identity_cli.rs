//! Project discovery through the external `openstack` command line client.

use crate::core::domain::{
    error::{OpenStackError, OpenStackResult},
    model::{inventory_config::InventoryConfig, scope::Scope},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::{process::Command, time::timeout};
use tracing::{debug, info};

const CLI_TIMEOUT: Duration = Duration::from_secs(60);

/// Lists the projects visible to the configured user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityCli: Send + Sync {
    async fn list_projects(&self) -> OpenStackResult<Vec<Scope>>;
}

/// Runs `<command> project list -f json` with the configured credentials.
#[derive(Debug, Clone)]
pub struct OpenStackCli {
    command: String,
    env: Vec<(&'static str, String)>,
}

impl OpenStackCli {
    pub fn new(config: &InventoryConfig) -> Self {
        let mut env = vec![
            ("OS_AUTH_URL", config.auth_url().as_str().to_string()),
            ("OS_USERNAME", config.username().as_str().to_string()),
            ("OS_PASSWORD", config.password().as_str().to_string()),
            ("OS_USER_DOMAIN_NAME", config.user_domain().as_str().to_string()),
            ("OS_PROJECT_DOMAIN_NAME", config.project_domain().as_str().to_string()),
            ("OS_INTERFACE", config.interface().to_string()),
            ("OS_IDENTITY_API_VERSION", "3".to_string()),
        ];
        if let Some(region) = config.region() {
            env.push(("OS_REGION_NAME", region.to_string()));
        }
        if let Some(id) = config.project_id() {
            env.push(("OS_PROJECT_ID", id.to_string()));
        }
        if config.insecure() {
            env.push(("OS_INSECURE", "true".to_string()));
        }

        Self {
            command: config.cli_command().to_string(),
            env,
        }
    }
}

#[async_trait]
impl IdentityCli for OpenStackCli {
    async fn list_projects(&self) -> OpenStackResult<Vec<Scope>> {
        info!(command = %self.command, "listing projects with identity CLI");
        let child = Command::new(&self.command)
            .args(["project", "list", "-f", "json"])
            .envs(self.env.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OpenStackError::Discovery(format!("Failed to launch {}: {}", self.command, e)))?;

        let output = timeout(CLI_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| OpenStackError::Discovery(format!("{} timed out", self.command)))??;

        if !output.status.success() {
            return Err(OpenStackError::Discovery(format!(
                "'{} project list' exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let scopes = parse_project_list(&output.stdout)?;
        debug!(count = scopes.len(), "identity CLI returned projects");
        Ok(scopes)
    }
}

#[derive(Deserialize)]
struct CliProject {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "Enabled", default)]
    enabled: Option<bool>,
}

/// Parses the JSON table printed by `project list -f json`.
pub fn parse_project_list(output: &[u8]) -> OpenStackResult<Vec<Scope>> {
    let projects: Vec<CliProject> = serde_json::from_slice(output)
        .map_err(|e| OpenStackError::Discovery(format!("Malformed project list output: {}", e)))?;

    Ok(projects
        .into_iter()
        .map(|p| Scope {
            description: p.description.unwrap_or_default(),
            enabled: p.enabled.unwrap_or(true),
            ..Scope::new(p.id, p.name)
        })
        .collect())
}
