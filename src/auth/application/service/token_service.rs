use crate::{
    auth::application::{
        request::token_request::{ScopeTarget, TokenRequest},
        response::token_response::{ScopedProject, TokenResponse},
    },
    core::domain::{
        error::{OpenStackError, OpenStackResult, ValidationError},
        model::{inventory_config::InventoryConfig, service_catalog::ServiceCatalog},
        value_object::AuthToken,
    },
};

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use tracing::debug;

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Result of a successful password authentication.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: AuthToken,
    /// The project the token is scoped to, if any.
    pub project: Option<ScopedProject>,
    pub catalog: ServiceCatalog,
}

/// Issues Keystone v3 tokens with the password method.
pub struct TokenService {
    http_client: Client,
    default_headers: HeaderMap,
}

impl TokenService {
    pub fn new(http_client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Self {
            http_client,
            default_headers,
        }
    }

    pub async fn execute(
        &self,
        config: &InventoryConfig,
        target: &ScopeTarget,
    ) -> OpenStackResult<IssuedToken> {
        let url = config.auth_url().tokens_url();
        let request = TokenRequest::password(config, target);
        debug!(scope = %target.describe(), "requesting token");

        let response = self
            .http_client
            .post(&url)
            .headers(self.default_headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                OpenStackError::Authentication(format!("Identity endpoint unreachable: {}", e))
            })?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => self.handle_successful_login(response).await,
            StatusCode::UNAUTHORIZED => Err(OpenStackError::Authentication(
                "Invalid credentials provided".to_string(),
            )),
            StatusCode::BAD_REQUEST => Err(ValidationError::Field {
                field: "request".to_string(),
                message: "Invalid request format".to_string(),
            }
            .into()),
            StatusCode::NOT_FOUND => Err(OpenStackError::Authentication(format!(
                "Identity endpoint not found at {}",
                url
            ))),
            StatusCode::SERVICE_UNAVAILABLE => Err(OpenStackError::Connection(
                "Identity service is currently unavailable".to_string(),
            )),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(OpenStackError::Api {
                    status: status.as_u16(),
                    message: format!("Token request rejected ({}): {}", target.describe(), message),
                })
            }
        }
    }

    async fn handle_successful_login(
        &self,
        response: reqwest::Response,
    ) -> OpenStackResult<IssuedToken> {
        let value = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                OpenStackError::Authentication(format!(
                    "Response did not carry an {} header",
                    SUBJECT_TOKEN_HEADER
                ))
            })?;

        let body = response.json::<TokenResponse>().await.map_err(|e| {
            OpenStackError::Decode(format!("Failed to parse token response: {}", e))
        })?;

        let token = AuthToken::new(value, body.token.expires_at)?;

        Ok(IssuedToken {
            token,
            project: body.token.project,
            catalog: body.token.catalog,
        })
    }
}
