//! Internal HTTP client that handles authentication and automatic token refresh.

use crate::{
    auth::application::{
        request::token_request::ScopeTarget,
        service::token_service::{IssuedToken, TokenService},
    },
    core::domain::{
        error::{OpenStackError, OpenStackResult},
        model::{
            inventory_config::{InventoryConfig, RateLimitConfig},
            service_catalog::ServiceKind,
        },
    },
};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, StatusCode, header::ACCEPT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Tokens are refreshed when they expire within this many seconds.
const EXPIRY_MARGIN_SECS: i64 = 60;
/// Upper bound on followed `next` links for a single listing.
const MAX_PAGES: usize = 1000;

/// Builds the shared request limiter, if throttling is configured.
pub fn build_rate_limiter(
    rate_limit: Option<RateLimitConfig>,
) -> Option<Arc<DefaultDirectRateLimiter>> {
    rate_limit.and_then(|rl| {
        let per_second = NonZeroU32::new(rl.requests_per_second)?;
        let burst = NonZeroU32::new(rl.burst_size)?;
        let quota = Quota::per_second(per_second).allow_burst(burst);
        Some(Arc::new(DefaultDirectRateLimiter::direct(quota)))
    })
}

/// Internal HTTP client bound to one token scope.
///
/// Every request carries `X-Auth-Token`. A token close to expiry is renewed
/// before the request; a `401 Unauthorized` answer triggers one
/// re-authentication with the stored credentials and one retry.
#[derive(Debug)]
pub struct ApiClient {
    http_client: Client,
    config: Arc<InventoryConfig>,
    target: ScopeTarget,
    auth: Arc<RwLock<Option<IssuedToken>>>,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl ApiClient {
    /// Creates a new `ApiClient`. The client starts unauthenticated.
    pub fn new(
        http_client: Client,
        config: Arc<InventoryConfig>,
        target: ScopeTarget,
        rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
    ) -> Self {
        Self {
            http_client,
            config,
            target,
            auth: Arc::new(RwLock::new(None)),
            rate_limiter,
        }
    }

    pub fn target(&self) -> &ScopeTarget {
        &self.target
    }

    /// Sets the authentication state.
    pub async fn set_auth(&self, auth: IssuedToken) {
        let mut lock = self.auth.write().await;
        *lock = Some(auth);
    }

    /// Returns the current authentication state, if any.
    pub async fn auth(&self) -> Option<IssuedToken> {
        self.auth.read().await.clone()
    }

    /// Returns `true` if there is a token that is not about to expire.
    pub async fn is_authenticated(&self) -> bool {
        let lock = self.auth.read().await;
        lock.as_ref()
            .map(|a| !a.token.is_expired(expiry_margin()))
            .unwrap_or(false)
    }

    /// Performs a fresh login and returns the issued token.
    pub async fn authenticate(&self) -> OpenStackResult<IssuedToken> {
        self.refresh_auth().await?;
        self.auth().await.ok_or_else(|| {
            OpenStackError::Authentication("No token stored after login".to_string())
        })
    }

    /// Performs an authenticated GET request against an absolute URL.
    pub async fn get_json<T>(&self, url: &Url) -> OpenStackResult<T>
    where
        T: DeserializeOwned,
    {
        self.ensure_authenticated().await?;

        let response = self.send_get(url).await?;

        // Retry exactly once after a refresh
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            debug!(%url, "token rejected, re-authenticating");
            self.refresh_auth().await?;
            self.send_get(url).await?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(OpenStackError::Api {
                status: status.as_u16(),
                message: format!("GET {}: {}", url, error_text.trim()),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| OpenStackError::Decode(format!("Failed to parse response from {}: {}", url, e)))
    }

    async fn send_get(&self, url: &Url) -> OpenStackResult<reqwest::Response> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let mut req_builder = self
            .http_client
            .get(url.clone())
            .header(ACCEPT, "application/json");

        {
            let auth_guard = self.auth.read().await;
            if let Some(auth) = auth_guard.as_ref() {
                req_builder = req_builder.header(AUTH_TOKEN_HEADER, auth.token.as_str());
            }
        }

        req_builder
            .send()
            .await
            .map_err(|e| OpenStackError::Connection(format!("HTTP request to {} failed: {}", url, e)))
    }

    /// Ensures that we have a token that is not about to expire.
    async fn ensure_authenticated(&self) -> OpenStackResult<()> {
        if !self.is_authenticated().await {
            self.refresh_auth().await?;
        }
        Ok(())
    }

    /// Performs a fresh login using the stored credentials to obtain a new token.
    async fn refresh_auth(&self) -> OpenStackResult<()> {
        let service = TokenService::new(self.http_client.clone());
        let issued = service.execute(&self.config, &self.target).await?;
        self.set_auth(issued).await;
        Ok(())
    }
}

fn expiry_margin() -> chrono::Duration {
    chrono::Duration::seconds(EXPIRY_MARGIN_SECS)
}

/// An [`ApiClient`] bound to the base URL of one catalog service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    api: Arc<ApiClient>,
    kind: ServiceKind,
    base: Url,
}

impl ServiceClient {
    pub fn new(api: Arc<ApiClient>, kind: ServiceKind, base: Url) -> Self {
        Self { api, kind, base }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves a path relative to the service base and appends query pairs.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> OpenStackResult<Url> {
        let mut url = self.base.join(path.trim_start_matches('/')).map_err(|e| {
            OpenStackError::Connection(format!("Invalid path '{}' for {}: {}", path, self.kind, e))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    /// Fetches a single document.
    pub async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> OpenStackResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        self.api.get_json(&url).await
    }

    /// Fetches every page of a collection stored under `key`.
    ///
    /// Pages are chained through `<key>_links` entries with `rel = "next"`
    /// (Nova, Cinder, Neutron, Octavia) or a top-level `next` URL (Magnum).
    pub async fn list<T>(&self, path: &str, query: &[(&str, &str)], key: &str) -> OpenStackResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut url = self.url(path, query)?;
        let mut items = Vec::new();

        for _ in 0..MAX_PAGES {
            let mut page: Value = self.api.get_json(&url).await?;

            let batch = page
                .get_mut(key)
                .map(Value::take)
                .ok_or_else(|| OpenStackError::Decode(format!("Response from {} has no '{}' field", url, key)))?;
            let batch: Vec<T> = serde_json::from_value(batch)
                .map_err(|e| OpenStackError::Decode(format!("Malformed '{}' in {}: {}", key, url, e)))?;
            let fetched = batch.len();
            items.extend(batch);

            match next_link(&page, key, &url) {
                Some(next) if fetched > 0 && next != url => url = next,
                _ => return Ok(items),
            }
        }

        warn!(%url, pages = MAX_PAGES, "pagination limit reached, listing truncated");
        Ok(items)
    }
}

fn next_link(page: &Value, key: &str, current: &Url) -> Option<Url> {
    let from_links = page
        .get(format!("{}_links", key))
        .and_then(Value::as_array)
        .and_then(|links| {
            links
                .iter()
                .find(|l| l.get("rel").and_then(Value::as_str) == Some("next"))
                .and_then(|l| l.get("href").and_then(Value::as_str))
        });
    // Keystone nests the link under `links.next`
    let href = from_links
        .or_else(|| page.get("next").and_then(Value::as_str))
        .or_else(|| page.pointer("/links/next").and_then(Value::as_str))?;
    current.join(href).ok()
}
