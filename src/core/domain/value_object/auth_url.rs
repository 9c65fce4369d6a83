use crate::core::domain::error::ValidationError;
use url::Url;

const MAX_URL_LENGTH: usize = 2083;

/// A validated Keystone endpoint.
///
/// Operators write `OS_AUTH_URL` both with and without the trailing `/v3`;
/// the value is kept as given and [`AuthUrl::tokens_url`] normalizes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUrl(Url);

impl AuthUrl {
    /// Parses and validates an auth URL.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref().trim();
        validate_auth_url(value)?;
        let url = Url::parse(value)
            .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;
        Ok(Self(url))
    }

    /// Returns the URL as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The identity v3 root (`.../v3`), with or without the suffix in the input.
    #[must_use]
    pub fn v3_root(&self) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        if base.ends_with("/v3") {
            base.to_string()
        } else {
            format!("{}/v3", base)
        }
    }

    /// The token issuing endpoint.
    #[must_use]
    pub fn tokens_url(&self) -> String {
        format!("{}/auth/tokens", self.v3_root())
    }
}

/// Validates the raw auth URL string.
pub(crate) fn validate_auth_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::Field {
            field: "auth_url".to_string(),
            message: "Auth URL cannot be empty".to_string(),
        });
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(ValidationError::Format(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        )));
    }
    let parsed =
        Url::parse(url).map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::ConstraintViolation(format!(
                "Invalid scheme '{}'. Must be one of: http, https",
                other
            )));
        }
    }
    if parsed.host_str().is_none() {
        return Err(ValidationError::Format("URL must contain a host".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_url_with_and_without_version() {
        let bare = AuthUrl::new("https://keystone.example.com:5000").unwrap();
        assert_eq!(
            bare.tokens_url(),
            "https://keystone.example.com:5000/v3/auth/tokens"
        );

        let versioned = AuthUrl::new("https://keystone.example.com:5000/v3/").unwrap();
        assert_eq!(
            versioned.tokens_url(),
            "https://keystone.example.com:5000/v3/auth/tokens"
        );
    }

    #[test]
    fn test_invalid_urls() {
        let cases = vec![
            ("", "empty"),
            ("keystone.example.com", "missing scheme"),
            ("ftp://keystone.example.com", "unsupported scheme"),
        ];
        for (value, case) in cases {
            assert!(AuthUrl::new(value).is_err(), "Case '{}' should fail", case);
        }
    }
}
