use crate::core::domain::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// A Keystone token as returned in the `X-Subject-Token` header.
#[derive(Clone)]
pub struct AuthToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Creates a new token without validation.
    pub(crate) fn new_unchecked(value: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { value, expires_at }
    }

    pub fn new(value: String, expires_at: Option<DateTime<Utc>>) -> Result<Self, ValidationError> {
        validate_token(&value)?;
        Ok(Self::new_unchecked(value, expires_at))
    }

    /// Returns the token value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Checks whether the token expires within `margin` from now.
    ///
    /// Tokens without an expiry are treated as valid until the server says otherwise.
    #[must_use]
    pub fn is_expired(&self, margin: Duration) -> bool {
        self.expires_at
            .map(|expiry| expiry - margin <= Utc::now())
            .unwrap_or(false)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Validates the format of a token string.
pub(crate) fn validate_token(token: &str) -> Result<(), ValidationError> {
    if token.is_empty() {
        return Err(ValidationError::Field {
            field: "token".to_string(),
            message: "Token cannot be empty".to_string(),
        });
    }
    if !token.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ValidationError::Format(
            "Token must only contain printable ASCII characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_margin() {
        let soon = AuthToken::new_unchecked(
            "gAAAAABtoken".to_string(),
            Some(Utc::now() + Duration::seconds(30)),
        );
        assert!(soon.is_expired(Duration::minutes(1)));
        assert!(!soon.is_expired(Duration::zero()));

        let open_ended = AuthToken::new_unchecked("gAAAAABtoken".to_string(), None);
        assert!(!open_ended.is_expired(Duration::minutes(1)));
    }

    #[test]
    fn test_invalid_token() {
        assert!(AuthToken::new(String::new(), None).is_err());
        assert!(AuthToken::new("with space".to_string(), None).is_err());
    }
}
