mod auth_token;
mod auth_url;
mod credentials;
pub mod serde_helpers;

pub use auth_token::AuthToken;
pub use auth_url::AuthUrl;
pub use credentials::{DomainName, Password, Username};

// Re-export validation functions for internal use
pub(crate) use credentials::validate_name;
