//! IBM Cloud IAM token management.
//!
//! Watson services accept a bearer token issued by the IAM token endpoint in
//! exchange for an API key. This module wraps that exchange:
//!
//! - [`CredentialToken`]: the token response as issued by IAM
//! - [`IamTokenManager`]: request / refresh-on-expiry with caching
//! - [`SharedIamTokenManager`]: the same manager behind a mutex, for multi-task use
//! - [`TokenProvider`]: the seam the recognition client uses to obtain tokens
//!
//! # Example
//!
//! ```rust,no_run
//! use watson_speech::core::providers::iam::IamTokenManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = IamTokenManager::new(Some("my-api-key".to_string()), None, None);
//! let token = manager.get_token().await?;
//! # Ok(())
//! # }
//! ```

use base64::prelude::*;

mod manager;
mod token;

pub use manager::{IamTokenManager, SharedIamTokenManager, StaticTokenProvider, TokenProvider};
pub use token::{CredentialToken, REFRESH_TOKEN_GRACE_SECS, TOKEN_REFRESH_FRACTION};

/// Default IAM token endpoint.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Grant type for exchanging an API key.
pub const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Grant type for exchanging a refresh token.
pub const REFRESH_GRANT_TYPE: &str = "refresh_token";

/// Response type requested on API key grants.
pub const RESPONSE_TYPE: &str = "cloud_iam";

/// Public client credentials shared by every IAM client of this API.
const IAM_CLIENT_ID: &str = "bx";
const IAM_CLIENT_SECRET: &str = "bx";

/// `Authorization` header value sent to the token endpoint.
pub fn client_authorization() -> String {
    basic_auth_header(IAM_CLIENT_ID, IAM_CLIENT_SECRET)
}

/// Format a `Basic` authorization header value.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{username}:{password}"))
    )
}

/// Format a `Bearer` authorization header value.
#[inline]
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {token}")
}
