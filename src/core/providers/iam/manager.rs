//! IAM token manager.
//!
//! Supplies a valid bearer token on demand: the first call requests one with
//! the API key, later calls return the cached token until it enters its
//! refresh window, at which point it is refreshed (or re-requested if the
//! refresh token itself is presumed stale). A caller-supplied access token
//! short-circuits all of this.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::token::{CredentialToken, unix_now};
use super::{
    APIKEY_GRANT_TYPE, DEFAULT_IAM_URL, REFRESH_GRANT_TYPE, RESPONSE_TYPE, client_authorization,
};
use crate::errors::{IamError, IamResult};

/// Trait for anything that can hand out a bearer token.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token that is valid right now.
    async fn get_token(&self) -> IamResult<String>;
}

/// Manages the IAM token lifecycle for one client instance.
///
/// `get_token` takes `&mut self`: the cached token is plain state with no
/// internal locking. Use [`SharedIamTokenManager`] when several tasks need
/// tokens from the same manager.
pub struct IamTokenManager {
    client: Client,
    iam_url: String,
    iam_apikey: Option<String>,
    user_access_token: Option<String>,
    token_info: Option<CredentialToken>,
}

impl std::fmt::Debug for IamTokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamTokenManager")
            .field("iam_url", &self.iam_url)
            .field("iam_apikey", &self.iam_apikey.as_ref().map(|_| "<redacted>"))
            .field(
                "user_access_token",
                &self.user_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("has_token", &self.token_info.is_some())
            .finish()
    }
}

impl IamTokenManager {
    /// Create a token manager.
    ///
    /// # Arguments
    /// * `iam_apikey` - API key used for token requests
    /// * `user_access_token` - Externally managed token; when set it is returned as-is
    /// * `iam_url` - Token endpoint, defaults to [`DEFAULT_IAM_URL`]
    pub fn new(
        iam_apikey: Option<String>,
        user_access_token: Option<String>,
        iam_url: Option<String>,
    ) -> Self {
        Self::with_client(Client::new(), iam_apikey, user_access_token, iam_url)
    }

    /// Create a token manager whose HTTP client gives up after `timeout`.
    pub fn with_timeout(
        timeout: Duration,
        iam_apikey: Option<String>,
        user_access_token: Option<String>,
        iam_url: Option<String>,
    ) -> IamResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IamError::ConfigError(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(
            client,
            iam_apikey,
            user_access_token,
            iam_url,
        ))
    }

    /// Create a token manager on top of an existing HTTP client.
    pub fn with_client(
        client: Client,
        iam_apikey: Option<String>,
        user_access_token: Option<String>,
        iam_url: Option<String>,
    ) -> Self {
        Self {
            client,
            iam_url: iam_url.unwrap_or_else(|| DEFAULT_IAM_URL.to_string()),
            iam_apikey,
            user_access_token,
            token_info: None,
        }
    }

    /// Return a valid access token, requesting or refreshing as needed.
    ///
    /// Errors from the token endpoint are returned unchanged; nothing is retried.
    pub async fn get_token(&mut self) -> IamResult<String> {
        if let Some(token) = &self.user_access_token {
            return Ok(token.clone());
        }

        let now = unix_now();
        let token = match &self.token_info {
            None => {
                debug!("No IAM token cached, requesting one");
                self.request_token().await?
            }
            Some(info) if info.is_expired_at(now) => {
                if info.is_refresh_token_expired_at(now) {
                    debug!("IAM refresh token presumed expired, requesting a new token");
                    self.request_token().await?
                } else {
                    debug!("IAM access token expired, refreshing");
                    self.refresh_token().await?
                }
            }
            Some(info) => return Ok(info.access_token.clone()),
        };

        let access_token = token.access_token.clone();
        self.token_info = Some(token);
        Ok(access_token)
    }

    /// Request a fresh token with the API key grant.
    pub async fn request_token(&self) -> IamResult<CredentialToken> {
        let apikey = self.iam_apikey.as_deref().ok_or_else(|| {
            IamError::ConfigError("An IAM API key is required to request a token".to_string())
        })?;

        let params = [
            ("grant_type", APIKEY_GRANT_TYPE),
            ("apikey", apikey),
            ("response_type", RESPONSE_TYPE),
        ];
        let token = self.post_form(&params).await?;
        info!("Obtained IAM access token");
        Ok(token)
    }

    /// Exchange the cached refresh token for a new token.
    pub async fn refresh_token(&self) -> IamResult<CredentialToken> {
        let refresh_token = self
            .token_info
            .as_ref()
            .map(|t| t.refresh_token.as_str())
            .ok_or_else(|| {
                IamError::ConfigError("No refresh token available; request a token first".to_string())
            })?;

        let params = [
            ("grant_type", REFRESH_GRANT_TYPE),
            ("refresh_token", refresh_token),
        ];
        let token = self.post_form(&params).await?;
        info!("Refreshed IAM access token");
        Ok(token)
    }

    async fn post_form(&self, params: &[(&str, &str)]) -> IamResult<CredentialToken> {
        let response = self
            .client
            .post(&self.iam_url)
            .header(AUTHORIZATION, client_authorization())
            .header(ACCEPT, "application/json")
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            let err = IamError::from_response_body(status, &body);
            err.log();
            return Err(err);
        }

        Ok(response.json::<CredentialToken>().await?)
    }

    /// Pin an externally managed access token.
    ///
    /// While set, `get_token` returns it without validation or refresh.
    pub fn set_access_token(&mut self, user_access_token: impl Into<String>) {
        self.user_access_token = Some(user_access_token.into());
    }

    /// Replace the API key used for future token requests.
    pub fn set_iam_apikey(&mut self, iam_apikey: impl Into<String>) {
        self.iam_apikey = Some(iam_apikey.into());
    }

    /// Point the manager at a different token endpoint.
    pub fn set_iam_url(&mut self, iam_url: impl Into<String>) {
        self.iam_url = iam_url.into();
    }

    pub fn iam_url(&self) -> &str {
        &self.iam_url
    }

    /// The cached token response, if one has been obtained.
    pub fn token_info(&self) -> Option<&CredentialToken> {
        self.token_info.as_ref()
    }

    /// Whether the cached access token needs a refresh. True when nothing is cached.
    pub fn is_token_expired(&self) -> bool {
        self.token_info
            .as_ref()
            .is_none_or(|t| t.is_expired_at(unix_now()))
    }

    /// Whether the cached refresh token is presumed stale. True when nothing is cached.
    pub fn is_refresh_token_expired(&self) -> bool {
        self.token_info
            .as_ref()
            .is_none_or(|t| t.is_refresh_token_expired_at(unix_now()))
    }

    #[cfg(test)]
    pub(crate) fn set_token_info(&mut self, token: CredentialToken) {
        self.token_info = Some(token);
    }
}

/// Token manager that can be shared between tasks.
///
/// Serializes `get_token` so that concurrent callers never race to refresh.
#[derive(Clone, Debug)]
pub struct SharedIamTokenManager {
    inner: Arc<Mutex<IamTokenManager>>,
}

impl SharedIamTokenManager {
    pub fn new(manager: IamTokenManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    pub async fn set_access_token(&self, user_access_token: impl Into<String>) {
        self.inner.lock().await.set_access_token(user_access_token);
    }

    pub async fn token_info(&self) -> Option<CredentialToken> {
        self.inner.lock().await.token_info().cloned()
    }
}

#[async_trait::async_trait]
impl TokenProvider for SharedIamTokenManager {
    async fn get_token(&self) -> IamResult<String> {
        self.inner.lock().await.get_token().await
    }
}

/// Provider for a fixed, externally managed token.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> IamResult<String> {
        Ok(self.token.clone())
    }
}
