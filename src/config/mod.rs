//! Configuration module for the Watson speech client
//!
//! This module handles client configuration from various sources: YAML files and
//! environment variables. The configuration is split into logical submodules.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use watson_speech::config::SdkConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = SdkConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallback
//! let config = SdkConfig::from_file(&PathBuf::from("watson.yaml"))?;
//!
//! let mut tokens = config.token_manager()?;
//! let request = config.recognize_request();
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::providers::iam::{DEFAULT_IAM_URL, IamTokenManager};
use crate::core::stt::watson::{DEFAULT_SERVICE_URL, RecognizeOptions, RecognizeRequest};
use crate::errors::IamResult;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

/// Default timeout for IAM token requests.
pub const DEFAULT_IAM_TIMEOUT_SECONDS: u64 = 30;

/// Client configuration
///
/// Contains what an application needs to compose the token manager and a
/// recognition session:
/// - IAM credentials and token endpoint
/// - Speech to Text service URL and optional basic credentials
/// - Default recognition parameters
#[derive(Clone)]
pub struct SdkConfig {
    // IAM settings
    pub iam_apikey: Option<String>,
    pub iam_access_token: Option<String>,
    pub iam_url: String,
    pub iam_timeout_seconds: u64,

    // Speech to Text settings
    pub speech_url: String,
    pub speech_username: Option<String>,
    pub speech_password: Option<String>,
    pub speech_model: Option<String>,

    // Recognition defaults
    pub interim_results: bool,
    pub inactivity_timeout: Option<i32>,
}

impl std::fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkConfig")
            .field("iam_apikey", &self.iam_apikey.as_ref().map(|_| "<redacted>"))
            .field(
                "iam_access_token",
                &self.iam_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("iam_url", &self.iam_url)
            .field("iam_timeout_seconds", &self.iam_timeout_seconds)
            .field("speech_url", &self.speech_url)
            .field("speech_username", &self.speech_username)
            .field(
                "speech_password",
                &self.speech_password.as_ref().map(|_| "<redacted>"),
            )
            .field("speech_model", &self.speech_model)
            .field("interim_results", &self.interim_results)
            .field("inactivity_timeout", &self.inactivity_timeout)
            .finish()
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            iam_apikey: None,
            iam_access_token: None,
            iam_url: DEFAULT_IAM_URL.to_string(),
            iam_timeout_seconds: DEFAULT_IAM_TIMEOUT_SECONDS,
            speech_url: DEFAULT_SERVICE_URL.to_string(),
            speech_username: None,
            speech_password: None,
            speech_model: None,
            interim_results: false,
            inactivity_timeout: None,
        }
    }
}

impl SdkConfig {
    /// Load configuration from a YAML file with environment variable fallback
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // The .env file is not loaded here; only real environment variables
        // fill in what the YAML file leaves out.
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;

        Ok(config)
    }

    /// Check the merged configuration for conflicting or malformed values.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_auth_mode(
            &self.iam_apikey,
            &self.speech_username,
            &self.speech_password,
        )?;
        validation::validate_url("IAM_URL", &self.iam_url)?;
        validation::validate_url("SPEECH_TO_TEXT_URL", &self.speech_url)?;
        Ok(())
    }

    /// Whether requests authenticate with an IAM bearer token.
    pub fn uses_iam(&self) -> bool {
        self.iam_apikey.is_some() || self.iam_access_token.is_some()
    }

    /// Build a token manager for the configured IAM credentials.
    pub fn token_manager(&self) -> IamResult<IamTokenManager> {
        IamTokenManager::with_timeout(
            Duration::from_secs(self.iam_timeout_seconds),
            self.iam_apikey.clone(),
            self.iam_access_token.clone(),
            Some(self.iam_url.clone()),
        )
    }

    /// Recognition options carrying the configured defaults.
    pub fn recognize_options(&self) -> RecognizeOptions {
        let mut options = RecognizeOptions::new().with_interim_results(self.interim_results);
        if let Some(timeout) = self.inactivity_timeout {
            options = options.with_inactivity_timeout(timeout);
        }
        options
    }

    /// Endpoint request for the configured service.
    ///
    /// Basic credentials are attached when configured; IAM callers add the
    /// bearer token with [`RecognizeRequest::with_token_provider`].
    pub fn recognize_request(&self) -> RecognizeRequest {
        let mut request = RecognizeRequest::new(self.speech_url.clone());
        if let Some(model) = &self.speech_model {
            request = request.with_model(model.clone());
        }
        if let (Some(username), Some(password)) = (&self.speech_username, &self.speech_password) {
            request = request.with_basic_auth(username.clone(), password.clone());
        }
        request
    }
}
