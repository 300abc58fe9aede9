use super::SdkConfig;
use super::utils::{env_bool, env_parse, env_string};
use super::DEFAULT_IAM_TIMEOUT_SECONDS;
use crate::core::providers::iam::DEFAULT_IAM_URL;
use crate::core::stt::watson::DEFAULT_SERVICE_URL;

impl SdkConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Numeric or boolean variables are malformed
    /// - Authentication configuration is conflicting or incomplete
    /// - A URL does not parse
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        // IAM configuration
        let iam_apikey = env_string("IAM_APIKEY");
        let iam_access_token = env_string("IAM_ACCESS_TOKEN");
        let iam_url = env_string("IAM_URL").unwrap_or_else(|| DEFAULT_IAM_URL.to_string());
        let iam_timeout_seconds =
            env_parse::<u64>("IAM_TIMEOUT_SECONDS")?.unwrap_or(DEFAULT_IAM_TIMEOUT_SECONDS);

        // Speech to Text configuration
        let speech_url =
            env_string("SPEECH_TO_TEXT_URL").unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
        let speech_username = env_string("SPEECH_TO_TEXT_USERNAME");
        let speech_password = env_string("SPEECH_TO_TEXT_PASSWORD");
        let speech_model = env_string("SPEECH_TO_TEXT_MODEL");

        // Recognition defaults
        let interim_results = env_bool("SPEECH_TO_TEXT_INTERIM_RESULTS")?.unwrap_or(false);
        let inactivity_timeout = env_parse::<i32>("SPEECH_TO_TEXT_INACTIVITY_TIMEOUT")?;

        let config = SdkConfig {
            iam_apikey,
            iam_access_token,
            iam_url,
            iam_timeout_seconds,
            speech_url,
            speech_username,
            speech_password,
            speech_model,
            interim_results,
            inactivity_timeout,
        };
        config.validate()?;

        Ok(config)
    }
}
