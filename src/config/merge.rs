use super::utils::{env_bool, env_parse, env_string};
use super::yaml::YamlConfig;
use super::{DEFAULT_IAM_TIMEOUT_SECONDS, SdkConfig};
use crate::core::providers::iam::DEFAULT_IAM_URL;
use crate::core::stt::watson::DEFAULT_SERVICE_URL;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// Validation is left to the caller.
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<SdkConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let iam = yaml.iam.unwrap_or_default();
    let stt = yaml.speech_to_text.unwrap_or_default();

    // Helper macro to get value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env_string($env_var))
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value.or_else(|| env_string($env_var))
        };
    }

    // IAM configuration
    let iam_apikey = get_optional!("IAM_APIKEY", iam.apikey);
    let iam_access_token = get_optional!("IAM_ACCESS_TOKEN", iam.access_token);
    let iam_url = get_value!("IAM_URL", iam.url, DEFAULT_IAM_URL);
    let iam_timeout_seconds = match iam.timeout_seconds {
        Some(seconds) => seconds,
        None => env_parse::<u64>("IAM_TIMEOUT_SECONDS")?.unwrap_or(DEFAULT_IAM_TIMEOUT_SECONDS),
    };

    // Speech to Text configuration
    let speech_url = get_value!("SPEECH_TO_TEXT_URL", stt.url, DEFAULT_SERVICE_URL);
    let speech_username = get_optional!("SPEECH_TO_TEXT_USERNAME", stt.username);
    let speech_password = get_optional!("SPEECH_TO_TEXT_PASSWORD", stt.password);
    let speech_model = get_optional!("SPEECH_TO_TEXT_MODEL", stt.model);

    // Recognition defaults
    let interim_results = match stt.interim_results {
        Some(interim) => interim,
        None => env_bool("SPEECH_TO_TEXT_INTERIM_RESULTS")?.unwrap_or(false),
    };
    let inactivity_timeout = match stt.inactivity_timeout {
        Some(seconds) => Some(seconds),
        None => env_parse::<i32>("SPEECH_TO_TEXT_INACTIVITY_TIMEOUT")?,
    };

    Ok(SdkConfig {
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
    })
}
