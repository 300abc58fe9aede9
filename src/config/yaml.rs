use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values missing
/// here are taken from environment variables, then defaults.
///
/// # Example YAML structure
/// ```yaml
/// iam:
///   apikey: "your-api-key"
///   url: "https://iam.cloud.ibm.com/identity/token"
///   timeout_seconds: 30
///
/// speech_to_text:
///   url: "https://stream.watsonplatform.net/speech-to-text/api"
///   model: "en-US_BroadbandModel"
///   interim_results: true
///   inactivity_timeout: 30
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub iam: Option<IamYaml>,
    pub speech_to_text: Option<SpeechToTextYaml>,
}

/// IAM configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IamYaml {
    pub apikey: Option<String>,
    /// Externally managed bearer token; disables token requests
    pub access_token: Option<String>,
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Speech to Text configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechToTextYaml {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub model: Option<String>,
    pub interim_results: Option<bool>,
    /// Seconds of silence before the service reports a timeout (-1 disables)
    pub inactivity_timeout: Option<i32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
