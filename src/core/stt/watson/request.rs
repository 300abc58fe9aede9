//! Endpoint address and handshake headers for a recognize session.

use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::core::providers::iam::{TokenProvider, basic_auth_header, bearer_header};
use crate::core::stt::base::STTError;

/// Default Speech to Text service URL.
pub const DEFAULT_SERVICE_URL: &str = "https://stream.watsonplatform.net/speech-to-text/api";

/// Path of the recognize WebSocket relative to the service URL.
pub const RECOGNIZE_PATH: &str = "/v1/recognize";

#[derive(Clone, Default)]
enum Authorization {
    #[default]
    None,
    Bearer(String),
    Basic {
        username: String,
        password: String,
    },
}

impl Authorization {
    fn header_value(&self) -> Option<String> {
        match self {
            Authorization::None => None,
            Authorization::Bearer(token) => Some(bearer_header(token)),
            Authorization::Basic { username, password } => {
                Some(basic_auth_header(username, password))
            }
        }
    }
}

/// Connection parameters for the recognize endpoint.
///
/// Everything here travels in the handshake (URL query or headers); the
/// recognition options themselves go in the start message.
#[derive(Clone)]
pub struct RecognizeRequest {
    service_url: String,
    model: Option<String>,
    customization_id: Option<String>,
    acoustic_customization_id: Option<String>,
    customization_weight: Option<f64>,
    base_model_version: Option<String>,
    learning_opt_out: bool,
    headers: Vec<(String, String)>,
    auth: Authorization,
}

impl std::fmt::Debug for RecognizeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match &self.auth {
            Authorization::None => "none",
            Authorization::Bearer(_) => "bearer",
            Authorization::Basic { .. } => "basic",
        };
        f.debug_struct("RecognizeRequest")
            .field("service_url", &self.service_url)
            .field("model", &self.model)
            .field("customization_id", &self.customization_id)
            .field("acoustic_customization_id", &self.acoustic_customization_id)
            .field("customization_weight", &self.customization_weight)
            .field("base_model_version", &self.base_model_version)
            .field("learning_opt_out", &self.learning_opt_out)
            .field("headers", &self.headers.len())
            .field("auth", &auth)
            .finish()
    }
}

impl Default for RecognizeRequest {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL)
    }
}

impl RecognizeRequest {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            model: None,
            customization_id: None,
            acoustic_customization_id: None,
            customization_weight: None,
            base_model_version: None,
            learning_opt_out: false,
            headers: Vec::new(),
            auth: Authorization::None,
        }
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_customization_id(mut self, customization_id: impl Into<String>) -> Self {
        self.customization_id = Some(customization_id.into());
        self
    }

    pub fn with_acoustic_customization_id(mut self, id: impl Into<String>) -> Self {
        self.acoustic_customization_id = Some(id.into());
        self
    }

    /// Weight of the custom language model, between 0.0 and 1.0.
    pub fn with_customization_weight(mut self, weight: f64) -> Self {
        self.customization_weight = Some(weight);
        self
    }

    pub fn with_base_model_version(mut self, version: impl Into<String>) -> Self {
        self.base_model_version = Some(version.into());
        self
    }

    /// Ask the service not to keep request data for service improvement.
    pub fn with_learning_opt_out(mut self, opt_out: bool) -> Self {
        self.learning_opt_out = opt_out;
        self
    }

    /// Add a handshake header. Later values replace earlier ones with the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Authorization::Bearer(token.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Authorization::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Authorize with a bearer token obtained from `provider`.
    pub async fn with_token_provider(
        mut self,
        provider: &dyn TokenProvider,
    ) -> Result<Self, STTError> {
        let token = provider.get_token().await?;
        self.auth = Authorization::Bearer(token);
        Ok(self)
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(model) = &self.model {
            pairs.push(("model", model.clone()));
        }
        if let Some(id) = &self.customization_id {
            pairs.push(("customization_id", id.clone()));
        }
        if let Some(id) = &self.acoustic_customization_id {
            pairs.push(("acoustic_customization_id", id.clone()));
        }
        if let Some(weight) = self.customization_weight {
            pairs.push(("customization_weight", weight.to_string()));
        }
        if let Some(version) = &self.base_model_version {
            pairs.push(("base_model_version", version.clone()));
        }
        if self.learning_opt_out {
            pairs.push(("x-watson-learning-opt-out", "true".to_string()));
        }
        pairs
    }

    /// WebSocket URL of the recognize endpoint.
    ///
    /// `https` service URLs map to `wss`, `http` to `ws`.
    pub fn websocket_url(&self) -> Result<Url, STTError> {
        let base = self.service_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };

        let mut url = Url::parse(&format!("{ws_base}{RECOGNIZE_PATH}")).map_err(|e| {
            STTError::ConfigurationError(format!(
                "Invalid service URL '{}': {e}",
                self.service_url
            ))
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(STTError::ConfigurationError(format!(
                "Unsupported scheme '{}' in service URL",
                url.scheme()
            )));
        }

        let pairs = self.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }

    /// Handshake headers, including `Authorization` when credentials are set.
    pub fn headers(&self) -> Result<HeaderMap, STTError> {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                STTError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                STTError::ConfigurationError(format!("Invalid value for header '{name}': {e}"))
            })?;
            headers.insert(header_name, header_value);
        }

        if let Some(auth) = self.auth.header_value() {
            let mut value = HeaderValue::from_str(&auth).map_err(|e| {
                STTError::ConfigurationError(format!("Invalid authorization value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}
