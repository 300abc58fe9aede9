use reqwest::StatusCode;

/// Upper bound on how much of an error body is carried in an error value.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Error codes for structured error reporting
pub mod error_codes {
    pub const AUTH_SERVICE_ERROR: &str = "auth_service_error";
    pub const AUTH_SERVICE_UNAVAILABLE: &str = "auth_service_unavailable";
    pub const CONFIG_ERROR: &str = "config_error";
}

/// Errors returned by the IAM token manager
#[derive(Debug, thiserror::Error)]
pub enum IamError {
    /// The token endpoint answered with a non-2xx status
    #[error("Auth service error ({status}): {message}")]
    AuthServiceError { status: StatusCode, message: String },

    /// Neither an API key nor a user-managed access token is configured
    #[error("IAM configuration error: {0}")]
    ConfigError(String),

    /// Transport failure or an undecodable token response
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl IamError {
    /// Build an `AuthServiceError` from a failed response body.
    pub fn from_response_body(status: StatusCode, body: &str) -> Self {
        IamError::AuthServiceError {
            status,
            message: extract_error_message(body),
        }
    }

    /// True when the token endpoint rejected the request.
    pub fn is_auth_service_error(&self) -> bool {
        matches!(self, IamError::AuthServiceError { .. })
    }

    /// HTTP status reported by the token endpoint, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            IamError::AuthServiceError { status, .. } => Some(*status),
            IamError::HttpError(e) => e.status(),
            IamError::ConfigError(_) => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            IamError::AuthServiceError { .. } => error_codes::AUTH_SERVICE_ERROR,
            IamError::HttpError(_) => error_codes::AUTH_SERVICE_UNAVAILABLE,
            IamError::ConfigError(_) => error_codes::CONFIG_ERROR,
        }
    }

    /// Log the error at the appropriate level
    pub fn log(&self) {
        match self {
            IamError::AuthServiceError { status, message } => {
                tracing::warn!("Auth service error ({}): {}", status, message);
            }
            IamError::HttpError(e) => {
                tracing::error!("Auth service unavailable: {}", e);
            }
            IamError::ConfigError(msg) => {
                tracing::error!("IAM configuration error: {}", msg);
            }
        }
    }
}

/// Best-effort extraction of a human readable message from an error body.
///
/// IAM and the Watson services are not consistent about where they put the
/// message, so the known locations are tried in order before falling back to
/// the (capped) raw body.
pub fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["errorMessage", "error_description", "message"] {
            if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }

        match json.get("error") {
            Some(serde_json::Value::String(msg)) => return msg.clone(),
            Some(serde_json::Value::Object(obj)) => {
                if let Some(msg) = obj.get("message").and_then(|v| v.as_str()) {
                    return msg.to_string();
                }
            }
            _ => {}
        }

        if let Some(msg) = json
            .get("errors")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.as_str())
        {
            return msg.to_string();
        }
    }

    if body.is_empty() {
        return "Unknown error".to_string();
    }

    if body.len() > MAX_ERROR_BODY_LEN {
        let mut end = MAX_ERROR_BODY_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

/// Result type for IAM operations
pub type IamResult<T> = Result<T, IamError>;
