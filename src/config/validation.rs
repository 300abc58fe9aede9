use url::Url;

/// Validate the service authentication mode
///
/// IAM (API key) and basic auth (username + password) are mutually
/// exclusive, and a username is useless without its password.
pub fn validate_auth_mode(
    iam_apikey: &Option<String>,
    username: &Option<String>,
    password: &Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if iam_apikey.is_some() && username.is_some() {
        return Err(
            "IAM_APIKEY and SPEECH_TO_TEXT_USERNAME are mutually exclusive authentication modes"
                .into(),
        );
    }

    if username.is_some() != password.is_some() {
        return Err(
            "SPEECH_TO_TEXT_USERNAME and SPEECH_TO_TEXT_PASSWORD must be set together".into(),
        );
    }

    Ok(())
}

/// Validate that a configured URL parses and uses a supported scheme
pub fn validate_url(name: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(value).map_err(|e| format!("{name} is not a valid URL ({value}): {e}"))?;

    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(()),
        other => Err(format!("{name} has unsupported scheme '{other}'").into()),
    }
}
