use serde::{Deserialize, Serialize};

/// One candidate transcript for a recognition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAlternative {
    /// Transcribed text
    #[serde(default)]
    pub transcript: String,
    /// Confidence score, only reported for final results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl SpeechAlternative {
    pub fn new(transcript: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            transcript: transcript.into(),
            confidence,
        }
    }
}

/// Error types for STT operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum STTError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Protocol error: {0}")]
    ProtocolError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Audio source error: {0}")]
    AudioSourceError(String),
}

impl From<crate::errors::IamError> for STTError {
    fn from(err: crate::errors::IamError) -> Self {
        STTError::AuthenticationFailed(err.to_string())
    }
}

/// Event sink for a streaming recognition session.
///
/// Every method has a no-op default so implementations only override the
/// events they care about. Methods are invoked from the session's event loop
/// and should return quickly; hand long work off to another task.
pub trait RecognizeCallback: Send + Sync {
    /// The transport is open; the start message is about to be sent.
    fn on_connected(&self) {}

    /// The service is ready for audio.
    fn on_listening(&self) {}

    /// Best current guess for the utterance in progress (interim mode only).
    fn on_hypothesis(&self, _hypothesis: &str) {}

    /// Alternatives for finished results, one list per result.
    ///
    /// In interim mode this carries a single list, for the first result of a
    /// message marked final. Otherwise it carries one list for every result
    /// in the message.
    fn on_transcription(&self, _transcripts: &[Vec<SpeechAlternative>]) {}

    /// The service stopped listening because no speech arrived in time.
    fn on_inactivity_timeout(&self, _error: &str) {}

    /// Raw JSON of every results / speaker_labels message.
    fn on_data(&self, _data: &serde_json::Value) {}

    /// Service, transport or protocol failure.
    fn on_error(&self, _error: &str) {}

    /// The closing handshake finished.
    fn on_close(&self) {}
}

/// Callback sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallback;

impl RecognizeCallback for NoopCallback {}

/// How a recognition session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Closing handshake completed or the service closed the connection.
    Closed,
    /// The session stopped on a connection or transport error, already reported via `on_error`.
    Failed,
}
