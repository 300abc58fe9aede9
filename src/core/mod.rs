pub mod providers;
pub mod stt;

// Re-export commonly used types for convenience
pub use providers::{CredentialToken, IamTokenManager, SharedIamTokenManager, TokenProvider};

pub use stt::{
    AudioQueue, AudioQueueProducer, AudioSource, NoopCallback, RecognizeCallback,
    RecognizeOptions, RecognizeRequest, RecognizeSession, STTError, SessionEnd,
    SpeechAlternative, recognize_using_websocket,
};
