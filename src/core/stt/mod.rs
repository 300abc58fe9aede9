mod base;
pub mod watson;

// Re-export public types and traits
pub use base::{NoopCallback, RecognizeCallback, STTError, SessionEnd, SpeechAlternative};

// Re-export Watson implementation
pub use watson::{
    AudioQueue, AudioQueueProducer, AudioSource, RecognizeOptions, RecognizeRequest,
    RecognizeSession, recognize_using_websocket,
};
