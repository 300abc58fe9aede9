//! Watson Speech to Text streaming recognition over WebSocket.
//!
//! # Protocol
//!
//! ```text
//! client                                    service
//!   | --- {"action":"start", ...options} ---> |
//!   | <-------- {"state":"listening"} ------- |
//!   | --- binary audio (<= 1024 bytes) -----> |
//!   | <-------- {"results":[...]} ----------- |
//!   | --- {"action":"stop"} ----------------> |
//!   | <-------- {"state":"listening"} ------- |
//!   | --- close ----------------------------> |
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use watson_speech::core::stt::watson::{
//!     AudioSource, RecognizeOptions, RecognizeRequest, recognize_using_websocket,
//! };
//! use watson_speech::core::stt::{RecognizeCallback, SpeechAlternative};
//!
//! struct Printer;
//!
//! impl RecognizeCallback for Printer {
//!     fn on_transcription(&self, transcripts: &[Vec<SpeechAlternative>]) {
//!         for alternatives in transcripts {
//!             if let Some(best) = alternatives.first() {
//!                 println!("{}", best.transcript);
//!             }
//!         }
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let audio = AudioSource::from_file("speech.flac").await?;
//! let options = RecognizeOptions::new().with_content_type("audio/flac");
//! let request = RecognizeRequest::default().with_bearer_token("token");
//! recognize_using_websocket(audio, options, Arc::new(Printer), &request).await;
//! # Ok(())
//! # }
//! ```

mod audio;
mod client;
mod config;
mod messages;
mod request;


pub use audio::{AUDIO_CHUNK_SIZE, AudioQueue, AudioQueueProducer, AudioSource, SEND_INTERVAL};
pub use client::{RecognizeSession, recognize_using_websocket};
pub use config::RecognizeOptions;
pub use messages::{
    INACTIVITY_TIMEOUT_PREFIX, RecognitionResult, StartMessage, StopMessage, WatsonMessage,
};
pub use request::{DEFAULT_SERVICE_URL, RECOGNIZE_PATH, RecognizeRequest};
