//! Recognize session driver.
//!
//! A session owns one WebSocket connection for its whole lifetime:
//!
//! 1. connect, then send the start message
//! 2. on the first `state` message, spawn the audio sender
//! 3. the sender streams binary frames and finishes with the stop message
//! 4. on the second `state` message, report `on_close` and close the transport
//!
//! Inbound messages are classified and dispatched to the callback sink
//! throughout, independent of the handshake above.

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use super::audio::{AudioSource, SEND_INTERVAL};
use super::config::RecognizeOptions;
use super::messages::{RecognitionResult, StartMessage, StopMessage, WatsonMessage};
use super::request::RecognizeRequest;
use crate::core::stt::base::{RecognizeCallback, STTError, SessionEnd};

/// Frames queued by the audio sender for the connection task.
#[derive(Debug)]
enum Outbound {
    Audio(Bytes),
    Stop,
    SourceFailed(String),
}

/// What an inbound text frame means for the session handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Continue,
    /// First `state` message: start streaming audio
    StartListening,
    /// Second `state` message: the stop was acknowledged
    Close,
}

/// A single streaming recognition request.
pub struct RecognizeSession {
    audio: AudioSource,
    options: RecognizeOptions,
    callback: Arc<dyn RecognizeCallback>,
    url: String,
    headers: HeaderMap,
}

impl std::fmt::Debug for RecognizeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizeSession")
            .field("audio", &self.audio)
            .field("options", &self.options)
            .field("url", &self.url)
            .field("headers", &self.headers.len())
            .finish()
    }
}

impl RecognizeSession {
    pub fn new(
        audio: AudioSource,
        options: RecognizeOptions,
        callback: Arc<dyn RecognizeCallback>,
        url: impl Into<String>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            audio,
            options,
            callback,
            url: url.into(),
            headers,
        }
    }

    /// Build a session targeting the endpoint described by `request`.
    pub fn from_request(
        audio: AudioSource,
        options: RecognizeOptions,
        callback: Arc<dyn RecognizeCallback>,
        request: &RecognizeRequest,
    ) -> Result<Self, STTError> {
        let url = request.websocket_url()?;
        let headers = request.headers()?;
        Ok(Self::new(audio, options, callback, url.as_str(), headers))
    }

    /// Drive the session until the connection ends.
    ///
    /// All failures are reported through `on_error`; the returned value only
    /// says how the session ended.
    pub async fn run(self) -> SessionEnd {
        let Self {
            audio,
            options,
            callback,
            url,
            headers,
        } = self;
        let interim = options.is_interim();

        let mut request = match url.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => {
                let stt_error =
                    STTError::ConnectionFailed(format!("Invalid recognize URL '{url}': {e}"));
                error!("{}", stt_error);
                callback.on_error(&stt_error.to_string());
                return SessionEnd::Failed;
            }
        };
        request.headers_mut().extend(headers);

        let (ws_stream, _response) = match connect_async(request).await {
            Ok(result) => result,
            Err(e) => {
                let stt_error = STTError::ConnectionFailed(format!(
                    "Failed to connect to recognize endpoint: {e}"
                ));
                error!("{}", stt_error);
                callback.on_error(&stt_error.to_string());
                return SessionEnd::Failed;
            }
        };

        info!("Connected to recognize WebSocket");
        callback.on_connected();

        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        let start = match StartMessage::new(&options).to_json() {
            Ok(json) => json,
            Err(e) => {
                let stt_error =
                    STTError::ProtocolError(format!("Failed to serialize start message: {e}"));
                error!("{}", stt_error);
                callback.on_error(&stt_error.to_string());
                let _ = ws_sink.send(Message::Close(None)).await;
                return SessionEnd::Failed;
            }
        };

        if let Err(e) = ws_sink.send(Message::Text(start.into())).await {
            let stt_error = STTError::NetworkError(format!("Failed to send start message: {e}"));
            error!("{}", stt_error);
            callback.on_error(&stt_error.to_string());
            return SessionEnd::Failed;
        }
        debug!("Sent start message");

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(32);
        let mut audio = Some(audio);
        let mut sender: Option<JoinHandle<()>> = None;
        let mut listening = false;

        let end = loop {
            tokio::select! {
                Some(outbound) = outbound_rx.recv() => {
                    let message = match outbound {
                        Outbound::Audio(chunk) => Message::Binary(chunk),
                        Outbound::Stop => match StopMessage::default().to_json() {
                            Ok(json) => {
                                debug!("Audio exhausted, sending stop message");
                                Message::Text(json.into())
                            }
                            Err(e) => {
                                let stt_error = STTError::ProtocolError(format!(
                                    "Failed to serialize stop message: {e}"
                                ));
                                error!("{}", stt_error);
                                callback.on_error(&stt_error.to_string());
                                continue;
                            }
                        },
                        Outbound::SourceFailed(reason) => {
                            callback.on_error(&reason);
                            continue;
                        }
                    };

                    if let Err(e) = ws_sink.send(message).await {
                        let stt_error = STTError::NetworkError(format!(
                            "Failed to send to recognize endpoint: {e}"
                        ));
                        error!("{}", stt_error);
                        callback.on_error(&stt_error.to_string());
                        break SessionEnd::Failed;
                    }
                }

                message = ws_stream.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            match handle_text_message(
                                text.as_str(),
                                interim,
                                &mut listening,
                                callback.as_ref(),
                            ) {
                                Transition::Continue => {}
                                Transition::StartListening => {
                                    if let Some(audio) = audio.take() {
                                        sender = Some(tokio::spawn(stream_audio(
                                            audio,
                                            outbound_tx.clone(),
                                        )));
                                    }
                                }
                                Transition::Close => {
                                    info!("Stop acknowledged, closing recognize WebSocket");
                                    callback.on_close();
                                    let _ = ws_sink.send(Message::Close(None)).await;
                                    break SessionEnd::Closed;
                                }
                            }
                        }
                        Some(Ok(Message::Close(close_frame))) => {
                            info!("Recognize WebSocket closed by server: {:?}", close_frame);
                            callback.on_close();
                            break SessionEnd::Closed;
                        }
                        Some(Ok(Message::Binary(data))) => {
                            debug!("Ignoring {} bytes of binary data from server", data.len());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let stt_error =
                                STTError::NetworkError(format!("WebSocket error: {e}"));
                            error!("{}", stt_error);
                            callback.on_error(&stt_error.to_string());
                            break SessionEnd::Failed;
                        }
                        None => {
                            let stt_error = STTError::NetworkError(
                                "connection closed unexpectedly".to_string(),
                            );
                            warn!("{}", stt_error);
                            callback.on_error(&stt_error.to_string());
                            break SessionEnd::Failed;
                        }
                    }
                }
            }
        };

        if let Some(handle) = sender {
            handle.abort();
            let _ = handle.await;
        }

        info!("Recognize session ended: {:?}", end);
        end
    }
}

/// Classify one inbound text frame and invoke the matching callbacks.
pub(crate) fn handle_text_message(
    text: &str,
    interim: bool,
    listening: &mut bool,
    callback: &dyn RecognizeCallback,
) -> Transition {
    let message = match WatsonMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            let stt_error = STTError::ProtocolError(format!("Failed to parse message: {e}"));
            warn!("{}", stt_error);
            callback.on_error(&stt_error.to_string());
            return Transition::Continue;
        }
    };

    let inactivity = message.is_inactivity_timeout();
    match message {
        WatsonMessage::Error(error_text) => {
            if inactivity {
                info!("Inactivity timeout: {}", error_text);
                callback.on_inactivity_timeout(&error_text);
            } else {
                error!("Recognize service error: {}", error_text);
                callback.on_error(&error_text);
            }
            Transition::Continue
        }
        WatsonMessage::State(state) => {
            if *listening {
                debug!("Received closing state: {}", state);
                Transition::Close
            } else {
                info!("Service is listening ({})", state);
                *listening = true;
                callback.on_listening();
                Transition::StartListening
            }
        }
        WatsonMessage::Results { results, raw } => {
            if let Some(results) = results {
                dispatch_results(&results, interim, callback);
            }
            callback.on_data(&raw);
            Transition::Continue
        }
        WatsonMessage::Unknown(raw) => {
            debug!("Received unknown message: {}", raw);
            Transition::Continue
        }
    }
}

fn dispatch_results(results: &[RecognitionResult], interim: bool, callback: &dyn RecognizeCallback) {
    if interim {
        let Some(first) = results.first() else {
            return;
        };
        if first.is_final {
            callback.on_transcription(std::slice::from_ref(&first.alternatives));
        }
        if let Some(top) = first.alternatives.first().filter(|a| !a.transcript.is_empty()) {
            callback.on_hypothesis(&top.transcript);
        }
    } else {
        let transcripts: Vec<_> = results.iter().map(|r| r.alternatives.clone()).collect();
        callback.on_transcription(&transcripts);
    }
}

/// Read the source to exhaustion, one frame per [`SEND_INTERVAL`], then queue the stop message.
async fn stream_audio(mut audio: AudioSource, tx: mpsc::Sender<Outbound>) {
    let mut frames = 0usize;
    loop {
        match audio.next_chunk().await {
            Ok(Some(chunk)) => {
                if tx.send(Outbound::Audio(chunk)).await.is_err() {
                    debug!("Session ended before audio was exhausted");
                    return;
                }
                frames += 1;
                tokio::time::sleep(SEND_INTERVAL).await;
            }
            Ok(None) => break,
            Err(e) => {
                let stt_error = STTError::AudioSourceError(format!("Failed to read audio: {e}"));
                error!("{}", stt_error);
                let _ = tx.send(Outbound::SourceFailed(stt_error.to_string())).await;
                break;
            }
        }
    }

    debug!("Queued {} audio frames", frames);
    let _ = tx.send(Outbound::Stop).await;
}

/// Run a recognition session against `request`, returning once it ends.
///
/// Request building failures are reported through `on_error` like any
/// other session failure.
pub async fn recognize_using_websocket(
    audio: AudioSource,
    options: RecognizeOptions,
    callback: Arc<dyn RecognizeCallback>,
    request: &RecognizeRequest,
) -> SessionEnd {
    match RecognizeSession::from_request(audio, options, callback.clone(), request) {
        Ok(session) => session.run().await,
        Err(e) => {
            error!("{}", e);
            callback.on_error(&e.to_string());
            SessionEnd::Failed
        }
    }
}
