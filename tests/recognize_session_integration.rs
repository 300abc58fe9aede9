//! Integration tests for the streaming recognize session
//!
//! A local WebSocket server plays the recognize endpoint. These tests verify:
//! - File and live-queue audio sources end to end
//! - Request building (path, query, auth) through `recognize_using_websocket`
//! - Failure reporting through the callback sink

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{accept_async, accept_hdr_async};
use watson_speech::core::stt::{
    AudioQueue, AudioSource, RecognizeCallback, RecognizeOptions, RecognizeRequest,
    RecognizeSession, SessionEnd, SpeechAlternative, recognize_using_websocket,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct Transcript {
    finals: Mutex<Vec<String>>,
    hypotheses: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    closed: Mutex<usize>,
}

impl RecognizeCallback for Transcript {
    fn on_hypothesis(&self, hypothesis: &str) {
        self.hypotheses.lock().push(hypothesis.to_string());
    }

    fn on_transcription(&self, transcripts: &[Vec<SpeechAlternative>]) {
        let mut finals = self.finals.lock();
        for alternatives in transcripts {
            if let Some(best) = alternatives.first() {
                finals.push(best.transcript.clone());
            }
        }
    }

    fn on_error(&self, error: &str) {
        self.errors.lock().push(error.to_string());
    }

    fn on_close(&self) {
        *self.closed.lock() += 1;
    }
}

/// Received by the fake service during one session.
#[derive(Debug, Default)]
struct Received {
    start: Option<serde_json::Value>,
    audio_bytes: usize,
    frames: usize,
    largest_frame: usize,
}

/// Serve one session, answering the stop with one final result before acknowledging it.
async fn fake_service(listener: TcpListener, reply: &'static str) -> Received {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    let mut received = Received::default();

    if let Some(Ok(Message::Text(text))) = ws.next().await {
        received.start = serde_json::from_str(text.as_str()).ok();
    }
    ws.send(Message::Text(r#"{"state":"listening"}"#.into()))
        .await
        .unwrap();

    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Binary(data) => {
                received.frames += 1;
                received.audio_bytes += data.len();
                received.largest_frame = received.largest_frame.max(data.len());
            }
            Message::Text(_) => break,
            _ => {}
        }
    }

    ws.send(Message::Text(reply.into())).await.unwrap();
    ws.send(Message::Text(r#"{"state":"listening"}"#.into()))
        .await
        .unwrap();
    while let Some(Ok(message)) = ws.next().await {
        if message.is_close() {
            break;
        }
    }

    received
}

#[tokio::test]
async fn test_file_source_batch_mode() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/v1/recognize", listener.local_addr().unwrap());
    let server = tokio::spawn(fake_service(
        listener,
        r#"{"results":[{"final":true,"alternatives":[{"transcript":"thunderstorms could produce large hail ","confidence":0.96}]},{"final":true,"alternatives":[{"transcript":"isolated tornadoes ","confidence":0.9}]}],"result_index":0}"#,
    ));

    let dir = tempfile::tempdir().unwrap();
    let audio_path = dir.path().join("speech.raw");
    std::fs::write(&audio_path, vec![3u8; 10_000]).unwrap();

    let transcript = Arc::new(Transcript::default());
    let session = RecognizeSession::new(
        AudioSource::from_file(&audio_path).await.unwrap(),
        RecognizeOptions::new().with_content_type("audio/l16;rate=16000"),
        transcript.clone(),
        url,
        Default::default(),
    );
    assert_eq!(session.run().await, SessionEnd::Closed);

    let received = server.await.unwrap();
    assert_eq!(received.audio_bytes, 10_000);
    assert_eq!(received.frames, 10);
    assert_eq!(received.largest_frame, 1024);
    assert_eq!(received.start.unwrap()["action"], "start");

    assert_eq!(
        *transcript.finals.lock(),
        vec![
            "thunderstorms could produce large hail ".to_string(),
            "isolated tornadoes ".to_string()
        ]
    );
    assert!(transcript.hypotheses.lock().is_empty());
    assert!(transcript.errors.lock().is_empty());
    assert_eq!(*transcript.closed.lock(), 1);
}

#[tokio::test]
async fn test_live_queue_source() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/v1/recognize", listener.local_addr().unwrap());
    let server = tokio::spawn(fake_service(
        listener,
        r#"{"results":[{"final":true,"alternatives":[{"transcript":"hello "}]}],"result_index":0}"#,
    ));

    let (producer, queue) = AudioQueue::channel();
    let recorder = tokio::spawn(async move {
        for _ in 0..5 {
            producer.push(vec![1u8; 1500]);
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        producer.stop_recording();
    });

    let transcript = Arc::new(Transcript::default());
    let session = RecognizeSession::new(
        AudioSource::from_queue(queue),
        RecognizeOptions::new().with_interim_results(true),
        transcript.clone(),
        url,
        Default::default(),
    );
    assert_eq!(session.run().await, SessionEnd::Closed);
    recorder.await.unwrap();

    let received = server.await.unwrap();
    assert_eq!(received.audio_bytes, 7500);
    // Each 1500-byte capture becomes one full frame and one remainder.
    assert_eq!(received.frames, 10);
    assert_eq!(received.start.unwrap()["interim_results"], true);

    assert_eq!(*transcript.finals.lock(), vec!["hello ".to_string()]);
    assert_eq!(*transcript.hypotheses.lock(), vec!["hello ".to_string()]);
}

#[tokio::test]
async fn test_recognize_using_websocket_with_basic_auth() {
    init_tracing();
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let service_url = format!("http://{}/speech-to-text/api", listener.local_addr().unwrap());
    let handshake: Arc<Mutex<Option<(String, String)>>> = Arc::new(Mutex::new(None));

    let seen = handshake.clone();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_hdr_async(stream, |req: &Request, resp: Response| {
            let auth = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            *seen.lock() = Some((req.uri().to_string(), auth));
            Ok::<Response, ErrorResponse>(resp)
        })
        .await
        .unwrap();

        let _start = ws.next().await;
        ws.send(Message::Text(r#"{"state":"listening"}"#.into()))
            .await
            .unwrap();
        while let Some(Ok(message)) = ws.next().await {
            if message.is_text() {
                break;
            }
        }
        ws.send(Message::Text(r#"{"state":"listening"}"#.into()))
            .await
            .unwrap();
        while let Some(Ok(message)) = ws.next().await {
            if message.is_close() {
                break;
            }
        }
    });

    let request = RecognizeRequest::new(service_url)
        .with_model("en-US_BroadbandModel")
        .with_learning_opt_out(true)
        .with_basic_auth("apikey", "secret");
    let transcript = Arc::new(Transcript::default());

    let end = recognize_using_websocket(
        AudioSource::from_bytes(vec![0u8; 2048]),
        RecognizeOptions::new(),
        transcript.clone(),
        &request,
    )
    .await;
    assert_eq!(end, SessionEnd::Closed);
    server.await.unwrap();

    let (uri, auth) = handshake.lock().clone().unwrap();
    assert_eq!(
        uri,
        "/speech-to-text/api/v1/recognize?model=en-US_BroadbandModel&x-watson-learning-opt-out=true"
    );
    assert_eq!(auth, "Basic YXBpa2V5OnNlY3JldA==");
    assert_eq!(*transcript.closed.lock(), 1);
}

#[tokio::test]
async fn test_invalid_request_reported_through_callback() {
    init_tracing();
    let transcript = Arc::new(Transcript::default());
    let end = recognize_using_websocket(
        AudioSource::from_bytes(vec![0u8; 16]),
        RecognizeOptions::new(),
        transcript.clone(),
        &RecognizeRequest::new("not a url"),
    )
    .await;

    assert_eq!(end, SessionEnd::Failed);
    let errors = transcript.errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Invalid service URL"));
    assert_eq!(*transcript.closed.lock(), 0);
}

#[tokio::test]
async fn test_service_error_does_not_end_session() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/v1/recognize", listener.local_addr().unwrap());
    let server = tokio::spawn(fake_service(
        listener,
        r#"{"error":"Model en-XX_BroadbandModel not found"}"#,
    ));

    let transcript = Arc::new(Transcript::default());
    let session = RecognizeSession::new(
        AudioSource::from_bytes(vec![0u8; 100]),
        RecognizeOptions::new(),
        transcript.clone(),
        url,
        Default::default(),
    );
    assert_eq!(session.run().await, SessionEnd::Closed);
    server.await.unwrap();

    assert_eq!(
        *transcript.errors.lock(),
        vec!["Model en-XX_BroadbandModel not found".to_string()]
    );
    assert_eq!(*transcript.closed.lock(), 1);
}
