//! WebSocket message types for the Watson recognize endpoint.
//!
//! - **Outgoing**: [`StartMessage`] (options plus `"action": "start"`), raw
//!   binary audio frames, and [`StopMessage`].
//! - **Incoming**: JSON text frames classified by [`WatsonMessage::parse`]
//!   into state notifications, errors, and results.

use serde::{Deserialize, Serialize};

use super::config::RecognizeOptions;
use crate::core::stt::base::SpeechAlternative;

/// Prefix the service uses for its inactivity timeout notification.
pub const INACTIVITY_TIMEOUT_PREFIX: &str = "No speech detected for";

// =============================================================================
// Outgoing Messages (Client to Server)
// =============================================================================

/// First message of a session: the recognition options with the start action.
#[derive(Debug)]
pub struct StartMessage<'a> {
    pub action: &'static str,
    pub options: &'a RecognizeOptions,
}

impl<'a> StartMessage<'a> {
    pub fn new(options: &'a RecognizeOptions) -> Self {
        Self {
            action: "start",
            options,
        }
    }

    /// The options object with `action` written last, so it always wins.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut message = match serde_json::to_value(self.options)? {
            serde_json::Value::Object(params) => params,
            _ => serde_json::Map::new(),
        };
        message.insert("action".to_string(), self.action.into());
        serde_json::to_string(&message)
    }
}

/// Last message of a session, sent once the audio source is exhausted.
#[derive(Debug, Serialize)]
pub struct StopMessage {
    pub action: &'static str,
}

impl Default for StopMessage {
    fn default() -> Self {
        Self { action: "stop" }
    }
}

impl StopMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Incoming Messages (Server to Client)
// =============================================================================

/// One entry of the `results` array.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionResult {
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default)]
    pub alternatives: Vec<SpeechAlternative>,
}

/// Classified inbound message.
#[derive(Debug)]
pub enum WatsonMessage {
    /// `{"error": ...}`
    Error(String),
    /// `{"state": ...}`; the first one means listening, the second acknowledges stop
    State(String),
    /// `{"results": [...]}` and/or `{"speaker_labels": [...]}`
    Results {
        results: Option<Vec<RecognitionResult>>,
        raw: serde_json::Value,
    },
    /// Valid JSON of no known shape
    Unknown(serde_json::Value),
}

impl WatsonMessage {
    /// Parse and classify a text frame.
    ///
    /// Classification is by field presence with precedence
    /// `error` > `state` > `results`/`speaker_labels`.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        if let Some(error) = value.get("error") {
            return Ok(WatsonMessage::Error(value_to_text(error)));
        }

        if let Some(state) = value.get("state") {
            return Ok(WatsonMessage::State(value_to_text(state)));
        }

        if value.get("results").is_some() || value.get("speaker_labels").is_some() {
            let results = match value.get("results") {
                Some(results) => Some(Vec::<RecognitionResult>::deserialize(results)?),
                None => None,
            };
            return Ok(WatsonMessage::Results {
                results,
                raw: value,
            });
        }

        Ok(WatsonMessage::Unknown(value))
    }

    /// Whether this is an inactivity timeout notification rather than a failure.
    pub fn is_inactivity_timeout(&self) -> bool {
        matches!(self, WatsonMessage::Error(e) if e.starts_with(INACTIVITY_TIMEOUT_PREFIX))
    }
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_message_injects_action() {
        let options = RecognizeOptions::new()
            .with_content_type("audio/wav")
            .with_interim_results(true);
        let json: serde_json::Value =
            serde_json::from_str(&StartMessage::new(&options).to_json().unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "action": "start",
                "content-type": "audio/wav",
                "interim_results": true
            })
        );
    }

    #[test]
    fn test_start_message_action_cannot_be_replaced() {
        let options: RecognizeOptions =
            serde_json::from_str(r#"{"action": "stop", "content-type": "audio/flac"}"#).unwrap();
        let text = StartMessage::new(&options).to_json().unwrap();

        assert_eq!(text.matches("\"action\"").count(), 1);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "start", "content-type": "audio/flac"})
        );
    }

    #[test]
    fn test_start_message_interim_from_extra_matches_mode() {
        let options = RecognizeOptions::new().with_extra("interim_results", serde_json::json!(true));
        let json: serde_json::Value =
            serde_json::from_str(&StartMessage::new(&options).to_json().unwrap()).unwrap();

        assert_eq!(json["interim_results"], true);
        assert!(options.is_interim());
    }

    #[test]
    fn test_stop_message() {
        assert_eq!(StopMessage::default().to_json().unwrap(), r#"{"action":"stop"}"#);
    }

    #[test]
    fn test_parse_state() {
        let msg = WatsonMessage::parse(r#"{"state": "listening"}"#).unwrap();
        assert!(matches!(msg, WatsonMessage::State(s) if s == "listening"));
    }

    #[test]
    fn test_parse_error_variants() {
        let timeout = WatsonMessage::parse(r#"{"error": "No speech detected for 5s"}"#).unwrap();
        assert!(timeout.is_inactivity_timeout());

        let failure = WatsonMessage::parse(r#"{"error": "internal failure"}"#).unwrap();
        assert!(!failure.is_inactivity_timeout());
        assert!(matches!(failure, WatsonMessage::Error(e) if e == "internal failure"));
    }

    #[test]
    fn test_error_takes_precedence_over_state() {
        let msg = WatsonMessage::parse(r#"{"state": "listening", "error": "oops"}"#).unwrap();
        assert!(matches!(msg, WatsonMessage::Error(_)));
    }

    #[test]
    fn test_parse_results() {
        let text = r#"{
            "result_index": 0,
            "results": [
                {"final": true, "alternatives": [
                    {"transcript": "hello world ", "confidence": 0.94},
                    {"transcript": "hello word "}
                ]}
            ]
        }"#;

        match WatsonMessage::parse(text).unwrap() {
            WatsonMessage::Results { results, raw } => {
                let results = results.unwrap();
                assert_eq!(results.len(), 1);
                assert!(results[0].is_final);
                assert_eq!(results[0].alternatives.len(), 2);
                assert_eq!(results[0].alternatives[0].confidence, Some(0.94));
                assert_eq!(raw["result_index"], 0);
            }
            other => panic!("Expected Results, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_speaker_labels_only() {
        let text = r#"{"speaker_labels": [{"from": 0.1, "to": 0.5, "speaker": 0, "confidence": 0.5, "final": false}]}"#;
        match WatsonMessage::parse(text).unwrap() {
            WatsonMessage::Results { results, .. } => assert!(results.is_none()),
            other => panic!("Expected Results, got {other:?}"),
        }
    }

    #[test]
    fn test_result_defaults() {
        match WatsonMessage::parse(r#"{"results": [{}]}"#).unwrap() {
            WatsonMessage::Results { results, .. } => {
                let results = results.unwrap();
                assert!(!results[0].is_final);
                assert!(results[0].alternatives.is_empty());
            }
            other => panic!("Expected Results, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(WatsonMessage::parse("not json").is_err());
        assert!(WatsonMessage::parse(r#"{"results": "nope"}"#).is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let msg = WatsonMessage::parse(r#"{"warnings": ["Unknown arguments"]}"#).unwrap();
        assert!(matches!(msg, WatsonMessage::Unknown(_)));
    }
}
