//! Recognition parameters sent in the start message.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Start-message key owned by the session.
const ACTION_KEY: &str = "action";

/// Options for a WebSocket recognition request.
///
/// These are the parameters the service reads from the `start` message.
/// Unset fields are omitted so the service defaults apply. Parameters not
/// modeled here can be passed through [`RecognizeOptions::with_extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizeOptions {
    /// MIME type of the audio, e.g. `audio/l16;rate=16000`
    #[serde(rename = "content-type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Seconds of silence after which the service reports an inactivity timeout (-1 disables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactivity_timeout: Option<i32>,

    /// Deliver hypotheses while speech is in progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interim_results: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords_threshold: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_alternatives: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_alternatives_threshold: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_confidence: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profanity_filter: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_formatting: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_labels: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redaction: Option<bool>,

    /// Additional start-message parameters, passed through unchanged
    #[serde(flatten, deserialize_with = "deserialize_extra")]
    extra: serde_json::Map<String, serde_json::Value>,
}

fn deserialize_extra<'de, D>(
    deserializer: D,
) -> Result<serde_json::Map<String, serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut extra = serde_json::Map::deserialize(deserializer)?;
    if extra.remove(ACTION_KEY).is_some() {
        warn!("Ignoring reserved start parameter '{}'", ACTION_KEY);
    }
    Ok(extra)
}

impl RecognizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether results are delivered in interim (hypothesis) mode.
    #[inline]
    pub fn is_interim(&self) -> bool {
        self.interim_results == Some(true)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_interim_results(mut self, interim_results: bool) -> Self {
        self.interim_results = Some(interim_results);
        self
    }

    pub fn with_inactivity_timeout(mut self, seconds: i32) -> Self {
        self.inactivity_timeout = Some(seconds);
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>, threshold: f32) -> Self {
        self.keywords = Some(keywords);
        self.keywords_threshold = Some(threshold);
        self
    }

    pub fn with_max_alternatives(mut self, max_alternatives: u32) -> Self {
        self.max_alternatives = Some(max_alternatives);
        self
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    pub fn with_speaker_labels(mut self, speaker_labels: bool) -> Self {
        self.speaker_labels = Some(speaker_labels);
        self
    }

    pub fn with_smart_formatting(mut self, smart_formatting: bool) -> Self {
        self.smart_formatting = Some(smart_formatting);
        self
    }

    /// Set any start-message parameter by its wire name.
    ///
    /// Names with a dedicated field (`interim_results`, `content-type`, ...)
    /// update that field. A value of the wrong type for such a field is
    /// ignored. `action` is reserved for the session and is ignored too.
    pub fn with_extra(self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let key = key.into();
        if key == ACTION_KEY {
            warn!("Ignoring reserved start parameter '{}'", ACTION_KEY);
            return self;
        }

        let mut params = match serde_json::to_value(&self) {
            Ok(serde_json::Value::Object(params)) => params,
            _ => return self,
        };
        params.insert(key.clone(), value);

        match serde_json::from_value(serde_json::Value::Object(params)) {
            Ok(options) => options,
            Err(e) => {
                warn!("Ignoring start parameter '{}': {}", key, e);
                self
            }
        }
    }

    /// Parameters without a dedicated field.
    pub fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extra
    }
}
