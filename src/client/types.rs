use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images_base64: Vec<String>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
            images_base64: Vec::new(),
            stream: false,
        }
    }

    /// Attaches an already-encoded image; the bytes are sent base64 encoded.
    pub fn with_image(mut self, bytes: &[u8]) -> Self {
        use base64::Engine;
        self.images_base64
            .push(base64::engine::general_purpose::STANDARD.encode(bytes));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default = "default_health_status", deserialize_with = "lenient_status")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub services_status: HashMap<String, Value>,
}

impl HealthResponse {
    /// Interprets the body of a successful health call. Liveness is the 2xx
    /// status itself, so any body is accepted: an object is read field by
    /// field, plain text becomes the status, and an empty body reads as `ok`.
    pub fn from_body(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if text.is_empty() {
            return Self::with_status(default_health_status());
        }

        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => {
                let healthy_flag = map
                    .get("healthy")
                    .and_then(Value::as_bool)
                    .filter(|_| !map.contains_key("status"));
                let mut health: Self = serde_json::from_value(Value::Object(map))
                    .unwrap_or_else(|_| Self::with_status(default_health_status()));
                if let Some(flag) = healthy_flag {
                    health.status = flag_status(flag);
                }
                health
            }
            Ok(Value::String(status)) => Self::with_status(status),
            Ok(Value::Bool(flag)) => Self::with_status(flag_status(flag)),
            Ok(other) => Self::with_status(other.to_string()),
            Err(_) => Self::with_status(text.to_string()),
        }
    }

    fn with_status(status: String) -> Self {
        Self {
            status,
            timestamp: None,
            version: None,
            environment: None,
            services_status: HashMap::new(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "ok" | "healthy" | "alive" | "ready" | "up" | "true"
        )
    }
}

fn default_health_status() -> String {
    "ok".to_string()
}

fn flag_status(flag: bool) -> String {
    let status = if flag { "ok" } else { "unhealthy" };
    status.to_string()
}

// Accepts `"ok"`, `true`/`false` or a number for the status field.
fn lenient_status<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Bool(flag) => flag_status(flag),
        Value::Null => default_health_status(),
        other => other.to_string(),
    })
}

// The service emits naive UTC timestamps; anything unparsable is dropped.
pub(crate) fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}

pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageClassifyResponse {
    pub label: String,
    pub score: f64,
}

impl ImageClassifyResponse {
    pub fn is_valid_score(&self) -> bool {
        self.score.is_finite() && (0.0..=1.0).contains(&self.score)
    }

    /// Score as a whole percentage, e.g. `0.87` -> `"87%"`.
    pub fn confidence_percent(&self) -> String {
        format!("{}%", (self.score * 100.0).round() as u32)
    }
}

#[derive(Debug, Clone)]
pub struct VoiceRequest {
    pub audio: Vec<u8>,
    pub filename: String,
    pub session_id: Option<String>,
    pub tts: bool,
    pub language: Option<String>,
}

impl VoiceRequest {
    pub fn new(audio: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            audio,
            filename: filename.into(),
            session_id: None,
            tts: true,
            language: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceTranscript {
    pub transcript: String,
    pub reply: String,
    #[serde(default)]
    pub tool_calls: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceReply {
    Audio(SpeechAudio),
    Transcript(VoiceTranscript),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl SpeechAudio {
    pub fn extension(&self) -> &'static str {
        if self.media_type.starts_with("audio/mpeg") {
            "mp3"
        } else {
            "wav"
        }
    }
}

/// Structured error body. Services that answer with `{detail}` or `{error}`
/// are mapped onto this shape with kind `"http"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub kind: String,
    pub message: String,
}

impl ApiErrorBody {
    pub fn parse(body: &[u8]) -> Option<Self> {
        if let Ok(tagged) = serde_json::from_slice::<ApiErrorBody>(body) {
            return Some(tagged);
        }

        let value: Value = serde_json::from_slice(body).ok()?;
        let message = ["detail", "error"]
            .iter()
            .find_map(|key| value.get(*key))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })?;

        Some(Self {
            kind: "http".to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_chat_request_serialization_omits_empty_images() {
        let request = ChatRequest::new("default", "What fertilizer is best for wheat?");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "What fertilizer is best for wheat?",
                "session_id": "default",
                "stream": false
            })
        );
    }

    #[test]
    fn test_chat_request_with_image_is_base64() {
        let request = ChatRequest::new("s1", "look").with_image(b"abc");
        assert_eq!(request.images_base64, vec!["YWJj".to_string()]);
    }

    #[test]
    fn test_health_response_minimal() {
        let health: HealthResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(health.is_healthy());
        assert!(health.timestamp.is_none());
        assert!(health.services_status.is_empty());
    }

    #[test]
    fn test_health_response_naive_timestamp() {
        let health: HealthResponse = serde_json::from_value(json!({
            "status": "healthy",
            "timestamp": "2024-05-01T10:20:30.123456",
            "version": "1.0.0",
            "environment": "development",
            "services_status": {"database": "healthy"},
            "system_info": {"cpu_count": 8}
        }))
        .unwrap();
        assert!(health.is_healthy());
        assert_eq!(
            health.timestamp.unwrap().to_rfc3339(),
            "2024-05-01T10:20:30.123456+00:00"
        );
        assert_eq!(health.services_status["database"], "healthy");
    }

    #[test]
    fn test_health_from_loose_bodies() {
        assert_eq!(HealthResponse::from_body(b"").status, "ok");
        assert_eq!(HealthResponse::from_body(b"OK\n").status, "OK");
        assert_eq!(HealthResponse::from_body(br#"{"status": true}"#).status, "ok");
        assert_eq!(HealthResponse::from_body(br#"{"healthy": true}"#).status, "ok");
        assert_eq!(
            HealthResponse::from_body(br#"{"healthy": false}"#).status,
            "unhealthy"
        );
        assert_eq!(HealthResponse::from_body(br#""alive""#).status, "alive");
        assert!(HealthResponse::from_body(br#"{"status": 1}"#).status == "1");
    }

    #[test]
    fn test_health_from_body_keeps_full_shape() {
        let health = HealthResponse::from_body(
            br#"{"status":"healthy","version":"1.0.0","services_status":{"llm":{"up":true}}}"#,
        );
        assert!(health.is_healthy());
        assert_eq!(health.version.as_deref(), Some("1.0.0"));
        assert_eq!(health.services_status["llm"], json!({"up": true}));
    }

    #[test]
    fn test_degraded_is_not_healthy() {
        let health: HealthResponse = serde_json::from_str(r#"{"status":"degraded"}"#).unwrap();
        assert!(!health.is_healthy());
    }

    #[test]
    fn test_confidence_percent() {
        let result = ImageClassifyResponse {
            label: "Early Blight".to_string(),
            score: 0.87,
        };
        assert_eq!(result.confidence_percent(), "87%");
        assert!(result.is_valid_score());
    }

    #[test]
    fn test_invalid_scores() {
        for score in [-0.1, 1.5, f64::NAN] {
            let result = ImageClassifyResponse {
                label: "x".to_string(),
                score,
            };
            assert!(!result.is_valid_score());
        }
    }

    #[test]
    fn test_error_body_tagged() {
        let body = ApiErrorBody::parse(br#"{"kind":"validation","message":"empty"}"#).unwrap();
        assert_eq!(body.kind, "validation");
        assert_eq!(body.message, "empty");
    }

    #[test]
    fn test_error_body_detail_fallback() {
        let body = ApiErrorBody::parse(br#"{"detail":"model not loaded"}"#).unwrap();
        assert_eq!(body.kind, "http");
        assert_eq!(body.message, "model not loaded");

        let body = ApiErrorBody::parse(br#"{"error":"Internal server error","status_code":500}"#)
            .unwrap();
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_error_body_unparsable() {
        assert!(ApiErrorBody::parse(b"<html>bad gateway</html>").is_none());
        assert!(ApiErrorBody::parse(br#"{"other":1}"#).is_none());
    }

    #[test]
    fn test_speech_extension() {
        let audio = SpeechAudio {
            bytes: vec![],
            media_type: "audio/mpeg".to_string(),
        };
        assert_eq!(audio.extension(), "mp3");
    }
}
