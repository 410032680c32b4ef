mod farm;
mod farm_types;
mod jpeg;
mod stream;
mod types;

pub use farm::*;
pub use farm_types::*;
pub use jpeg::{ImageInput, JPEG_MIME, encode_jpeg};
pub use stream::{TransportError, token_stream};
pub use types::*;

use crate::{Error, Result, config::ClientConfig};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use reqwest::{
    RequestBuilder, Response,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

pub const HEALTH_PATH: &str = "/v1/health";
pub const CHAT_PATH: &str = "/v1/chat";
pub const CLASSIFY_PATH: &str = "/v1/image/classify";
pub const VOICE_PATH: &str = "/v1/voice";
pub const TTS_PATH: &str = "/v1/tts";

pub type TokenStream = BoxStream<'static, Result<String>>;

/// Operations offered by the advisory service. Every call is a single round
/// trip with no retry.
#[async_trait]
pub trait AdvisorApi: Send + Sync {
    async fn check_health(&self) -> Result<HealthResponse>;

    async fn send_chat_message(&self, message: &str) -> Result<ChatResponse>;

    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    async fn stream_chat(&self, request: ChatRequest) -> Result<TokenStream>;

    async fn classify_image(&self, image: ImageInput) -> Result<ImageClassifyResponse>;

    async fn send_voice(&self, request: VoiceRequest) -> Result<VoiceReply>;

    async fn synthesize_speech(&self, text: &str, language: Option<&str>) -> Result<SpeechAudio>;
}

/// HTTP implementation of [`AdvisorApi`]. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct AdvisorClient {
    http: reqwest::Client,
    base_url: String,
    api_base_url: String,
    timeout_secs: u64,
    jpeg_quality: u8,
    session_id: String,
}

impl AdvisorClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .timeout(config.timeout())
            .build()
            .map_err(Error::Network)?;

        debug!(
            "Creating advisor client for {} (timeout {}s)",
            config.base_url, config.timeout_secs
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_base_url: config.api_base_url().trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            jpeg_quality: config.jpeg_quality,
            session_id: config.session_id.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns a client sharing this one's connection pool but chatting under `session_id`.
    pub fn with_session(&self, session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..self.clone()
        }
    }

    /// Returns a client bound to a freshly generated session id.
    pub fn with_new_session(&self) -> Self {
        self.with_session(Uuid::new_v4().to_string())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;

        let status = response.status();
        if status.is_success() {
            debug!("{} succeeded with status {}", operation, status);
            return Ok(response);
        }

        let body = response
            .bytes()
            .await
            .ok()
            .and_then(|bytes| ApiErrorBody::parse(&bytes));

        warn!("{} failed with status {}", operation, status);
        Err(Error::Service {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_response(format!("Failed to decode response body: {}", e)))
    }

    async fn read_audio(&self, response: Response) -> Result<SpeechAudio> {
        let media_type = content_type(&response).unwrap_or_else(|| "audio/wav".to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            media_type,
        })
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn validate_chat(request: &ChatRequest) -> Result<()> {
    if request.message.is_empty() {
        return Err(Error::validation("message must not be empty"));
    }
    if request.session_id.trim().is_empty() {
        return Err(Error::validation("session_id must not be empty"));
    }
    Ok(())
}

fn audio_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "amr" => "audio/amr",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl AdvisorApi for AdvisorClient {
    async fn check_health(&self) -> Result<HealthResponse> {
        debug!("Checking service health at {}", self.base_url);

        let request = self.http.get(self.endpoint(HEALTH_PATH));
        let response = self.execute(request, "health check").await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;
        Ok(HealthResponse::from_body(&body))
    }

    async fn send_chat_message(&self, message: &str) -> Result<ChatResponse> {
        self.send_chat(ChatRequest::new(self.session_id.clone(), message))
            .await
    }

    async fn send_chat(&self, mut request: ChatRequest) -> Result<ChatResponse> {
        validate_chat(&request)?;
        request.stream = false;

        debug!(
            "Sending chat message for session {} with {} image(s)",
            request.session_id,
            request.images_base64.len()
        );

        let builder = self.http.post(self.endpoint(CHAT_PATH)).json(&request);
        let response = self.execute(builder, "chat").await?;
        self.decode_json(response).await
    }

    async fn stream_chat(&self, mut request: ChatRequest) -> Result<TokenStream> {
        validate_chat(&request)?;
        request.stream = true;

        debug!("Streaming chat for session {}", request.session_id);

        let builder = self.http.post(self.endpoint(CHAT_PATH)).json(&request);
        let response = self.execute(builder, "chat stream").await?;
        Ok(token_stream(response.bytes_stream(), self.timeout_secs))
    }

    async fn classify_image(&self, image: ImageInput) -> Result<ImageClassifyResponse> {
        let quality = self.jpeg_quality;
        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(image, quality))
            .await
            .map_err(|e| Error::internal(format!("JPEG encoding task failed: {}", e)))??;

        debug!("Uploading {} byte JPEG for classification", jpeg.len());

        let part = Part::bytes(jpeg)
            .file_name("capture.jpg")
            .mime_str(JPEG_MIME)
            .map_err(Error::Network)?;
        let form = Form::new().part("file", part);

        let builder = self.http.post(self.endpoint(CLASSIFY_PATH)).multipart(form);
        let response = self.execute(builder, "image classification").await?;
        let result: ImageClassifyResponse = self.decode_json(response).await?;

        if !result.is_valid_score() {
            return Err(Error::invalid_response(format!(
                "classification score {} is outside [0, 1]",
                result.score
            )));
        }

        Ok(result)
    }

    async fn send_voice(&self, request: VoiceRequest) -> Result<VoiceReply> {
        if request.audio.is_empty() {
            return Err(Error::validation("audio must not be empty"));
        }

        let session_id = request
            .session_id
            .unwrap_or_else(|| self.session_id.clone());
        debug!(
            "Sending {} bytes of audio for session {}",
            request.audio.len(),
            session_id
        );

        let mime = audio_mime(&request.filename);
        let part = Part::bytes(request.audio)
            .file_name(request.filename)
            .mime_str(mime)
            .map_err(Error::Network)?;

        let mut form = Form::new()
            .text("session_id", session_id)
            .text("tts", request.tts.to_string())
            .part("audio", part);
        if let Some(language) = request.language {
            form = form.text("language", language);
        }

        let builder = self.http.post(self.endpoint(VOICE_PATH)).multipart(form);
        let response = self.execute(builder, "voice").await?;

        let is_audio = content_type(&response)
            .map(|ct| ct.starts_with("audio/"))
            .unwrap_or(false);
        if is_audio {
            Ok(VoiceReply::Audio(self.read_audio(response).await?))
        } else {
            Ok(VoiceReply::Transcript(self.decode_json(response).await?))
        }
    }

    async fn synthesize_speech(&self, text: &str, language: Option<&str>) -> Result<SpeechAudio> {
        if text.trim().is_empty() {
            return Err(Error::validation("text must not be empty"));
        }

        debug!("Requesting speech synthesis for {} characters", text.len());

        let mut form = Form::new().text("text", text.to_string());
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }

        let builder = self.http.post(self.endpoint(TTS_PATH)).multipart(form);
        let response = self.execute(builder, "speech synthesis").await?;
        self.read_audio(response).await
    }
}
