use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use krishi_advisor::{
    AdvisorApi, Error, Result,
    client::{
        ChatRequest, ChatResponse, HealthResponse, ImageClassifyResponse, ImageInput, SpeechAudio,
        TokenStream, VoiceReply, VoiceRequest, VoiceTranscript,
    },
};
use std::sync::{Arc, Mutex};

/// In-memory advisor used to drive caller code without a network.
#[derive(Debug, Default)]
pub struct MockAdvisor {
    pub reply: Option<String>,
    pub classification: Option<ImageClassifyResponse>,
    pub error: Option<String>,
    pub chat_requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Some(reply.to_string());
        self
    }

    pub fn with_classification(mut self, label: &str, score: f64) -> Self {
        self.classification = Some(ImageClassifyResponse {
            label: label.to_string(),
            score,
        });
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn get_chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    fn fail(&self) -> Result<()> {
        match &self.error {
            Some(msg) => Err(Error::internal(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdvisorApi for MockAdvisor {
    async fn check_health(&self) -> Result<HealthResponse> {
        self.fail()?;
        Ok(HealthResponse::from_body(br#"{"status":"ok"}"#))
    }

    async fn send_chat_message(&self, message: &str) -> Result<ChatResponse> {
        self.send_chat(ChatRequest::new("mock", message)).await
    }

    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.chat_requests.lock().unwrap().push(request);
        self.fail()?;
        Ok(ChatResponse {
            text: self.reply.clone().unwrap_or_default(),
            tool_calls: None,
        })
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TokenStream> {
        let reply = self.send_chat(request).await?.text;
        let tokens: Vec<Result<String>> = reply
            .split_inclusive(' ')
            .map(|t| Ok(t.to_string()))
            .collect();
        Ok(stream::iter(tokens).boxed())
    }

    async fn classify_image(&self, _image: ImageInput) -> Result<ImageClassifyResponse> {
        self.fail()?;
        self.classification
            .clone()
            .ok_or_else(|| Error::invalid_response("no classification configured"))
    }

    async fn send_voice(&self, _request: VoiceRequest) -> Result<VoiceReply> {
        self.fail()?;
        Ok(VoiceReply::Transcript(VoiceTranscript {
            transcript: "mock transcript".to_string(),
            reply: self.reply.clone().unwrap_or_default(),
            tool_calls: None,
        }))
    }

    async fn synthesize_speech(&self, _text: &str, _language: Option<&str>) -> Result<SpeechAudio> {
        self.fail()?;
        Ok(SpeechAudio {
            bytes: b"RIFF".to_vec(),
            media_type: "audio/wav".to_string(),
        })
    }
}
