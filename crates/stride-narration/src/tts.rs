//! Speech synthesis service client.

use crate::config::GeminiConfig;
use crate::error::NarrationError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

/// Maximum narration size accepted for synthesis (64 KiB).
pub const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Voice selection and sampling settings for one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub voice_name: String,
    pub temperature: f32,
}

impl VoiceParams {
    /// Builds parameters, clamping `temperature` to `[0.0, 2.0]`.
    pub fn new(voice_name: impl Into<String>, temperature: f32) -> Self {
        Self {
            voice_name: voice_name.into(),
            temperature: temperature.clamp(0.0, 2.0),
        }
    }
}

/// One piece of a streamed synthesis response.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechChunk {
    /// Audio bytes and the MIME type the service declared for them.
    Audio {
        mime_type: Option<String>,
        data: Vec<u8>,
    },
    /// Text the service returned alongside the audio.
    Text(String),
}

pub type SpeechStream = BoxStream<'static, Result<SpeechChunk, NarrationError>>;

/// A text-to-speech backend that streams its output.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn stream_speech(
        &self,
        text: &str,
        params: &VoiceParams,
    ) -> Result<SpeechStream, NarrationError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    response_modalities: [&'static str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidatePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

/// Gemini `streamGenerateContent` speech client.
#[derive(Debug, Clone)]
pub struct GeminiTts {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiTts {
    /// # Errors
    ///
    /// Returns [`NarrationError::Config`] if the API key is blank.
    pub fn new(config: GeminiConfig) -> Result<Self, NarrationError> {
        if config.api_key.trim().is_empty() {
            return Err(NarrationError::Config("missing Gemini API key".to_string()));
        }
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiTts {
    async fn stream_speech(
        &self,
        text: &str,
        params: &VoiceParams,
    ) -> Result<SpeechStream, NarrationError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(NarrationError::InputTooLarge {
                len: text.len(),
                limit: MAX_TTS_INPUT_BYTES,
            });
        }

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                response_modalities: ["audio"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: &params.voice_name,
                        },
                    },
                },
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NarrationError::SynthesisFailed(format!(
                "Gemini {} ({}): {}",
                self.config.model, status, body
            )));
        }

        tracing::debug!(model = %self.config.model, voice = %params.voice_name, "speech stream opened");
        Ok(sse_chunks(response.bytes_stream()))
    }
}

/// Turns an SSE byte stream into speech chunks.
fn sse_chunks<S, B>(bytes: S) -> SpeechStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    bytes
        .eventsource()
        .flat_map(|event| {
            let chunks = match event {
                Ok(event) if event.data.trim().is_empty() => Vec::new(),
                Ok(event) => parse_event(&event.data),
                Err(EventStreamError::Transport(e)) => vec![Err(NarrationError::Http(e))],
                Err(e) => vec![Err(NarrationError::SynthesisFailed(format!(
                    "unreadable speech stream: {}",
                    e
                )))],
            };
            stream::iter(chunks)
        })
        .boxed()
}

/// Parses one SSE `data` payload into chunks from the first candidate.
pub(crate) fn parse_event(payload: &str) -> Vec<Result<SpeechChunk, NarrationError>> {
    let response: StreamResponse = match serde_json::from_str(payload) {
        Ok(r) => r,
        Err(e) => {
            return vec![Err(NarrationError::SynthesisFailed(format!(
                "malformed stream event: {}",
                e
            )))]
        }
    };

    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let mut chunks = Vec::new();
    for part in parts {
        match part.inline_data {
            Some(InlineData {
                mime_type,
                data: Some(data),
            }) if !data.is_empty() => match BASE64_STANDARD.decode(data.as_bytes()) {
                Ok(bytes) => chunks.push(Ok(SpeechChunk::Audio {
                    mime_type,
                    data: bytes,
                })),
                Err(e) => chunks.push(Err(NarrationError::SynthesisFailed(format!(
                    "invalid base64 audio: {}",
                    e
                )))),
            },
            _ => {
                if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                    chunks.push(Ok(SpeechChunk::Text(text)));
                }
            }
        }
    }
    chunks
}
