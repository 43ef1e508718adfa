//! Narration: script rendering, speech synthesis and artifact persistence.

use crate::error::NarrationError;
use crate::template::{ScriptTemplates, TemplateContext};
use crate::tts::{SpeechChunk, SpeechSynthesizer, VoiceParams};
use crate::wav::{self, DEFAULT_PCM_MIME};
use chrono::{DateTime, Local};
use futures_util::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use stride_types::VoiceType;

const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// An audio file and its transcript written for one narration event.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub voice_type: VoiceType,
    pub audio_path: PathBuf,
    pub transcript_path: PathBuf,
    /// Size of the audio file as written.
    pub encoded_bytes: usize,
    /// MIME type declared by the speech service (or the PCM default).
    pub mime_type: String,
    /// Set only when raw PCM was wrapped in a WAV container.
    pub sample_rate: Option<u32>,
    pub bits_per_sample: Option<u16>,
    pub channel_count: Option<u16>,
    pub transcript_text: String,
    pub created_at: DateTime<Local>,
}

/// Turns narration text into persisted audio for one mission.
pub struct NarrationPipeline {
    templates: ScriptTemplates,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    default_voice: String,
    default_temperature: f32,
}

impl std::fmt::Debug for NarrationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationPipeline")
            .field("templates", &self.templates)
            .field("default_voice", &self.default_voice)
            .field("default_temperature", &self.default_temperature)
            .finish_non_exhaustive()
    }
}

impl NarrationPipeline {
    pub fn new(
        templates: ScriptTemplates,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        default_voice: impl Into<String>,
        default_temperature: f32,
    ) -> Self {
        Self {
            templates,
            synthesizer,
            default_voice: default_voice.into(),
            default_temperature,
        }
    }

    pub fn templates(&self) -> &ScriptTemplates {
        &self.templates
    }

    /// Renders the narration template for `voice_type`; empty if none exists.
    pub async fn render_script(
        &self,
        voice_type: VoiceType,
        context: &TemplateContext,
    ) -> Result<String, NarrationError> {
        self.templates.render_script(voice_type, context).await
    }

    /// Resolves voice parameters, applying overrides over the defaults.
    pub fn voice_params(&self, voice: Option<&str>, temperature: Option<f32>) -> VoiceParams {
        let voice = voice
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_voice);
        VoiceParams::new(voice, temperature.unwrap_or(self.default_temperature))
    }

    /// Narrates a moment of the mission.
    ///
    /// `text` is used when it is non-blank; otherwise the voice type's
    /// template is rendered with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`NarrationError::EmptyNarration`] when neither yields any
    /// text, and propagates synthesis and persistence errors.
    pub async fn narrate(
        &self,
        voice_type: VoiceType,
        text: Option<&str>,
        context: &TemplateContext,
        params: &VoiceParams,
    ) -> Result<AudioArtifact, NarrationError> {
        let narration = match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => text.to_string(),
            None => self.render_script(voice_type, context).await?,
        };

        if narration.trim().is_empty() {
            return Err(NarrationError::EmptyNarration(voice_type));
        }

        self.synthesize(voice_type, &narration, params).await
    }

    /// Synthesizes `narration` and writes the audio and transcript pair.
    ///
    /// All audio is collected before anything touches the disk, so a failed
    /// stream leaves no partial files behind.
    ///
    /// # Errors
    ///
    /// Returns [`NarrationError::SynthesisFailed`] if the service produced no
    /// audio bytes.
    pub async fn synthesize(
        &self,
        voice_type: VoiceType,
        narration: &str,
        params: &VoiceParams,
    ) -> Result<AudioArtifact, NarrationError> {
        let mut stream = self.synthesizer.stream_speech(narration, params).await?;

        let mut audio = Vec::new();
        let mut mime_type: Option<String> = None;
        let mut supplemental = Vec::new();

        while let Some(chunk) = stream.next().await {
            match chunk? {
                SpeechChunk::Audio { mime_type: mime, data } => {
                    if mime_type.is_none() {
                        mime_type = mime.filter(|m| !m.trim().is_empty());
                    }
                    audio.extend_from_slice(&data);
                }
                SpeechChunk::Text(text) => supplemental.push(text),
            }
        }

        if audio.is_empty() {
            return Err(NarrationError::SynthesisFailed(format!(
                "no audio returned for voice type '{}'",
                voice_type
            )));
        }

        let mime_type = mime_type.unwrap_or_else(|| DEFAULT_PCM_MIME.to_string());
        let (extension, encoded, format) = match wav::container_extension(&mime_type) {
            Some(ext) => (ext, audio, None),
            None => {
                let format = wav::parse_pcm_mime(&mime_type);
                ("wav", wav::encode_wav(&audio, format), Some(format))
            }
        };

        let created_at = Local::now();
        let stem = created_at.format(ARTIFACT_TIMESTAMP_FORMAT).to_string();
        let dir = self.templates.layout().audio_dir(voice_type);
        tokio::fs::create_dir_all(&dir).await?;

        let audio_path = dir.join(format!("{}.{}", stem, extension));
        let transcript_path = dir.join(format!("{}.txt", stem));

        let mut transcript_text = narration.to_string();
        if !supplemental.is_empty() {
            transcript_text.push_str("\n\n");
            transcript_text.push_str(&supplemental.join("\n"));
        }

        tokio::fs::write(&audio_path, &encoded).await?;
        tokio::fs::write(&transcript_path, &transcript_text).await?;

        tracing::info!(
            voice_type = %voice_type,
            voice = %params.voice_name,
            mime_type = %mime_type,
            bytes = encoded.len(),
            path = %audio_path.display(),
            "narration audio saved"
        );

        Ok(AudioArtifact {
            voice_type,
            audio_path,
            transcript_path,
            encoded_bytes: encoded.len(),
            mime_type,
            sample_rate: format.map(|f| f.sample_rate),
            bits_per_sample: format.map(|f| f.bits_per_sample),
            channel_count: format.map(|f| f.channels),
            transcript_text,
            created_at,
        })
    }
}
