//! Narration for Stride missions.
//!
//! Narration scripts are rendered from per-voice-type templates, spoken by a
//! streaming speech service and saved as an audio file plus a transcript
//! under the mission's story directory. Raw PCM from the service is wrapped
//! in a WAV container before it is written.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod story;
pub mod template;
pub mod tts;
pub mod wav;

pub use config::{GeminiConfig, OpenRouterConfig, StoryLayout};
pub use error::NarrationError;
pub use pipeline::{AudioArtifact, NarrationPipeline};
pub use story::{MissionStoryWriter, OpenRouterClient, TextGenerator, STORY_SYSTEM_PROMPT};
pub use template::{render_template, ScriptTemplates, TemplateContext};
pub use tts::{
    GeminiTts, SpeechChunk, SpeechStream, SpeechSynthesizer, VoiceParams, MAX_TTS_INPUT_BYTES,
};
