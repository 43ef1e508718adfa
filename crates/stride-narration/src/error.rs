use stride_types::VoiceType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("No narration text provided and no template content available for voice type '{0}'")]
    EmptyNarration(VoiceType),

    #[error("Narration text exceeds maximum size: {len} bytes (limit: {limit} bytes)")]
    InputTooLarge { len: usize, limit: usize },

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
