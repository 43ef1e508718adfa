use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stride_types::VoiceType;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-pro-preview-tts";
pub const DEFAULT_VOICE: &str = "Leda";
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

pub const DEFAULT_OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_STORY_MODEL: &str = "openai/gpt-4o";
pub const DEFAULT_STORY_TEMPERATURE: f32 = 0.9;
pub const DEFAULT_SITE_URL: &str = "https://mygame.example";
pub const DEFAULT_SITE_TITLE: &str = "Running Game";

/// Timeout for one speech synthesis request, including the streamed body.
pub const DEFAULT_TTS_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for one text generation request.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the Gemini speech service.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_TTS_MODEL.to_string(),
            timeout: DEFAULT_TTS_TIMEOUT,
        }
    }
}

/// Connection settings for the OpenRouter chat completions API.
#[derive(Clone)]
pub struct OpenRouterConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    /// Sent as `HTTP-Referer` for attribution.
    pub site_url: String,
    /// Sent as `X-Title` for attribution.
    pub site_title: String,
    pub timeout: Duration,
}

impl fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("site_url", &self.site_url)
            .field("site_title", &self.site_title)
            .finish()
    }
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_OPENROUTER_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_STORY_MODEL.to_string(),
            temperature: DEFAULT_STORY_TEMPERATURE,
            site_url: DEFAULT_SITE_URL.to_string(),
            site_title: DEFAULT_SITE_TITLE.to_string(),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }
}

/// On-disk layout for one mission's story content.
///
/// ```text
/// <stories_dir>/<mission>/BACKGROUND.md
/// <stories_dir>/<mission>/audio/<voice_type>/<timestamp>.<ext>
/// <stories_dir>/<mission>/missions/<date>.txt
/// <template_dir>/<voice_type>.md        (templates/prompts/voice by default)
/// ```
#[derive(Debug, Clone)]
pub struct StoryLayout {
    pub mission_name: String,
    pub stories_dir: PathBuf,
    /// Directory holding one `<voice_type>.md` template per voice type.
    pub template_dir: PathBuf,
    /// Main character description shared by every mission.
    pub character_path: PathBuf,
}

impl StoryLayout {
    pub fn new(
        mission_name: impl Into<String>,
        stories_dir: impl AsRef<Path>,
        template_dir: impl AsRef<Path>,
        character_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            mission_name: mission_name.into(),
            stories_dir: stories_dir.as_ref().to_path_buf(),
            template_dir: template_dir.as_ref().to_path_buf(),
            character_path: character_path.as_ref().to_path_buf(),
        }
    }

    pub fn mission_dir(&self) -> PathBuf {
        self.stories_dir.join(&self.mission_name)
    }

    pub fn background_path(&self) -> PathBuf {
        self.mission_dir().join("BACKGROUND.md")
    }

    pub fn audio_dir(&self, voice_type: VoiceType) -> PathBuf {
        self.mission_dir().join("audio").join(voice_type.as_str())
    }

    pub fn missions_dir(&self) -> PathBuf {
        self.mission_dir().join("missions")
    }

    pub fn voice_template(&self, voice_type: VoiceType) -> PathBuf {
        self.template_dir.join(format!("{}.md", voice_type.as_str()))
    }
}
