//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use stride_location::DawarichConfig;
use stride_mission::TrackerConfig;
use stride_narration::{GeminiConfig, OpenRouterConfig, StoryLayout};
use stride_types::Goal;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Location-history service.
    #[serde(default)]
    pub location: LocationConfig,

    /// Polling loop settings.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// The mission being run and where its content lives.
    #[serde(default)]
    pub mission: MissionConfig,

    /// Speech synthesis.
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Mission story generation.
    #[serde(default)]
    pub story: StoryConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "stride_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_location_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub api_key: String,

    /// Timeout for one points query, in seconds. Kept well below the poll
    /// interval so a hanging request cannot stall later ticks.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between progress updates.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds to wait for the monitor to finish after a stop request.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissionConfig {
    #[serde(default = "default_mission_name")]
    pub name: String,

    /// Passed to the story prompt as `mode`.
    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(default = "default_distance_goal_m")]
    pub distance_goal_m: Option<f64>,

    #[serde(default)]
    pub time_goal_min: Option<f64>,

    #[serde(default = "default_progress_dir")]
    pub progress_dir: PathBuf,

    #[serde(default = "default_stories_dir")]
    pub stories_dir: PathBuf,

    /// Holds `<voice_type>.md` narration templates.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    #[serde(default = "default_character_path")]
    pub character_path: PathBuf,

    #[serde(default = "default_story_prompt_path")]
    pub story_prompt_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_tts_model")]
    pub model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryConfig {
    #[serde(default = "default_openrouter_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_story_model")]
    pub model: String,

    #[serde(default = "default_story_temperature")]
    pub temperature: f32,

    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default = "default_site_title")]
    pub site_title: String,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_location_api_base() -> String {
    "https://timeline.osmosis.page/api/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_interval_secs() -> u64 {
    60
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_mission_name() -> String {
    "zombies".to_string()
}

fn default_mode() -> String {
    "distance".to_string()
}

fn default_distance_goal_m() -> Option<f64> {
    Some(5000.0)
}

fn default_progress_dir() -> PathBuf {
    PathBuf::from("progress")
}

fn default_stories_dir() -> PathBuf {
    PathBuf::from("stories")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates/prompts/voice")
}

fn default_character_path() -> PathBuf {
    PathBuf::from("MAIN_CHARACTER.md")
}

fn default_story_prompt_path() -> PathBuf {
    PathBuf::from("templates/prompts/story_generator.md")
}

fn default_gemini_api_base() -> String {
    stride_narration::config::DEFAULT_GEMINI_API_BASE.to_string()
}

fn default_tts_model() -> String {
    stride_narration::config::DEFAULT_TTS_MODEL.to_string()
}

fn default_voice() -> String {
    stride_narration::config::DEFAULT_VOICE.to_string()
}

fn default_temperature() -> f32 {
    stride_narration::config::DEFAULT_TEMPERATURE
}

fn default_openrouter_api_base() -> String {
    stride_narration::config::DEFAULT_OPENROUTER_API_BASE.to_string()
}

fn default_story_model() -> String {
    stride_narration::config::DEFAULT_STORY_MODEL.to_string()
}

fn default_story_temperature() -> f32 {
    stride_narration::config::DEFAULT_STORY_TEMPERATURE
}

fn default_site_url() -> String {
    stride_narration::config::DEFAULT_SITE_URL.to_string()
}

fn default_site_title() -> String {
    "Zombie Runner".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            api_base: default_location_api_base(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            health_timeout_secs: default_health_timeout_secs(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            name: default_mission_name(),
            mode: default_mode(),
            distance_goal_m: default_distance_goal_m(),
            time_goal_min: None,
            progress_dir: default_progress_dir(),
            stories_dir: default_stories_dir(),
            template_dir: default_template_dir(),
            character_path: default_character_path(),
            story_prompt_path: default_story_prompt_path(),
        }
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            api_base: default_gemini_api_base(),
            api_key: String::new(),
            model: default_tts_model(),
            voice: default_voice(),
            temperature: default_temperature(),
        }
    }
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            api_base: default_openrouter_api_base(),
            api_key: String::new(),
            model: default_story_model(),
            temperature: default_story_temperature(),
            site_url: default_site_url(),
            site_title: default_site_title(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A credential needed at startup is not set.
    #[error("missing required credential: {0}")]
    MissingCredential(&'static str),

    /// A setting holds a value the server cannot run with.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl Config {
    /// Checks the credentials and timing settings the server needs to run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] naming the first unset key,
    /// or [`ConfigError::Invalid`] when the location request timeout is zero
    /// or not shorter than the poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("API_KEY"));
        }
        if self.narration.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("GEMINI_API_KEY"));
        }

        let timeout = self.location.request_timeout_secs;
        if timeout == 0 {
            return Err(ConfigError::Invalid {
                field: "location.request_timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        let interval = self.poll_interval().as_secs();
        if timeout >= interval {
            return Err(ConfigError::Invalid {
                field: "location.request_timeout_secs",
                reason: format!(
                    "{}s must be shorter than the {}s poll interval",
                    timeout, interval
                ),
            });
        }
        Ok(())
    }

    /// Checks the credentials the story generator needs.
    pub fn validate_story(&self) -> Result<(), ConfigError> {
        if self.story.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("OPENROUTER_API_KEY"));
        }
        Ok(())
    }

    pub fn goal(&self) -> Goal {
        Goal::new(self.mission.distance_goal_m, self.mission.time_goal_min)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.interval_secs.max(1))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.monitor.shutdown_grace_secs)
    }

    pub fn dawarich(&self) -> DawarichConfig {
        let mut config = DawarichConfig::new(&self.location.api_base, &self.location.api_key);
        config.request_timeout = Duration::from_secs(self.location.request_timeout_secs);
        config.health_timeout = Duration::from_secs(self.location.health_timeout_secs);
        config
    }

    pub fn tracker(&self) -> TrackerConfig {
        TrackerConfig {
            mission_name: self.mission.name.clone(),
            goal: self.goal(),
            progress_dir: self.mission.progress_dir.clone(),
        }
    }

    pub fn story_layout(&self) -> StoryLayout {
        StoryLayout::new(
            &self.mission.name,
            &self.mission.stories_dir,
            &self.mission.template_dir,
            &self.mission.character_path,
        )
    }

    pub fn gemini(&self) -> GeminiConfig {
        let mut config = GeminiConfig::new(&self.narration.api_key);
        config.api_base = self.narration.api_base.clone();
        config.model = self.narration.model.clone();
        config
    }

    pub fn openrouter(&self) -> OpenRouterConfig {
        let mut config = OpenRouterConfig::new(&self.story.api_key);
        config.api_base = self.story.api_base.clone();
        config.model = self.story.model.clone();
        config.temperature = self.story.temperature;
        config.site_url = self.story.site_url.clone();
        config.site_title = self.story.site_title.clone();
        config
    }
}

/// Picks the config file: first CLI argument, then `STRIDE_CONFIG_PATH`,
/// then `config.toml`. Returns the path and where it came from.
pub fn resolve_config_path() -> (String, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (path, "cli-arg");
    }

    if let Ok(path) = std::env::var("STRIDE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    ("config.toml".to_string(), "default")
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies overrides from the process environment.
///
/// Environment variable overrides:
/// - `API_BASE` / `API_KEY` override `location.api_base` / `location.api_key`
/// - `MONITOR_INTERVAL` overrides `monitor.interval_secs`
/// - `GEMINI_API_KEY` overrides `narration.api_key`
/// - `OPENROUTER_API_BASE` / `OPENROUTER_API_KEY` override `story.api_base` / `story.api_key`
/// - `SITE_URL` overrides `story.site_url`
/// - `STRIDE_HOST` / `STRIDE_PORT` override `server.host` / `server.port`
/// - `STRIDE_LOG_LEVEL` overrides `logging.level`
/// - `STRIDE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(base) = var("API_BASE") {
        config.location.api_base = base;
    }
    if let Some(key) = var("API_KEY") {
        config.location.api_key = key;
    }
    if let Some(interval) = var("MONITOR_INTERVAL") {
        if let Ok(parsed) = interval.trim().parse() {
            config.monitor.interval_secs = parsed;
        }
    }
    if let Some(key) = var("GEMINI_API_KEY") {
        config.narration.api_key = key;
    }
    if let Some(base) = var("OPENROUTER_API_BASE") {
        config.story.api_base = base;
    }
    if let Some(key) = var("OPENROUTER_API_KEY") {
        config.story.api_key = key;
    }
    if let Some(url) = var("SITE_URL") {
        config.story.site_url = url;
    }
    if let Some(host) = var("STRIDE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("STRIDE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = var("STRIDE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("STRIDE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
