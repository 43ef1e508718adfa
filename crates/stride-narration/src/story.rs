//! Mission story generation through a chat-completions service.

use crate::config::OpenRouterConfig;
use crate::error::NarrationError;
use crate::template::{ScriptTemplates, TemplateContext};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub const STORY_SYSTEM_PROMPT: &str =
    "You are a creative AI that generates immersive running missions.";

/// A language model that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, NarrationError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenRouter chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    /// # Errors
    ///
    /// Returns [`NarrationError::Config`] if the API key is blank.
    pub fn new(config: OpenRouterConfig) -> Result<Self, NarrationError> {
        if config.api_key.trim().is_empty() {
            return Err(NarrationError::Config(
                "missing OpenRouter API key".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, NarrationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.site_url)
            .header("X-Title", &self.config.site_title)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NarrationError::Generation(format!(
                "OpenRouter {} ({}): {}",
                self.config.model, status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| NarrationError::Generation(format!("OpenRouter parse: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| NarrationError::Generation("response has no content".to_string()))
    }
}

/// Writes a daily mission briefing from the story prompt template.
pub struct MissionStoryWriter {
    templates: ScriptTemplates,
    prompt_path: PathBuf,
    generator: Arc<dyn TextGenerator>,
    mode: String,
    target_value: f64,
}

impl MissionStoryWriter {
    pub fn new(
        templates: ScriptTemplates,
        prompt_path: impl Into<PathBuf>,
        generator: Arc<dyn TextGenerator>,
        mode: impl Into<String>,
        target_value: f64,
    ) -> Self {
        Self {
            templates,
            prompt_path: prompt_path.into(),
            generator,
            mode: mode.into(),
            target_value,
        }
    }

    /// Generates today's mission story and saves it under the mission's
    /// `missions/` directory, returning the saved text.
    ///
    /// # Errors
    ///
    /// Returns [`NarrationError::Template`] if the prompt template is missing
    /// or renders empty, and propagates generation and write errors.
    pub async fn generate_mission(
        &self,
        extra: &TemplateContext,
    ) -> Result<(PathBuf, String), NarrationError> {
        let mut context = TemplateContext::new();
        context.insert("mode".to_string(), self.mode.clone());
        context.insert("target_value".to_string(), self.target_value.to_string());
        context.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        let prompt = self
            .templates
            .render_file(&self.prompt_path, &context)
            .await?
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                NarrationError::Template(format!(
                    "story prompt {} is missing or empty",
                    self.prompt_path.display()
                ))
            })?;

        let story = self
            .generator
            .generate(STORY_SYSTEM_PROMPT, &prompt)
            .await?
            .trim()
            .to_string();

        let dir = self.templates.layout().missions_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.txt", Local::now().format("%Y-%m-%d")));
        tokio::fs::write(&path, &story).await?;

        tracing::info!(
            mission = %self.templates.layout().mission_name,
            path = %path.display(),
            "mission story saved"
        );
        Ok((path, story))
    }
}
