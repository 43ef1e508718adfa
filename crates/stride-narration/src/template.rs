//! Prompt and narration templates.
//!
//! Templates are plain text with `{{ name }}` placeholders. Every template is
//! rendered with the mission's shared context (`character`, `background`,
//! `game_name`) plus whatever the caller adds; unknown placeholders render
//! as empty strings.

use crate::config::StoryLayout;
use crate::error::NarrationError;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use stride_types::VoiceType;

/// Values available to a template, by placeholder name.
pub type TemplateContext = BTreeMap<String, String>;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Substitutes `{{ name }}` placeholders from `context`.
pub fn render_template(template: &str, context: &TemplateContext) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures<'_>| {
            context.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Renders the templates of one mission.
#[derive(Debug, Clone)]
pub struct ScriptTemplates {
    layout: StoryLayout,
}

impl ScriptTemplates {
    pub fn new(layout: StoryLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StoryLayout {
        &self.layout
    }

    /// Shared context: character sheet, mission background and mission name.
    pub async fn base_context(&self) -> Result<TemplateContext, NarrationError> {
        let mut context = TemplateContext::new();
        context.insert(
            "character".to_string(),
            read_optional(&self.layout.character_path).await?,
        );
        context.insert(
            "background".to_string(),
            read_optional(&self.layout.background_path()).await?,
        );
        context.insert("game_name".to_string(), self.layout.mission_name.clone());
        Ok(context)
    }

    /// Renders the template at `path` with the shared context overlaid by
    /// `extra`. Returns `None` when the template file does not exist.
    pub async fn render_file(
        &self,
        path: &Path,
        extra: &TemplateContext,
    ) -> Result<Option<String>, NarrationError> {
        let template = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(NarrationError::Template(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut context = self.base_context().await?;
        context.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(Some(render_template(&template, &context).trim().to_string()))
    }

    /// Renders the narration script for `voice_type`.
    ///
    /// A missing template yields an empty string.
    pub async fn render_script(
        &self,
        voice_type: VoiceType,
        extra: &TemplateContext,
    ) -> Result<String, NarrationError> {
        let path = self.layout.voice_template(voice_type);
        let rendered = self.render_file(&path, extra).await?;
        if rendered.is_none() {
            tracing::debug!(voice_type = %voice_type, path = %path.display(), "no template for voice type");
        }
        Ok(rendered.unwrap_or_default())
    }
}

/// Reads a text file, treating a missing file as empty.
async fn read_optional(path: &Path) -> Result<String, NarrationError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(NarrationError::Template(format!(
            "failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}
