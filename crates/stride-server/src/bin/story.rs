//! Generates today's mission story and prints it.

use std::sync::Arc;
use stride_narration::{MissionStoryWriter, OpenRouterClient, ScriptTemplates, TemplateContext};
use stride_server::config::{self, resolve_config_path};
use stride_server::init_tracing;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to load .env: {}", e);
        }
    }

    let (config_path, _) = resolve_config_path();
    let config =
        config::load_config(Some(&config_path)).expect("failed to load configuration");

    init_tracing(&config.logging);

    if let Err(e) = config.validate_story() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    let client = OpenRouterClient::new(config.openrouter()).expect("failed to build story client");
    let target_value = config
        .mission
        .distance_goal_m
        .or(config.mission.time_goal_min)
        .unwrap_or_default();

    let writer = MissionStoryWriter::new(
        ScriptTemplates::new(config.story_layout()),
        &config.mission.story_prompt_path,
        Arc::new(client),
        &config.mission.mode,
        target_value,
    );

    match writer.generate_mission(&TemplateContext::new()).await {
        Ok((path, story)) => {
            tracing::info!(path = %path.display(), "mission story written");
            println!("{}", story);
        }
        Err(e) => {
            tracing::error!(error = %e, "mission story generation failed");
            std::process::exit(1);
        }
    }
}
