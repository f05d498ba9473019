use anyhow::{Context, Result};
use gemini_chat_core::config::{get_default_config_file, ChatConfig};

use crate::cli::Args;

pub const APP_NAME: &str = "gemini-chat";

/// Settings given on the command line
fn from_args(args: &Args) -> ChatConfig {
    ChatConfig {
        api_key: args.api_key.clone(),
        model_name: args.model.clone(),
        attachment_policy: args.attachment_policy,
        history_window: args.history_window,
        ..Default::default()
    }
}

/// Layers defaults < file < environment < arguments
fn layer(file: ChatConfig, env: &ChatConfig, args: &Args) -> ChatConfig {
    file.merge(env).merge(&from_args(args))
}

pub fn resolve_config(args: &Args) -> Result<ChatConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file(APP_NAME)?,
    };

    let file = ChatConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    let env = ChatConfig::from_env().context("Invalid GEMINI_* environment variable")?;

    Ok(layer(file, &env, args))
}
