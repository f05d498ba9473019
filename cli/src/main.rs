use anyhow::Context;
use clap::Parser;
use colored::*;
use dotenvy::dotenv;
use gemini_chat_core::{ConversationController, GeminiClient};
use tracing::info;

mod app;
mod cli;
mod config;
mod logging;
mod output;

use crate::cli::Args;
use crate::config::resolve_config;
use crate::logging::{init_logging, log_error};
use crate::output::print_usage_instructions;

/// Main function - Sends prompts to Gemini and prints the replies
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before reading GEMINI_*
    dotenv().ok();

    // Parse command-line arguments
    let args = Args::parse();

    let config = resolve_config(&args)?;
    init_logging(config.log_level.as_deref(), args.verbose)?;

    if args.prompt.is_none() && !args.interactive {
        print_usage_instructions();
        return Ok(());
    }

    let client = match GeminiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            log_error(&format!("Failed to initialize Gemini client: {}", e));
            eprintln!(
                "{}",
                "Set GEMINI_API_KEY, pass --api-key, or add api_key to the config file.".red()
            );
            return Err(e.into());
        }
    };
    info!(model = client.model_name(), "Initialized Gemini client");

    let mut controller = ConversationController::new(&config);
    info!(
        session_id = %controller.session_id(),
        policy = %controller.attachment_policy(),
        "Started conversation"
    );

    if args.interactive {
        if let Some(path) = &args.attach {
            controller
                .stage_attachment_file(path)
                .with_context(|| format!("Failed to attach {}", path.display()))?;
        }
        if let Some(prompt) = &args.prompt {
            // A failed opening turn is already shown; keep the session open
            if let Err(e) = app::run_single_query(prompt, None, &mut controller, &client).await {
                log_error(&format!("{:#}", e));
            }
        }
        if let Err(e) = app::run_interactive_chat(&mut controller, &client).await {
            log_error(&format!("Error in interactive chat: {:#}", e));
            return Err(e);
        }
    } else if let Some(prompt) = &args.prompt {
        if let Err(e) =
            app::run_single_query(prompt, args.attach.as_deref(), &mut controller, &client).await
        {
            log_error(&format!("{:#}", e));
            return Err(e);
        }
    }

    Ok(())
}
