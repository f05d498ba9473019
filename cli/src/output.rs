use colored::*;
use gemini_chat_core::{PendingTurn, TurnStatus};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref BOLD_TAG: Regex = Regex::new(r"<b>(.*?)</b>").unwrap();
    static ref ITALIC_TAG: Regex = Regex::new(r"<i>(.*?)</i>").unwrap();
}

/// Turns reply markup (`<b>`, `<i>`, `<br>`) into terminal styling
pub fn markup_to_terminal(markup: &str) -> String {
    let bolded = BOLD_TAG.replace_all(markup, |caps: &Captures<'_>| caps[1].bold().to_string());
    let italicized =
        ITALIC_TAG.replace_all(&bolded, |caps: &Captures<'_>| caps[1].italic().to_string());
    italicized.replace("<br>", "\n")
}

/// Print a settled turn
pub fn print_turn(turn: &PendingTurn) {
    match &turn.status {
        TurnStatus::Answered(markup) => {
            println!("{}: {}", "Gemini".blue().bold(), markup_to_terminal(markup));
        }
        TurnStatus::Failed(error) => {
            println!("{}: {}", "Gemini".blue().bold(), format!("Error: {}", error).red());
        }
        TurnStatus::Thinking => {}
    }
}

pub fn print_notice(message: &str) {
    println!("{}", message.dimmed());
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "gemini-chat \"your prompt\"".green().bold());
    println!("    Send a single message");
    println!();
    println!("  {}", "gemini-chat \"What is this?\" --attach photo.png".green().bold());
    println!("    Send a message about an image");
    println!();
    println!("  {}", "gemini-chat -i".green().bold());
    println!("    Start an interactive chat session");
    println!();
    println!("{}", "Options:".cyan());
    println!("  --config <PATH>             Use a specific config file");
    println!("  --history-window <N>        Replay only the last N turns");
    println!("  --attachment-policy <P>     reuse-latest or explicit-only");
    println!("  --help                      Show this help message");
    println!();
}

/// Commands understood by the interactive loop
pub fn print_interactive_help() {
    println!("{}", "Commands:".cyan());
    println!("  /attach <path>   Attach an image to the next message");
    println!("  /cancel          Drop the attached image");
    println!("  /new             Start a new conversation");
    println!("  /export <path>   Save the conversation as HTML");
    println!("  /help            Show this list");
    println!("  exit, quit       Leave");
    println!();
}
