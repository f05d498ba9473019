use anyhow::{Context, Result};
use colored::*;
use gemini_chat_core::render::render_transcript_page;
use gemini_chat_core::{ConversationController, InferenceService, PendingTurn};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::output::{print_interactive_help, print_notice, print_turn};

/// One line of interactive input
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Exit,
    Attach(PathBuf),
    Cancel,
    New,
    Export(PathBuf),
    Help,
    Message(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::Empty);
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Ok(Command::Exit);
        }
        let Some(command) = line.strip_prefix('/') else {
            return Ok(Command::Message(line.to_string()));
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match (name, arg) {
            ("attach", "") | ("export", "") => Err(format!("/{} needs a path", name)),
            ("attach", path) => Ok(Command::Attach(PathBuf::from(path))),
            ("export", path) => Ok(Command::Export(PathBuf::from(path))),
            ("cancel", _) => Ok(Command::Cancel),
            ("new", _) => Ok(Command::New),
            ("help", _) => Ok(Command::Help),
            _ => Err(format!("Unknown command: /{}", name)),
        }
    }
}

fn spinner() -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")?,
    );
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

/// Sends one turn while a spinner runs. `None` when the input was blank.
async fn send_turn<S>(
    controller: &mut ConversationController,
    service: &S,
    text: &str,
) -> Result<Option<PendingTurn>>
where
    S: InferenceService + ?Sized,
{
    let Some(turn) = controller.begin_turn(text) else {
        return Ok(None);
    };

    let spinner = spinner()?;
    let result = service.generate_content(&turn.request).await;
    spinner.finish_and_clear();

    let turn = controller.complete_turn(turn, result);
    print_turn(&turn);
    Ok(Some(turn))
}

/// Sends a single prompt, optionally with an image, and prints the reply
pub async fn run_single_query<S>(
    prompt: &str,
    attachment: Option<&Path>,
    controller: &mut ConversationController,
    service: &S,
) -> Result<()>
where
    S: InferenceService + ?Sized,
{
    info!("Running single query");

    if let Some(path) = attachment {
        controller
            .stage_attachment_file(path)
            .with_context(|| format!("Failed to attach {}", path.display()))?;
    }

    match send_turn(controller, service, prompt).await? {
        Some(turn) if turn.is_error() => anyhow::bail!("The request failed"),
        Some(_) => Ok(()),
        None => {
            print_notice("Nothing to send.");
            Ok(())
        }
    }
}

pub fn export_conversation(controller: &ConversationController, path: &Path) -> Result<()> {
    let page = render_transcript_page("Gemini chat", controller.log());
    fs::write(path, page).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), entries = controller.log().len(), "Exported conversation");
    Ok(())
}

/// Runs an interactive chat session
pub async fn run_interactive_chat<S>(
    controller: &mut ConversationController,
    service: &S,
) -> Result<()>
where
    S: InferenceService + ?Sized,
{
    println!("Starting interactive chat session.");
    println!("Type 'exit' or 'quit' to end the session, '/help' for commands.");
    println!();

    loop {
        let marker = if controller.pending_attachment().is_some() {
            " [image]"
        } else {
            ""
        };
        print!("{}{}: ", "You".green().bold(), marker.yellow());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            println!();
            break;
        }

        let command = match Command::parse(&input) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message.red());
                continue;
            }
        };
        debug!(?command, "Interactive input");

        match command {
            Command::Empty => continue,
            Command::Exit => {
                println!("Exiting chat session.");
                break;
            }
            Command::Help => print_interactive_help(),
            Command::Attach(path) => match controller.stage_attachment_file(&path) {
                Ok(()) => print_notice(&format!("Attached {}", path.display())),
                Err(e) => {
                    error!(error = %e, "Failed to attach file");
                    eprintln!("{}", format!("Could not attach {}: {}", path.display(), e).red());
                }
            },
            Command::Cancel => {
                if controller.cancel_attachment().is_some() {
                    print_notice("Attachment removed.");
                } else {
                    print_notice("No attachment to remove.");
                }
            }
            Command::New => {
                controller.reset();
                print_notice("Started a new conversation.");
            }
            Command::Export(path) => match export_conversation(controller, &path) {
                Ok(()) => print_notice(&format!("Saved conversation to {}", path.display())),
                Err(e) => eprintln!("{}", format!("{:#}", e).red()),
            },
            Command::Message(text) => {
                send_turn(controller, service, &text).await?;
                println!(); // Add spacing between interactions
            }
        }
    }

    Ok(())
}
