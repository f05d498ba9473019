use clap::Parser;
use gemini_chat_core::AttachmentPolicy;
use std::path::PathBuf;

/// Chat with Gemini from the terminal, optionally about an image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The prompt to send
    #[arg(index = 1)] // Positional argument
    pub prompt: Option<String>,

    /// Enter interactive chat mode
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Image to attach to the first message
    #[arg(short, long)]
    pub attach: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gemini model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Gemini API key
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// Replay only the last N turns with each request
    #[arg(long)]
    pub history_window: Option<usize>,

    /// reuse-latest or explicit-only
    #[arg(long)]
    pub attachment_policy: Option<AttachmentPolicy>,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let args = Args::parse_from([
            "gemini-chat",
            "What is this?",
            "--attach",
            "cat.png",
            "--model",
            "gemini-1.5-pro",
            "--history-window",
            "8",
            "--attachment-policy",
            "explicit-only",
            "-v",
        ]);

        assert_eq!(args.prompt.as_deref(), Some("What is this?"));
        assert_eq!(args.attach, Some(PathBuf::from("cat.png")));
        assert_eq!(args.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(args.history_window, Some(8));
        assert_eq!(args.attachment_policy, Some(AttachmentPolicy::ExplicitOnly));
        assert!(args.verbose);
        assert!(!args.interactive);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = Args::try_parse_from(["gemini-chat", "--attachment-policy", "sometimes"]);
        assert!(result.is_err());
    }
}
