//! HTML fragments for a chat surface.
//!
//! User text and error messages are escaped. Reply markup produced by
//! [`crate::format::to_markup`] is inserted as-is.

use crate::controller::TurnStatus;
use crate::history::{ConversationLog, LogRole};
use crate::types::InlineData;

const THINKING_INDICATOR: &str = r#"<div class="thinking-indicator"><div class="dot"></div><div class="dot"></div><div class="dot"></div></div>"#;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn message(classes: &str, body: &str) -> String {
    format!(r#"<div class="message {}">{}</div>"#, classes, body)
}

/// Outgoing message, with the attachment shown inline when there is one
pub fn render_user_message(text: &str, file: Option<&InlineData>) -> String {
    let mut body = format!(r#"<div class="message-text">{}</div>"#, escape_html(text));
    if let Some(file) = file {
        body.push_str(&format!(
            r#"<img src="data:{};base64,{}" class="attachment"/>"#,
            escape_html(&file.mime_type),
            file.data
        ));
    }
    message("user-message", &body)
}

/// Incoming message in whatever state the turn is in
pub fn render_bot_message(status: &TurnStatus) -> String {
    match status {
        TurnStatus::Thinking => message(
            "bot-message thinking",
            &format!(r#"<div class="message-text">{}</div>"#, THINKING_INDICATOR),
        ),
        TurnStatus::Answered(markup) => message(
            "bot-message",
            &format!(r#"<div class="message-text">{}</div>"#, markup),
        ),
        TurnStatus::Failed(error) => message(
            "bot-message error",
            &format!(r#"<div class="message-text">Error: {}</div>"#, escape_html(error)),
        ),
    }
}

/// Standalone page with every logged message of a conversation
pub fn render_transcript_page(title: &str, log: &ConversationLog) -> String {
    let body: String = log
        .entries()
        .iter()
        .map(|entry| match entry.role {
            LogRole::User => render_user_message(&entry.text, entry.file.as_ref()),
            LogRole::Bot => render_bot_message(&TurnStatus::Answered(entry.text.clone())),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<div class=\"chat-body\">\n{body}\n</div>\n</body>\n</html>\n",
        title = escape_html(title),
        body = body
    )
}
