//! Turn-taking state for one chat session.
//!
//! A turn goes through two phases: [`ConversationController::begin_turn`]
//! records the user turn and builds the request, then
//! [`ConversationController::complete_turn`] ingests whatever the service
//! returned. [`ConversationController::submit_turn`] runs both around the call.

use std::path::Path;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attachment::{AttachmentPolicy, PendingAttachment};
use crate::client::InferenceService;
use crate::config::ChatConfig;
use crate::errors::GeminiResult;
use crate::format::format_reply;
use crate::history::{ConversationLog, HistoryWindow, LogRole, Transcript};
use crate::types::{Content, GenerateContentRequest, GenerateContentResponse, InlineData};

/// State of the reply to a submitted turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStatus {
    Thinking,
    /// Reply markup
    Answered(String),
    /// Error message
    Failed(String),
}

/// A user turn that has been recorded and sent (or is about to be)
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub text: String,
    pub attachment: Option<InlineData>,
    pub request: GenerateContentRequest,
    pub status: TurnStatus,
}

impl PendingTurn {
    pub fn is_error(&self) -> bool {
        matches!(self.status, TurnStatus::Failed(_))
    }
}

#[derive(Debug)]
pub struct ConversationController {
    session_id: Uuid,
    transcript: Transcript,
    log: ConversationLog,
    pending_attachment: Option<PendingAttachment>,
    attachment_policy: AttachmentPolicy,
    history_window: HistoryWindow,
    fallback_reply: String,
    thinking: bool,
}

impl ConversationController {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            transcript: Transcript::new(),
            log: ConversationLog::new(),
            pending_attachment: None,
            attachment_policy: config.attachment_policy(),
            history_window: config.history_window(),
            fallback_reply: config.fallback_reply().to_string(),
            thinking: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn pending_attachment(&self) -> Option<&PendingAttachment> {
        self.pending_attachment.as_ref()
    }

    pub fn attachment_policy(&self) -> AttachmentPolicy {
        self.attachment_policy
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Stages raw file bytes for the next turn, replacing any staged file
    pub fn stage_attachment(&mut self, bytes: &[u8], mime_type: &str) -> GeminiResult<()> {
        let attachment = PendingAttachment::from_bytes(bytes, mime_type)?;
        self.stage(attachment);
        Ok(())
    }

    pub fn stage_attachment_file(&mut self, path: &Path) -> GeminiResult<()> {
        let attachment = PendingAttachment::from_file(path)?;
        self.stage(attachment);
        Ok(())
    }

    pub fn stage_attachment_data_url(&mut self, url: &str) -> GeminiResult<()> {
        let attachment = PendingAttachment::from_data_url(url)?;
        self.stage(attachment);
        Ok(())
    }

    fn stage(&mut self, attachment: PendingAttachment) {
        debug!(
            mime_type = %attachment.mime_type,
            bytes = attachment.decoded_len(),
            replaced = self.pending_attachment.is_some(),
            "Staged attachment"
        );
        self.pending_attachment = Some(attachment);
    }

    /// Drops the staged file, returning it if there was one
    pub fn cancel_attachment(&mut self) -> Option<PendingAttachment> {
        self.pending_attachment.take()
    }

    /// Starts a new conversation
    pub fn reset(&mut self) {
        info!(
            session_id = %self.session_id,
            turns = self.transcript.len(),
            "Resetting conversation"
        );
        self.session_id = Uuid::new_v4();
        self.transcript = Transcript::new();
        self.log = ConversationLog::new();
        self.pending_attachment = None;
        self.thinking = false;
    }

    /// Staged file first, then the latest logged file if the policy allows it.
    /// Consumes the staged slot.
    fn resolve_attachment(&mut self) -> Option<InlineData> {
        if let Some(staged) = self.pending_attachment.take() {
            return Some(staged.into());
        }
        match self.attachment_policy {
            AttachmentPolicy::ReuseLatest => {
                let recalled = self.log.latest_attachment().cloned();
                if recalled.is_some() {
                    debug!("Reusing the most recent attachment from the conversation");
                }
                recalled
            }
            AttachmentPolicy::ExplicitOnly => None,
        }
    }

    /// Records a user turn and builds the request for it.
    ///
    /// Returns `None` without touching any state when `text` is blank.
    pub fn begin_turn(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty input");
            return None;
        }

        let attachment = self.resolve_attachment();
        self.transcript.push(Content::user(text, attachment.clone()));
        self.log.record(LogRole::User, text, attachment.clone());
        self.thinking = true;

        let request = GenerateContentRequest {
            contents: self.transcript.window(self.history_window).to_vec(),
        };
        debug!(
            session_id = %self.session_id,
            turns = request.contents.len(),
            with_attachment = attachment.is_some(),
            "Composed turn"
        );

        Some(PendingTurn {
            text: text.to_string(),
            attachment,
            request,
            status: TurnStatus::Thinking,
        })
    }

    /// Settles a turn with the service's result.
    ///
    /// A reply is appended to the history; a failure only marks the turn.
    pub fn complete_turn(
        &mut self,
        mut turn: PendingTurn,
        result: GeminiResult<GenerateContentResponse>,
    ) -> PendingTurn {
        self.thinking = false;

        match result {
            Ok(response) => {
                let markup = format_reply(response.first_text(), &self.fallback_reply);
                self.transcript.push(Content::model(markup.clone()));
                self.log.record(LogRole::Bot, markup.clone(), None);
                info!(session_id = %self.session_id, chars = markup.len(), "Received reply");
                turn.status = TurnStatus::Answered(markup);
            }
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "Turn failed");
                turn.status = TurnStatus::Failed(e.to_string());
            }
        }

        turn
    }

    /// Records `text`, sends it with the conversation so far and ingests the reply.
    ///
    /// Returns `None` for blank input, in which case nothing is sent.
    pub async fn submit_turn<S>(&mut self, text: &str, service: &S) -> Option<PendingTurn>
    where
        S: InferenceService + ?Sized,
    {
        let turn = self.begin_turn(text)?;
        let result = service.generate_content(&turn.request).await;
        Some(self.complete_turn(turn, result))
    }
}
