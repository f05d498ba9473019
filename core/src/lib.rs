// Core chat functionality:
// - API client for Gemini
// - Request/response data structures
// - Conversation state and attachment handling
// - Reply formatting and HTML rendering
// - Configuration loading
// - Shared error types

// Export client module - API client for Gemini
pub mod client;
pub use client::*;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;

pub mod attachment;
pub use attachment::{AttachmentPolicy, PendingAttachment};

pub mod history;
pub use history::{ConversationLog, HistoryWindow, LogEntry, LogRole, Transcript};

pub mod controller;
pub use controller::{ConversationController, PendingTurn, TurnStatus};

pub mod format;
pub mod render;
