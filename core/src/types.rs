use serde::{Deserialize, Serialize};

/// Role tag on a turn, in the API's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Base64 payload of an attached file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub data: String,
    #[serde(alias = "mimeType")]
    pub mime_type: String,
}

/// Part structure for a piece of content
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "inline_data",
        alias = "inlineData",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_data(data: InlineData) -> Self {
        Self {
            text: None,
            inline_data: Some(data),
        }
    }
}

/// One role-tagged turn: a text part, optionally followed by an inline attachment
#[derive(Serialize, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>, attachment: Option<InlineData>) -> Self {
        let mut parts = vec![Part::text(text)];
        if let Some(data) = attachment {
            parts.push(Part::inline_data(data));
        }
        Self {
            role: Some(Role::User),
            parts,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::Model),
            parts: vec![Part::text(text)],
        }
    }

    /// Text of the first part, if that part is textual
    pub fn first_text(&self) -> Option<&str> {
        self.parts.first().and_then(|part| part.text.as_deref())
    }

    /// First inline attachment in this turn
    pub fn attachment(&self) -> Option<&InlineData> {
        self.parts.iter().find_map(|part| part.inline_data.as_ref())
    }
}

/// Request body for `generateContent`
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

/// Response from Gemini API
#[derive(Deserialize, Debug, Serialize, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, when every step exists
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(Content::first_text)
    }

    /// Convenience constructor for a single text candidate
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content::model(text)),
            }],
        }
    }
}

/// Candidate in the response
#[derive(Deserialize, Debug, Serialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

/// Error envelope returned with non-2xx statuses
#[derive(Deserialize, Debug, Default)]
pub struct ApiErrorResponse {
    pub error: Option<ApiErrorDetail>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ApiErrorDetail {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}
