//! Domain model for documents, fields, sessions and answers
//!
//! These records flow through the stores, the resolver and the HTTP layer.
//! Fields are immutable once analysis has produced them; answers are the
//! only mutable per-session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a registered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Registered, analysis not yet run
    Registered,
    /// Analysis produced a field set (possibly empty)
    Parsed,
    /// Analysis failed at the oracle transport level
    ParseFailed,
    /// A filled artifact has been rendered
    Filled,
}

/// A registered template document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub filename: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            status: DocumentStatus::Registered,
            created_at: Utc::now(),
        }
    }
}

/// Declared type of a placeholder field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Date,
    Number,
    PartyName,
    Address,
    Money,
    Boolean,
    EnumChoice,
}

impl FieldKind {
    /// Short label as it appears in prompts and detection output
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::PartyName => "party_name",
            FieldKind::Address => "address",
            FieldKind::Money => "money",
            FieldKind::Boolean => "boolean",
            FieldKind::EnumChoice => "enum",
        }
    }

    /// Lenient parse for oracle-supplied type strings. Unknown kinds fall
    /// back to `Text` rather than failing the whole field.
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "date" => FieldKind::Date,
            "number" | "numeric" | "int" | "integer" => FieldKind::Number,
            "party_name" | "party" | "name" => FieldKind::PartyName,
            "address" => FieldKind::Address,
            "money" | "amount" | "currency" => FieldKind::Money,
            "boolean" | "bool" | "yes_no" => FieldKind::Boolean,
            "enum" | "enum_choice" | "choice" => FieldKind::EnumChoice,
            _ => FieldKind::Text,
        }
    }
}

/// A blank to fill: one placeholder detected in the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: Uuid,
    pub document_id: Uuid,
    /// Stable machine name, e.g. `company_name`
    pub name: String,
    /// Human description of what belongs in the blank
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    /// Position in the document's fill order
    pub order_index: usize,
    /// Verbatim text surrounding the blank, used for span matching
    pub source_excerpt: Option<String>,
    pub paragraph_index: Option<usize>,
    pub char_start: Option<usize>,
    pub char_end: Option<usize>,
}

impl Field {
    /// Human-readable name: `company_name` becomes `Company Name`
    pub fn display_name(&self) -> String {
        self.name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Lifecycle of a fill session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    InProgress,
    Completed,
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a session's conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A conversational fill session over one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillSession {
    pub id: Uuid,
    pub document_id: Uuid,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Full conversation; the turn prompt sees a bounded recent window
    pub history: Vec<ChatMessage>,
}

impl FillSession {
    pub fn new(document_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            state: SessionState::Pending,
            started_at: Utc::now(),
            completed_at: None,
            history: Vec::new(),
        }
    }
}

/// Where an answer value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    User,
    Inferred,
}

/// Latest accepted value for one field in one session.
///
/// One logical answer per (session, field); an edit overwrites in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub session_id: Uuid,
    pub field_id: Uuid,
    pub value: Option<String>,
    pub source: AnswerSource,
    pub updated_at: DateTime<Utc>,
}

impl Answer {
    /// Only a non-empty value counts as answered
    pub fn is_answered(&self) -> bool {
        self.value
            .as_deref()
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Kind of rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    FilledText,
    HtmlPreview,
}

/// A rendered output written under the data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub document_id: Uuid,
    pub kind: ArtifactKind,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// Fill progress reported after every turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub filled: usize,
    pub total: usize,
}
