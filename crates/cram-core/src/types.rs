//! Core domain types for Cram.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for sessions.
pub type SessionId = String;

/// Unique identifier for users.
pub type UserId = String;

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Processing state of a session.
///
/// A session starts `pending`, moves through `processing`, and ends in
/// exactly one terminal state. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::CompletedWithErrors => "completed_with_errors",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SessionStatus::Pending),
            "processing" => Some(SessionStatus::Processing),
            "completed" => Some(SessionStatus::Completed),
            "completed_with_errors" => Some(SessionStatus::CompletedWithErrors),
            "failed" => Some(SessionStatus::Failed),
            _ => None,
        }
    }

    /// Whether this is a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::CompletedWithErrors | SessionStatus::Failed
        )
    }

    /// Whether a write moving from `self` to `next` is allowed.
    ///
    /// Transitions are monotonic: terminal states accept no further writes.
    /// `processing -> processing` is allowed so a run can be retried safely.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        match self {
            SessionStatus::Pending => next != SessionStatus::Pending,
            SessionStatus::Processing => next != SessionStatus::Pending,
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broad media category used to pick an extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Pdf,
    Word,
    Presentation,
    Text,
    Other,
}

impl MediaKind {
    /// Classify a declared MIME type. Checked in priority order; the first
    /// match wins.
    pub fn from_mime(media_type: &str) -> Self {
        let mime = media_type.trim().to_ascii_lowercase();
        // Drop any parameters like "; charset=utf-8"
        let mime = mime.split(';').next().unwrap_or("").trim().to_string();

        if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime == "application/pdf" {
            MediaKind::Pdf
        } else if mime == "application/msword"
            || mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            || mime == "application/vnd.oasis.opendocument.text"
        {
            MediaKind::Word
        } else if mime == "application/vnd.ms-powerpoint"
            || mime == "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            || mime == "application/vnd.oasis.opendocument.presentation"
        {
            MediaKind::Presentation
        } else if mime.starts_with("text/") {
            MediaKind::Text
        } else {
            MediaKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Pdf => "pdf",
            MediaKind::Word => "word",
            MediaKind::Presentation => "presentation",
            MediaKind::Text => "text",
            MediaKind::Other => "other",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reference to one uploaded file in a session.
///
/// Immutable once the session is read for processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    pub file_name: String,
    pub url: String,
    /// Opaque storage key that can be used to derive a signed URL.
    pub storage_key: Option<String>,
    pub media_type: String,
    pub size_bytes: i64,
}

impl FileRef {
    pub fn new(
        file_name: impl Into<String>,
        url: impl Into<String>,
        media_type: impl Into<String>,
        size_bytes: i64,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            url: url.into(),
            storage_key: None,
            media_type: media_type.into(),
            size_bytes,
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.media_type)
    }
}

/// What study materials the user asked for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Preferences {
    pub summary: bool,
    pub flashcards: bool,
    pub study_guide: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            summary: true,
            flashcards: true,
            study_guide: true,
        }
    }
}

/// A generated question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// A non-fatal per-file failure, collected while the batch continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingError {
    pub file_name: String,
    pub message: String,
}

impl ProcessingError {
    pub fn new(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file_name, self.message)
    }
}

/// One bounded, overlapping segment of extracted text.
///
/// Ordering within a file is the split order; ordering across files follows
/// the session's file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub file_name: String,
    pub media_type: String,
    pub chunk_index: i32,
    pub content: String,
}

impl ChunkRecord {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        chunk_index: i32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            chunk_index,
            content: content.into(),
        }
    }
}

/// Result fields filled in when a session reaches a terminal state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionResults {
    pub summary: Option<String>,
    pub flashcards: Vec<Flashcard>,
    pub study_guide: Option<String>,
    pub total_text_length: i64,
    pub total_chunks: i64,
    pub successful_files: Vec<String>,
    pub processing_errors: Option<Vec<String>>,
}

/// One user-initiated batch of files with one aggregate outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub files: Vec<FileRef>,
    pub preferences: Preferences,
    pub status: SessionStatus,
    /// Human-readable reason, set only when status is `failed`.
    pub error_message: Option<String>,
    pub results: SessionResults,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            files: Vec::new(),
            preferences: Preferences::default(),
            status: SessionStatus::Pending,
            error_message: None,
            results: SessionResults::default(),
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    pub fn with_file(mut self, file: FileRef) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }
}
