//! In-memory document and session stores, plus artifact files on disk
//!
//! Documents carry their text and analyzed fields together; sessions
//! carry their conversation history. Rendered artifacts are written
//! under the data directory (`outputs/<doc>/filled.txt` and
//! `previews/<doc>/index.html`) and tracked so downloads can find the
//! latest render.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::document::DocumentText;
use crate::error::{FillError, FillResult};
use crate::model::{
    Artifact, ArtifactKind, ChatMessage, DocumentRecord, DocumentStatus, Field, FillSession,
    SessionState,
};

#[derive(Debug, Clone)]
struct DocumentEntry {
    record: DocumentRecord,
    text: DocumentText,
    fields: Vec<Field>,
}

/// Registered documents with their text and analyzed fields
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    inner: Arc<RwLock<HashMap<Uuid, DocumentEntry>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document; fields start empty until analysis runs.
    pub async fn insert(&self, filename: impl Into<String>, text: DocumentText) -> DocumentRecord {
        let record = DocumentRecord::new(filename);
        self.inner.write().await.insert(
            record.id,
            DocumentEntry {
                record: record.clone(),
                text,
                fields: Vec::new(),
            },
        );
        record
    }

    pub async fn get(&self, id: Uuid) -> FillResult<DocumentRecord> {
        self.inner
            .read()
            .await
            .get(&id)
            .map(|e| e.record.clone())
            .ok_or(FillError::DocumentNotFound(id))
    }

    pub async fn text(&self, id: Uuid) -> FillResult<DocumentText> {
        self.inner
            .read()
            .await
            .get(&id)
            .map(|e| e.text.clone())
            .ok_or(FillError::DocumentNotFound(id))
    }

    pub async fn fields(&self, id: Uuid) -> FillResult<Vec<Field>> {
        self.inner
            .read()
            .await
            .get(&id)
            .map(|e| e.fields.clone())
            .ok_or(FillError::DocumentNotFound(id))
    }

    pub async fn set_status(&self, id: Uuid, status: DocumentStatus) -> FillResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner.get_mut(&id).ok_or(FillError::DocumentNotFound(id))?;
        entry.record.status = status;
        Ok(())
    }

    /// Replace a document's analyzed fields; a re-parse discards the old
    /// set entirely.
    pub async fn replace_fields(&self, id: Uuid, fields: Vec<Field>) -> FillResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner.get_mut(&id).ok_or(FillError::DocumentNotFound(id))?;
        entry.fields = fields;
        Ok(())
    }
}

/// Fill sessions with their conversation history
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, FillSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, document_id: Uuid) -> FillSession {
        let session = FillSession::new(document_id);
        self.inner
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> FillResult<FillSession> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(FillError::SessionNotFound(id))
    }

    /// Append the turn's user and assistant messages to the history.
    pub async fn record_turn(
        &self,
        id: Uuid,
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> FillResult<()> {
        let mut inner = self.inner.write().await;
        let session = inner.get_mut(&id).ok_or(FillError::SessionNotFound(id))?;
        session.history.push(user);
        session.history.push(assistant);
        Ok(())
    }

    /// Move a session to a new state. Entering `Completed` stamps
    /// `completed_at`; leaving it clears the stamp.
    pub async fn set_state(&self, id: Uuid, state: SessionState) -> FillResult<()> {
        let mut inner = self.inner.write().await;
        let session = inner.get_mut(&id).ok_or(FillError::SessionNotFound(id))?;
        if session.state != state {
            session.state = state;
            session.completed_at = match state {
                SessionState::Completed => Some(Utc::now()),
                _ => None,
            };
        }
        Ok(())
    }
}

/// Rendered artifacts on disk, one latest per (document, kind)
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_dir: PathBuf,
    records: Arc<RwLock<HashMap<(Uuid, ArtifactKind), Artifact>>>,
}

impl ArtifactStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn path_for(&self, document_id: Uuid, kind: ArtifactKind) -> PathBuf {
        match kind {
            ArtifactKind::FilledText => self
                .data_dir
                .join("outputs")
                .join(document_id.to_string())
                .join("filled.txt"),
            ArtifactKind::HtmlPreview => self
                .data_dir
                .join("previews")
                .join(document_id.to_string())
                .join("index.html"),
        }
    }

    /// Write one rendered artifact, replacing any previous render.
    pub async fn write(
        &self,
        document_id: Uuid,
        kind: ArtifactKind,
        content: &str,
    ) -> FillResult<Artifact> {
        let path = self.path_for(document_id, kind);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        info!("wrote {:?} artifact to {}", kind, path.display());

        let artifact = Artifact {
            id: Uuid::new_v4(),
            document_id,
            kind,
            path: path.display().to_string(),
            created_at: Utc::now(),
        };
        self.records
            .write()
            .await
            .insert((document_id, kind), artifact.clone());
        Ok(artifact)
    }

    pub async fn latest(&self, document_id: Uuid, kind: ArtifactKind) -> Option<Artifact> {
        self.records
            .read()
            .await
            .get(&(document_id, kind))
            .cloned()
    }

    /// Read the latest artifact's content back from disk.
    pub async fn read(&self, document_id: Uuid, kind: ArtifactKind) -> FillResult<String> {
        let artifact = self
            .latest(document_id, kind)
            .await
            .ok_or(FillError::ArtifactMissing(document_id))?;
        Ok(tokio::fs::read_to_string(Path::new(&artifact.path)).await?)
    }
}
