//! Fill engine
//!
//! Ties the stores, the resolver, the analyzer and the materializer
//! together behind one façade the HTTP layer (and tests) drive. Turns
//! for one session serialize on a per-session lock; rendering one
//! document's artifacts serializes on a per-document lock.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::analysis::FieldAnalyzer;
use crate::config::EngineConfig;
use crate::document::{self, DocumentText, PreviewOptions};
use crate::error::{FillError, FillResult};
use crate::ledger::AnswerLedger;
use crate::model::{
    AnswerSource, Artifact, ArtifactKind, ChatMessage, DocumentRecord, DocumentStatus, Field,
    FillSession, Progress, SessionState,
};
use crate::oracle::{GeminiClient, OracleClient};
use crate::registry::FieldRegistry;
use crate::resolver::{Lexicon, TurnRequest, TurnResolver};
use crate::store::{ArtifactStore, DocumentStore, SessionStore};

/// Reply to one chat turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub assistant: String,
    pub progress: Progress,
}

/// The two artifacts produced by one render
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub filled: Artifact,
    pub preview: Artifact,
}

type LockMap = Mutex<HashMap<Uuid, Arc<Mutex<()>>>>;

pub struct FillEngine {
    config: EngineConfig,
    documents: DocumentStore,
    sessions: SessionStore,
    artifacts: ArtifactStore,
    ledger: AnswerLedger,
    resolver: TurnResolver,
    analyzer: Option<FieldAnalyzer>,
    turn_locks: LockMap,
    render_locks: LockMap,
}

impl FillEngine {
    /// Build an engine with the oracle the configuration provides; the
    /// engine still answers turns deterministically without one.
    pub fn new(config: EngineConfig) -> Self {
        let oracle = GeminiClient::from_config(&config)
            .map(|client| Arc::new(client) as Arc<dyn OracleClient>);
        Self::with_oracle(config, oracle)
    }

    /// Build an engine around a specific oracle, or none.
    pub fn with_oracle(config: EngineConfig, oracle: Option<Arc<dyn OracleClient>>) -> Self {
        let analyzer = oracle
            .clone()
            .map(|o| FieldAnalyzer::new(o, config.analysis_truncation));
        let resolver = TurnResolver::new(oracle, Lexicon::default());
        let artifacts = ArtifactStore::new(&config.data_dir);
        Self {
            config,
            documents: DocumentStore::new(),
            sessions: SessionStore::new(),
            artifacts,
            ledger: AnswerLedger::new(),
            resolver,
            analyzer,
            turn_locks: Mutex::new(HashMap::new()),
            render_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn register_document(
        &self,
        filename: impl Into<String>,
        text: DocumentText,
    ) -> DocumentRecord {
        let record = self.documents.insert(filename, text).await;
        info!("registered document {} ({})", record.id, record.filename);
        record
    }

    pub async fn document(&self, document_id: Uuid) -> FillResult<DocumentRecord> {
        self.documents.get(document_id).await
    }

    pub async fn fields(&self, document_id: Uuid) -> FillResult<Vec<Field>> {
        self.documents.fields(document_id).await
    }

    /// Run field detection over a document's text, replacing any earlier
    /// field set. Transport failure marks the document `ParseFailed`.
    pub async fn analyze_document(&self, document_id: Uuid) -> FillResult<Vec<Field>> {
        let Some(analyzer) = &self.analyzer else {
            return Err(FillError::Configuration {
                message: "field analysis requires an oracle API key".to_string(),
            });
        };
        let text = self.documents.text(document_id).await?;

        match analyzer.detect_fields(document_id, &text).await {
            Ok(fields) => {
                self.documents
                    .replace_fields(document_id, fields.clone())
                    .await?;
                self.documents
                    .set_status(document_id, DocumentStatus::Parsed)
                    .await?;
                Ok(fields)
            }
            Err(err) => {
                self.documents
                    .set_status(document_id, DocumentStatus::ParseFailed)
                    .await?;
                Err(FillError::Oracle(err))
            }
        }
    }

    pub async fn create_session(&self, document_id: Uuid) -> FillResult<FillSession> {
        self.documents.get(document_id).await?;
        let session = self.sessions.create(document_id).await;
        info!("created session {} for document {}", session.id, document_id);
        Ok(session)
    }

    pub async fn session(&self, session_id: Uuid) -> FillResult<FillSession> {
        self.sessions.get(session_id).await
    }

    /// Process one chat turn: resolve, apply at most one ledger commit,
    /// record the exchange, and recalculate the session state.
    pub async fn process_turn(&self, session_id: Uuid, utterance: &str) -> FillResult<TurnReply> {
        let turn_lock = lock_for(&self.turn_locks, session_id).await;
        let _turn = turn_lock.lock().await;

        let session = self.sessions.get(session_id).await?;
        let fields = self.documents.fields(session.document_id).await?;
        let registry = FieldRegistry::new(fields);
        let answers = self.ledger.all_for(session_id).await;
        let window = history_window(&session.history, self.config.history_window);

        let outcome = self
            .resolver
            .resolve(TurnRequest {
                utterance,
                registry: &registry,
                answers: &answers,
                history: window,
            })
            .await;

        if let Some(commit) = &outcome.commit {
            self.ledger
                .upsert(session_id, commit.field_id, commit.value.clone(), AnswerSource::User)
                .await;
            info!(
                "session {} committed '{}' to field {}",
                session_id, commit.value, commit.field_id
            );
        }

        self.sessions
            .record_turn(
                session_id,
                ChatMessage::user(utterance),
                ChatMessage::assistant(outcome.assistant.clone()),
            )
            .await?;

        let answered = self.ledger.answered_ids(session_id).await;
        let progress = Progress {
            filled: registry.answered_count(&answered),
            total: registry.len(),
        };

        if !registry.is_empty() {
            // A re-opened field still waiting for its value keeps a fully
            // answered session in progress.
            let state = if registry.all_required_answered(&answered)
                && outcome.reopened_field.is_none()
            {
                SessionState::Completed
            } else {
                SessionState::InProgress
            };
            self.sessions.set_state(session_id, state).await?;
        }

        Ok(TurnReply {
            assistant: outcome.assistant,
            progress,
        })
    }

    /// Materialize the filled document and its HTML preview as artifacts
    /// on disk and mark the document `Filled`.
    pub async fn render(&self, document_id: Uuid, session_id: Uuid) -> FillResult<RenderOutput> {
        let render_lock = lock_for(&self.render_locks, document_id).await;
        let _render = render_lock.lock().await;

        let record = self.documents.get(document_id).await?;
        let session = self.sessions.get(session_id).await?;
        if session.document_id != document_id {
            return Err(FillError::SessionNotFound(session_id));
        }

        let values = self.ledger.values_for(session_id).await;
        if values.is_empty() {
            return Err(FillError::NoAnswers(session_id));
        }
        let fields = self.documents.fields(document_id).await?;
        if fields.is_empty() {
            return Err(FillError::NoFields(document_id));
        }
        let text = self.documents.text(document_id).await?;

        let filled = document::fill(&text, &fields, &values);
        let html = document::render_preview(
            &record.filename,
            &text,
            &fields,
            &values,
            PreviewOptions { partial: false },
        );

        let filled_artifact = self
            .artifacts
            .write(document_id, ArtifactKind::FilledText, &filled.to_plain_text())
            .await?;
        let preview_artifact = self
            .artifacts
            .write(document_id, ArtifactKind::HtmlPreview, &html)
            .await?;
        self.documents
            .set_status(document_id, DocumentStatus::Filled)
            .await?;
        info!(
            "rendered document {} with {} filled value(s)",
            document_id,
            values.len()
        );

        Ok(RenderOutput {
            filled: filled_artifact,
            preview: preview_artifact,
        })
    }

    /// Render the preview markup for the session's current answers
    /// without touching disk. Works with any number of answers,
    /// including none.
    pub async fn live_preview(&self, document_id: Uuid, session_id: Uuid) -> FillResult<String> {
        let record = self.documents.get(document_id).await?;
        let session = self.sessions.get(session_id).await?;
        if session.document_id != document_id {
            return Err(FillError::SessionNotFound(session_id));
        }
        let fields = self.documents.fields(document_id).await?;
        let text = self.documents.text(document_id).await?;
        let values = self.ledger.values_for(session_id).await;

        Ok(document::render_preview(
            &record.filename,
            &text,
            &fields,
            &values,
            PreviewOptions { partial: true },
        ))
    }

    /// Latest rendered artifact content for download.
    pub async fn artifact_content(
        &self,
        document_id: Uuid,
        kind: ArtifactKind,
    ) -> FillResult<String> {
        self.documents.get(document_id).await?;
        self.artifacts.read(document_id, kind).await
    }
}

async fn lock_for(map: &LockMap, id: Uuid) -> Arc<Mutex<()>> {
    map.lock().await.entry(id).or_default().clone()
}

fn history_window(history: &[ChatMessage], window: usize) -> &[ChatMessage] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}
