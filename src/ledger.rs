//! Answer ledger
//!
//! Per-session map of field to latest accepted value. An edit overwrites
//! the stored answer in place; there is no delete and no history. Only
//! non-empty values count as answered.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{Answer, AnswerSource};

type LedgerMap = HashMap<Uuid, HashMap<Uuid, Answer>>;

#[derive(Debug, Clone, Default)]
pub struct AnswerLedger {
    answers: Arc<RwLock<LedgerMap>>,
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest answer for one field, if any
    pub async fn get(&self, session_id: Uuid, field_id: Uuid) -> Option<Answer> {
        self.answers
            .read()
            .await
            .get(&session_id)
            .and_then(|fields| fields.get(&field_id))
            .cloned()
    }

    /// Insert or overwrite the answer for one field
    pub async fn upsert(
        &self,
        session_id: Uuid,
        field_id: Uuid,
        value: impl Into<String>,
        source: AnswerSource,
    ) -> Answer {
        let value = value.into();
        let mut answers = self.answers.write().await;
        let fields = answers.entry(session_id).or_default();

        let answer = fields
            .entry(field_id)
            .and_modify(|existing| {
                existing.value = Some(value.clone());
                existing.source = source;
                existing.updated_at = Utc::now();
            })
            .or_insert_with(|| Answer {
                id: Uuid::new_v4(),
                session_id,
                field_id,
                value: Some(value),
                source,
                updated_at: Utc::now(),
            });
        answer.clone()
    }

    /// All answers recorded for a session, keyed by field id
    pub async fn all_for(&self, session_id: Uuid) -> HashMap<Uuid, Answer> {
        self.answers
            .read()
            .await
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Ids of fields with a non-empty answer
    pub async fn answered_ids(&self, session_id: Uuid) -> HashSet<Uuid> {
        self.answers
            .read()
            .await
            .get(&session_id)
            .map(|fields| {
                fields
                    .values()
                    .filter(|a| a.is_answered())
                    .map(|a| a.field_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Non-empty values keyed by field id, as the materializer consumes them
    pub async fn values_for(&self, session_id: Uuid) -> HashMap<Uuid, String> {
        self.answers
            .read()
            .await
            .get(&session_id)
            .map(|fields| {
                fields
                    .values()
                    .filter(|a| a.is_answered())
                    .filter_map(|a| a.value.clone().map(|v| (a.field_id, v)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
