//! Turn resolution
//!
//! One utterance in, one reply out, with at most one ledger commit per
//! turn. The resolver picks the active field, asks the oracle to judge
//! the utterance, validates the judgment locally, and degrades to a
//! deterministic path when the oracle is unavailable or unreadable.
//! Completion, keep-or-change disambiguation and the no-fields case are
//! answered without an oracle round at all.

pub mod examples;
pub mod lexicon;
pub mod select;

pub use examples::examples_for;
pub use lexicon::Lexicon;
pub use select::{select_field, FieldSelection};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::guard;
use crate::model::{Answer, ChatMessage, Field};
use crate::oracle::{
    build_turn_prompt, parse_verdict, OracleClient, TurnIntent, TurnPromptInput, Verdict,
};
use crate::registry::FieldRegistry;

const COMPLETION_MESSAGE: &str = "Excellent! All placeholders have been filled. You can now \
     render and download the completed document. If you'd like to edit any field, just say \
     'change [field name]'.";

const NO_FIELDS_MESSAGE: &str =
    "No placeholders found for this document. Please upload and parse the document first.";

/// One field/value pair to write into the answer ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnCommit {
    pub field_id: Uuid,
    pub value: String,
}

/// What one resolved turn produced
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub assistant: String,
    pub commit: Option<TurnCommit>,
    /// Field re-opened for editing this turn, still waiting for its
    /// replacement value
    pub reopened_field: Option<Uuid>,
}

impl TurnOutcome {
    fn reply(assistant: String) -> Self {
        Self {
            assistant,
            commit: None,
            reopened_field: None,
        }
    }

    fn reopen(assistant: String, field_id: Uuid) -> Self {
        Self {
            assistant,
            commit: None,
            reopened_field: Some(field_id),
        }
    }
}

/// Everything the resolver needs to judge one utterance
pub struct TurnRequest<'a> {
    pub utterance: &'a str,
    pub registry: &'a FieldRegistry,
    /// All recorded answers for the session, keyed by field
    pub answers: &'a HashMap<Uuid, Answer>,
    /// Recent messages, already windowed, without the current utterance
    pub history: &'a [ChatMessage],
}

pub struct TurnResolver {
    oracle: Option<Arc<dyn OracleClient>>,
    lexicon: Lexicon,
}

impl TurnResolver {
    pub fn new(oracle: Option<Arc<dyn OracleClient>>, lexicon: Lexicon) -> Self {
        Self { oracle, lexicon }
    }

    pub async fn resolve(&self, req: TurnRequest<'_>) -> TurnOutcome {
        let utterance = req.utterance.trim();
        let message_lower = utterance.to_lowercase();
        let answered = answered_ids(req.answers);

        let (current, edit_selected) =
            match select_field(req.registry, &self.lexicon, utterance, &answered) {
                FieldSelection::NoFields => {
                    return TurnOutcome::reply(NO_FIELDS_MESSAGE.to_string());
                }
                FieldSelection::Completed => {
                    return TurnOutcome::reply(COMPLETION_MESSAGE.to_string());
                }
                FieldSelection::Fill(field) => (field, false),
                FieldSelection::Edit(field) => (field, true),
            };

        let existing_value = req
            .answers
            .get(&current.id)
            .filter(|a| a.is_answered())
            .and_then(|a| a.value.clone());

        // Revisiting an answered field without an edit cue gets settled
        // in one deterministic turn: keep it, or say what to change.
        let potential_edit = self.lexicon.has_edit_cue(&message_lower) && !answered.is_empty();
        if let Some(existing) = existing_value.as_deref() {
            if !potential_edit {
                if self.lexicon.wants_to_keep(&message_lower) {
                    return self.keep_reply(req.registry, current, existing, &answered);
                }
                if !self.lexicon.has_explicit_edit(&message_lower) {
                    return TurnOutcome::reopen(
                        format!(
                            "I already have '{}' for {}. Would you like to keep this value, or \
                             change it?{}",
                            existing,
                            current.display_name(),
                            examples_suffix(current)
                        ),
                        current.id,
                    );
                }
            }
        }

        let greeting = self.lexicon.is_greeting(&message_lower) && existing_value.is_none();
        let effective_utterance = if greeting {
            format!(
                "Hello! I'm ready to help you fill out this document. Let's start with {}.",
                current.name.replace('_', " ")
            )
        } else {
            utterance.to_string()
        };

        let verdict = self
            .oracle_round(
                &req,
                current,
                existing_value.as_deref(),
                &answered,
                &effective_utterance,
                utterance,
            )
            .await;
        let verdict = match verdict {
            Verdict::Malformed => self.classify_locally(
                utterance,
                current,
                self.lexicon.has_edit_cue(&message_lower),
            ),
            other => other,
        };

        let outcome = match verdict {
            Verdict::Accepted {
                value,
                target_field,
                message,
            } => self.commit_reply(&req, current, edit_selected, value, target_field, message),
            Verdict::EditRequest { field, message } => {
                self.edit_request_reply(&req, current, &field, message)
            }
            Verdict::NeedsClarification { intent, message } => {
                TurnOutcome::reply(ensure_message(message, intent, None, current))
            }
            Verdict::Malformed => TurnOutcome::reply(ensure_message(
                String::new(),
                TurnIntent::Unclear,
                None,
                current,
            )),
        };

        if greeting && outcome.commit.is_none() {
            let examples = examples_for(current.kind, &current.name);
            if !examples.is_empty()
                && !outcome
                    .assistant
                    .to_lowercase()
                    .contains(&examples.to_lowercase())
            {
                return TurnOutcome::reply(format!(
                    "Hello! I'll help you fill out this document. Let's start with {}. For \
                     example: {}. What would you like to use?",
                    current.display_name(),
                    examples
                ));
            }
        }

        outcome
    }

    async fn oracle_round(
        &self,
        req: &TurnRequest<'_>,
        current: &Field,
        existing_value: Option<&str>,
        answered: &HashSet<Uuid>,
        effective_utterance: &str,
        utterance: &str,
    ) -> Verdict {
        let Some(oracle) = &self.oracle else {
            return Verdict::Malformed;
        };

        let previous_answers: Vec<(String, String)> = req
            .registry
            .fields()
            .iter()
            .filter_map(|f| {
                req.answers
                    .get(&f.id)
                    .filter(|a| a.is_answered())
                    .and_then(|a| a.value.clone())
                    .map(|v| (f.name.clone(), v))
            })
            .collect();

        let mut history: Vec<ChatMessage> = req.history.to_vec();
        if let Some(existing) = existing_value {
            history.push(ChatMessage::assistant(format!(
                "I currently have '{}' for {}. Would you like to change it?",
                existing, current.name
            )));
        }
        history.push(ChatMessage::user(utterance));

        let examples = examples_for(current.kind, &current.name);
        let prompt = build_turn_prompt(&TurnPromptInput {
            field: current,
            next_field: req.registry.next_unanswered(current.id, answered),
            previous_answers: &previous_answers,
            history: &history,
            existing_answer: existing_value,
            field_examples: &examples,
            utterance: effective_utterance,
        });

        match oracle.generate(&prompt).await {
            Ok(raw) => parse_verdict(&raw, utterance),
            Err(err) => {
                warn!("oracle turn analysis failed: {}", err);
                Verdict::Malformed
            }
        }
    }

    /// Apply the echo guard and write the value to its target field,
    /// then phrase the reply: edits confirm, fresh answers hand off to
    /// the next blank when the oracle's message didn't.
    fn commit_reply(
        &self,
        req: &TurnRequest<'_>,
        current: &Field,
        edit_selected: bool,
        value: String,
        target_field: Option<String>,
        message: String,
    ) -> TurnOutcome {
        let (target, named) = match target_field.as_deref() {
            Some(name) => match req.registry.match_name(name) {
                Some(field) => (field, true),
                None => {
                    return TurnOutcome::reply(ensure_message(
                        message,
                        TurnIntent::EditField,
                        Some(name),
                        current,
                    ));
                }
            },
            None => (current, false),
        };

        let mut value = value;
        if guard::is_field_echo(&value, target) {
            match guard::residual_value(req.utterance, target) {
                Some(residual) => {
                    info!(
                        "value '{}' echoed field {}, keeping residual '{}'",
                        value, target.name, residual
                    );
                    value = residual;
                }
                None => {
                    return TurnOutcome::reply(ensure_message(
                        String::new(),
                        TurnIntent::Answer,
                        None,
                        target,
                    ));
                }
            }
        }

        let commit = Some(TurnCommit {
            field_id: target.id,
            value: value.clone(),
        });

        if named || edit_selected {
            let assistant = if message.trim().len() < 5 {
                format!("Perfect! I've saved '{}' for {}.", value, target.display_name())
            } else {
                message
            };
            return TurnOutcome {
                assistant,
                commit,
                reopened_field: None,
            };
        }

        let answered = answered_ids(req.answers);
        let mut assistant = message;
        match req.registry.next_unanswered(current.id, &answered) {
            Some(next) => {
                let lower = assistant.to_lowercase();
                let mentions_transition = lower.contains("next")
                    || lower.contains("now")
                    || lower.contains(&next.name.to_lowercase());
                if !mentions_transition || assistant.trim().len() < 5 {
                    assistant = format!(
                        "Perfect! I've saved '{}' for {}. Now, what about {}?{}",
                        value,
                        current.display_name(),
                        next.display_name(),
                        examples_suffix(next)
                    );
                }
            }
            None => {
                if assistant.trim().len() < 5 {
                    assistant =
                        format!("Perfect! I've saved '{}' for {}.", value, current.display_name());
                }
            }
        }
        TurnOutcome {
            assistant,
            commit,
            reopened_field: None,
        }
    }

    fn edit_request_reply(
        &self,
        req: &TurnRequest<'_>,
        current: &Field,
        target_name: &str,
        message: String,
    ) -> TurnOutcome {
        let Some(target) = req.registry.match_name(target_name) else {
            return TurnOutcome::reply(ensure_message(
                message,
                TurnIntent::EditField,
                Some(target_name),
                current,
            ));
        };

        let lower = message.to_lowercase();
        let assistant = if !lower.contains("what") && !lower.contains("value") {
            let existing = req
                .answers
                .get(&target.id)
                .filter(|a| a.is_answered())
                .and_then(|a| a.value.clone())
                .unwrap_or_else(|| "nothing".to_string());
            format!(
                "I see you want to edit {} (currently: '{}'). What should the new value be?{}",
                target_name,
                existing,
                examples_suffix(target)
            )
        } else {
            format!("I see you want to edit {}. {}", target_name, message)
        };
        TurnOutcome::reopen(assistant, target.id)
    }

    fn keep_reply(
        &self,
        registry: &FieldRegistry,
        current: &Field,
        value: &str,
        answered: &HashSet<Uuid>,
    ) -> TurnOutcome {
        match registry.next_unanswered(current.id, answered) {
            Some(next) => TurnOutcome::reply(format!(
                "Perfect! I'll keep '{}' for {}. Now, what about {}?{}",
                value,
                current.display_name(),
                next.display_name(),
                examples_suffix(next)
            )),
            None => TurnOutcome::reply(format!(
                "Perfect! I'll keep '{}'. All placeholders have been filled. You can now \
                 render and download the completed document.",
                value
            )),
        }
    }

    /// Single-shot classification for turns the oracle could not judge.
    fn classify_locally(&self, utterance: &str, field: &Field, has_edit_cue: bool) -> Verdict {
        let trimmed = utterance.trim();
        let lower = trimmed.to_lowercase();
        let is_answer =
            trimmed.len() > 1 && !trimmed.ends_with('?') && !self.lexicon.is_greeting(&lower);
        if !is_answer {
            return Verdict::NeedsClarification {
                intent: TurnIntent::Unclear,
                message: String::new(),
            };
        }
        let value = if has_edit_cue {
            salvage_value(trimmed, field, &self.lexicon)
        } else {
            trimmed.to_string()
        };
        if value.is_empty() {
            return Verdict::NeedsClarification {
                intent: TurnIntent::Unclear,
                message: String::new(),
            };
        }
        Verdict::Accepted {
            value,
            target_field: None,
            message: String::new(),
        }
    }
}

fn answered_ids(answers: &HashMap<Uuid, Answer>) -> HashSet<Uuid> {
    answers
        .values()
        .filter(|a| a.is_answered())
        .map(|a| a.field_id)
        .collect()
}

fn examples_suffix(field: &Field) -> String {
    let examples = examples_for(field.kind, &field.name);
    if examples.is_empty() {
        String::new()
    } else {
        format!(" For example: {}.", examples)
    }
}

/// Pull a usable value out of an edit utterance: drop the field wording,
/// then any leading cue words and connectors.
fn salvage_value(utterance: &str, field: &Field, lexicon: &Lexicon) -> String {
    let residual =
        guard::residual_value(utterance, field).unwrap_or_else(|| utterance.to_string());
    let mut tokens: Vec<&str> = residual.split_whitespace().collect();
    while tokens.len() > 1 && lexicon.is_edit_filler(tokens[0]) {
        tokens.remove(0);
    }
    if tokens.len() == 1 && lexicon.is_edit_filler(tokens[0]) {
        return String::new();
    }
    tokens.join(" ")
}

/// Replace empty or too-short oracle messages with the deterministic
/// per-intent template.
fn ensure_message(
    message: String,
    intent: TurnIntent,
    target: Option<&str>,
    field: &Field,
) -> String {
    if message.trim().len() >= 5 {
        return message;
    }
    let suffix = examples_suffix(field);
    let spaced = field.name.replace('_', " ");
    match intent {
        TurnIntent::Question => format!(
            "I understand you have a question. {}{}",
            field
                .description
                .as_deref()
                .unwrap_or("Could you provide the value for this field?"),
            suffix
        ),
        TurnIntent::Unclear => format!(
            "I need more clarity. For {}, I need: {}.{}",
            spaced,
            field.description.as_deref().unwrap_or("a value"),
            suffix
        ),
        TurnIntent::EditField => format!(
            "I understand you want to edit {}. What should the new value be?{}",
            target.unwrap_or("a field"),
            suffix
        ),
        _ => format!(
            "I need a value for {}. {}{}",
            spaced,
            field
                .description
                .as_deref()
                .unwrap_or("Please provide the information."),
            suffix
        ),
    }
}
