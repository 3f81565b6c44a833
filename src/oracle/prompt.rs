//! Prompt assembly
//!
//! Templates live beside the source as markdown and are filled by plain
//! substitution. The turn prompt carries the current field, prior
//! answers, a bounded history window and the raw utterance.

use crate::model::{ChatMessage, ChatRole, Field};

const TURN_ANALYSIS_TEMPLATE: &str = include_str!("../prompts/turn_analysis.md");
const FIELD_DETECTION_TEMPLATE: &str = include_str!("../prompts/field_detection.md");

/// Everything the turn-analysis prompt needs
pub struct TurnPromptInput<'a> {
    pub field: &'a Field,
    pub next_field: Option<&'a Field>,
    /// (field name, value) for already-answered fields, in fill order
    pub previous_answers: &'a [(String, String)],
    /// Already windowed to the configured recent-message count
    pub history: &'a [ChatMessage],
    /// Existing answer for the current field, when re-visiting it
    pub existing_answer: Option<&'a str>,
    pub field_examples: &'a str,
    pub utterance: &'a str,
}

fn role_label(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "User",
        ChatRole::Assistant => "Assistant",
    }
}

fn describe(field: &Field) -> String {
    field
        .description
        .clone()
        .unwrap_or_else(|| format!("A {} field", field.kind.label()))
}

/// Build the turn-analysis prompt for one utterance.
pub fn build_turn_prompt(input: &TurnPromptInput<'_>) -> String {
    let previous_answers = if input.previous_answers.is_empty() {
        "No fields have been filled yet.".to_string()
    } else {
        input
            .previous_answers
            .iter()
            .map(|(name, value)| format!("- {}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut history = if input.history.is_empty() {
        "This is the start of the conversation.".to_string()
    } else {
        input
            .history
            .iter()
            .map(|m| format!("{}: {}", role_label(m.role), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    };
    if let Some(existing) = input.existing_answer {
        history.push_str(&format!(
            "\n\nNote: There was a previous answer for this field: '{}'",
            existing
        ));
    }

    let next_field_info = match input.next_field {
        None => "No next field - this is the last one.".to_string(),
        Some(next) => format!(
            "- Name: {}\n- Description: {}\n- Type: {}",
            next.display_name(),
            describe(next),
            next.kind.label()
        ),
    };

    TURN_ANALYSIS_TEMPLATE
        .replace("{placeholder_name}", &input.field.display_name())
        .replace("{placeholder_description}", &describe(input.field))
        .replace("{placeholder_type}", input.field.kind.label())
        .replace(
            "{source_excerpt}",
            input.field.source_excerpt.as_deref().unwrap_or("[field]"),
        )
        .replace("{field_examples}", input.field_examples)
        .replace("{next_field_info}", &next_field_info)
        .replace("{previous_answers}", &previous_answers)
        .replace("{conversation_history}", &history)
        .replace("{user_message}", input.utterance)
}

/// Build the field-detection prompt over (already truncated) document text.
pub fn build_detection_prompt(document_text: &str) -> String {
    FIELD_DETECTION_TEMPLATE.replace("{document_text}", document_text)
}
