//! Turn judgment parsing
//!
//! The oracle is asked for a strict JSON object but real model output
//! arrives wrapped in code fences, prose, or with fields of the wrong
//! JSON type. Parsing is defensive: strip fences, take the first balanced
//! JSON object, coerce field types, and fold anything unusable into a
//! `Malformed` verdict instead of an error.

use serde::{Deserialize, Serialize};

/// What the user is doing this turn, as judged by the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnIntent {
    Answer,
    Question,
    Correction,
    EditField,
    Unclear,
    Irrelevant,
}

impl TurnIntent {
    /// Lenient parse; unknown labels read as `Unclear`.
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "ANSWER" => TurnIntent::Answer,
            "QUESTION" => TurnIntent::Question,
            "CORRECTION" => TurnIntent::Correction,
            "EDIT_FIELD" => TurnIntent::EditField,
            "IRRELEVANT" => TurnIntent::Irrelevant,
            _ => TurnIntent::Unclear,
        }
    }
}

/// The oracle's judgment of one turn, after type coercion
#[derive(Debug, Clone)]
pub struct TurnJudgment {
    pub intent: TurnIntent,
    pub target_field: Option<String>,
    pub extracted_value: Option<String>,
    pub is_valid: bool,
    pub should_accept: bool,
    pub reasoning: Option<String>,
    pub assistant_message: Option<String>,
}

impl TurnJudgment {
    /// The acceptance precondition: an answering intent the oracle both
    /// validated and recommended.
    pub fn wants_accept(&self) -> bool {
        matches!(
            self.intent,
            TurnIntent::Answer | TurnIntent::Correction | TurnIntent::EditField
        ) && self.should_accept
            && self.is_valid
    }

    /// The value to commit: the oracle's extraction when usable, else the
    /// raw utterance.
    pub fn candidate_value(&self, utterance: &str) -> Option<String> {
        let extracted = self
            .extracted_value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .filter(|v| {
                let lower = v.to_lowercase();
                lower != "null" && lower != "none"
            });
        match extracted {
            Some(v) => Some(v.to_string()),
            None => {
                let raw = utterance.trim();
                if raw.is_empty() {
                    None
                } else {
                    Some(raw.to_string())
                }
            }
        }
    }
}

/// The resolver-facing shape of one oracle round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A value to commit, possibly into a named field other than the
    /// current one
    Accepted {
        value: String,
        target_field: Option<String>,
        message: String,
    },
    /// The user wants to switch to another field but gave no value yet
    EditRequest { field: String, message: String },
    /// Nothing to commit; reply and wait
    NeedsClarification { intent: TurnIntent, message: String },
    /// Output could not be parsed at all
    Malformed,
}

/// Strip a leading markdown code fence, if any.
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        rest.rsplit_once("```").map(|(body, _)| body).unwrap_or(rest)
    } else if let Some(rest) = text.strip_prefix("```") {
        rest.rsplit_once("```").map(|(body, _)| body).unwrap_or(rest)
    } else {
        text
    }
}

fn first_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First balanced JSON object in possibly fenced, possibly prose-wrapped
/// model output.
pub fn extract_json_object(text: &str) -> Option<&str> {
    first_balanced(strip_fences(text), '{', '}')
}

/// First balanced JSON array, used by field detection.
pub fn extract_json_array(text: &str) -> Option<&str> {
    first_balanced(strip_fences(text), '[', ']')
}

fn coerce_string(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_bool(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Parse raw oracle output into a judgment. `None` means nothing in the
/// output could be read as the expected object.
pub fn parse_judgment(raw_output: &str) -> Option<TurnJudgment> {
    let block = extract_json_object(raw_output)?;
    let value: serde_json::Value = serde_json::from_str(block).ok()?;
    let object = value.as_object()?;

    let non_empty = |s: String| {
        let trimmed = s.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    };

    Some(TurnJudgment {
        intent: coerce_string(object.get("intent"))
            .map(|s| TurnIntent::parse_loose(&s))
            .unwrap_or(TurnIntent::Unclear),
        target_field: coerce_string(object.get("target_field"))
            .and_then(non_empty)
            .filter(|s| {
                let lower = s.to_lowercase();
                lower != "null" && lower != "none"
            }),
        extracted_value: coerce_string(object.get("extracted_value")).and_then(non_empty),
        is_valid: coerce_bool(object.get("is_valid")),
        should_accept: coerce_bool(object.get("should_accept")),
        reasoning: coerce_string(object.get("reasoning")).and_then(non_empty),
        assistant_message: coerce_string(object.get("assistant_message")).and_then(non_empty),
    })
}

/// Parse raw oracle output straight to the verdict the resolver consumes.
pub fn parse_verdict(raw_output: &str, utterance: &str) -> Verdict {
    let Some(judgment) = parse_judgment(raw_output) else {
        return Verdict::Malformed;
    };

    let message = judgment.assistant_message.clone().unwrap_or_default();

    if judgment.wants_accept() {
        if let Some(value) = judgment.candidate_value(utterance) {
            return Verdict::Accepted {
                value,
                target_field: judgment.target_field,
                message,
            };
        }
    }

    if judgment.intent == TurnIntent::EditField {
        if let Some(field) = judgment.target_field {
            return Verdict::EditRequest { field, message };
        }
    }

    Verdict::NeedsClarification {
        intent: judgment.intent,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parse_loose() {
        assert_eq!(TurnIntent::parse_loose("answer"), TurnIntent::Answer);
        assert_eq!(TurnIntent::parse_loose("EDIT_FIELD"), TurnIntent::EditField);
        assert_eq!(TurnIntent::parse_loose("whatever"), TurnIntent::Unclear);
    }

    #[test]
    fn test_extract_from_fenced_output() {
        let raw = "```json\n{\"intent\": \"ANSWER\"}\n```";
        assert_eq!(extract_json_object(raw), Some("{\"intent\": \"ANSWER\"}"));
    }

    #[test]
    fn test_extract_from_prose_wrapped_output() {
        let raw = "Here is my analysis: {\"intent\": \"ANSWER\"} hope that helps";
        assert_eq!(extract_json_object(raw), Some("{\"intent\": \"ANSWER\"}"));
    }

    #[test]
    fn test_extract_first_object_not_greedy() {
        let raw = "{\"a\": 1} and later {\"b\": 2}";
        assert_eq!(extract_json_object(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_handles_braces_inside_strings() {
        let raw = "{\"message\": \"use {curly} braces\"}";
        assert_eq!(extract_json_object(raw), Some(raw));
    }

    #[test]
    fn test_extract_array() {
        let raw = "```json\n[{\"name\": \"a\"}]\n```";
        assert_eq!(extract_json_array(raw), Some("[{\"name\": \"a\"}]"));
    }

    #[test]
    fn test_parse_judgment_coerces_number_value() {
        let raw = r#"{"intent": "ANSWER", "extracted_value": 25, "is_valid": true, "should_accept": true}"#;
        let judgment = parse_judgment(raw).unwrap();
        assert_eq!(judgment.extracted_value.as_deref(), Some("25"));
        assert!(judgment.wants_accept());
    }

    #[test]
    fn test_parse_judgment_missing_flags_default_false() {
        let raw = r#"{"intent": "ANSWER", "extracted_value": "Acme"}"#;
        let judgment = parse_judgment(raw).unwrap();
        assert!(!judgment.wants_accept());
    }

    #[test]
    fn test_candidate_value_filters_null_literals() {
        let judgment = parse_judgment(
            r#"{"intent": "ANSWER", "extracted_value": "null", "is_valid": true, "should_accept": true}"#,
        )
        .unwrap();
        assert_eq!(
            judgment.candidate_value("my answer").as_deref(),
            Some("my answer")
        );
    }

    #[test]
    fn test_verdict_accepted() {
        let raw = r#"{"intent": "ANSWER", "extracted_value": "Acme Corp", "is_valid": true, "should_accept": true, "assistant_message": "Saved."}"#;
        let verdict = parse_verdict(raw, "it's Acme Corp");
        assert_eq!(
            verdict,
            Verdict::Accepted {
                value: "Acme Corp".to_string(),
                target_field: None,
                message: "Saved.".to_string(),
            }
        );
    }

    #[test]
    fn test_verdict_edit_request_without_value() {
        let raw = r#"{"intent": "EDIT_FIELD", "target_field": "company_name", "assistant_message": "Sure, what should it be?"}"#;
        let verdict = parse_verdict(raw, "change the company name");
        assert_eq!(
            verdict,
            Verdict::EditRequest {
                field: "company_name".to_string(),
                message: "Sure, what should it be?".to_string(),
            }
        );
    }

    #[test]
    fn test_verdict_clarification_when_not_accepted() {
        let raw = r#"{"intent": "QUESTION", "assistant_message": "This field is the buyer."}"#;
        let verdict = parse_verdict(raw, "what does this mean?");
        match verdict {
            Verdict::NeedsClarification { intent, message } => {
                assert_eq!(intent, TurnIntent::Question);
                assert_eq!(message, "This field is the buyer.");
            }
            other => panic!("expected NeedsClarification, got {:?}", other),
        }
    }

    #[test]
    fn test_verdict_malformed_on_garbage() {
        assert_eq!(parse_verdict("no json here at all", "hello"), Verdict::Malformed);
        assert_eq!(parse_verdict("{broken json", "hello"), Verdict::Malformed);
    }
}
