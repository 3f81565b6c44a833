//! Turn-resolution lexicon
//!
//! The keyword lists that steer deterministic turn handling: edit cues,
//! explicit-edit phrases, keep confirmations and greetings. They are one
//! configurable value rather than literals scattered through the
//! resolver.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Words that mark a possible edit of an earlier answer
    pub edit_cues: Vec<String>,
    /// Stronger phrases that bypass the keep-or-change disambiguation
    pub explicit_edit_phrases: Vec<String>,
    /// Confirmations that an existing value should be kept
    pub keep_confirmations: Vec<String>,
    /// Opening pleasantries that get the guided first question
    pub greetings: Vec<String>,
    /// Field-name variants at or below this length are ignored when
    /// scanning messages for mentions
    pub min_mention_len: usize,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            edit_cues: to_strings(&["change", "edit", "update", "fix", "modify", "correct"]),
            explicit_edit_phrases: to_strings(&[
                "change",
                "edit",
                "update",
                "fix",
                "modify",
                "different",
                "new value",
                "instead",
            ]),
            keep_confirmations: to_strings(&[
                "yes",
                "keep",
                "ok",
                "okay",
                "sure",
                "correct",
                "that's fine",
                "that's good",
                "that works",
            ]),
            greetings: to_strings(&["hello", "hi", "hey", "start", "begin"]),
            min_mention_len: 3,
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Lexicon {
    pub fn has_edit_cue(&self, message_lower: &str) -> bool {
        self.edit_cues.iter().any(|cue| message_lower.contains(cue))
    }

    pub fn has_explicit_edit(&self, message_lower: &str) -> bool {
        self.explicit_edit_phrases
            .iter()
            .any(|phrase| message_lower.contains(phrase))
    }

    pub fn wants_to_keep(&self, message_lower: &str) -> bool {
        self.keep_confirmations
            .iter()
            .any(|confirm| message_lower.contains(confirm))
    }

    pub fn is_greeting(&self, message_lower: &str) -> bool {
        self.greetings.iter().any(|g| message_lower.trim() == g)
    }

    /// True for cue words and connectors that lead an edit utterance,
    /// used when salvaging a value without the oracle.
    pub fn is_edit_filler(&self, token: &str) -> bool {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric());
        token.is_empty()
            || self.edit_cues.iter().any(|c| c == token)
            || matches!(token, "to" | "is" | "the" | "it" | "please")
    }
}
