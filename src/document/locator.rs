//! Text span locator
//!
//! Finds where a field's value belongs inside one paragraph or table cell.
//! Three strategies are tried in fixed priority order and the first match
//! wins:
//!
//! 1. exact substring match of the recorded source excerpt
//! 2. bracket pattern `[FIELD_NAME]` with the name upper-cased
//! 3. a run of three or more underscores
//!
//! Returns `None` when nothing matches; callers skip the field silently.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Field;

static UNDERSCORE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_{3,}").expect("invalid underscore-run regex"));

/// Byte range of a located blank within a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Locate the span a field's value should replace in `paragraph`.
pub fn locate(paragraph: &str, field: &Field) -> Option<Span> {
    if let Some(excerpt) = field.source_excerpt.as_deref() {
        if !excerpt.trim().is_empty() {
            if let Some(start) = paragraph.find(excerpt) {
                return Some(Span {
                    start,
                    end: start + excerpt.len(),
                });
            }
        }
    }

    let bracket = format!("[{}]", field.name.to_uppercase());
    if let Some(start) = paragraph.find(&bracket) {
        return Some(Span {
            start,
            end: start + bracket.len(),
        });
    }

    UNDERSCORE_RUN.find(paragraph).map(|m| Span {
        start: m.start(),
        end: m.end(),
    })
}
