//! Echo guard
//!
//! Users (and sometimes the oracle) echo the question back instead of
//! answering it: "the company name" for a field called `company_name`.
//! Committing such a value would write the field's own label into the
//! document. The guard rejects candidates that are lexically the field's
//! name or description, and can salvage a real value from an utterance
//! that embeds the label ("the company name is Acme Corp").

use crate::model::Field;

/// Lower-case, strip a leading "the ", collapse underscores to spaces.
fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase().replace('_', " ");
    lowered
        .strip_prefix("the ")
        .map(|rest| rest.to_string())
        .unwrap_or(lowered)
        .trim()
        .to_string()
}

/// True when `value` is just the field's own name or description echoed back.
pub fn is_field_echo(value: &str, field: &Field) -> bool {
    let value_norm = normalize(value);
    if value_norm.is_empty() {
        return true;
    }

    let name_norm = normalize(&field.name);
    if value_norm == name_norm {
        return true;
    }

    if let Some(desc) = field.description.as_deref() {
        if !desc.trim().is_empty() && value_norm == normalize(desc) {
            return true;
        }
    }

    // "the company name ..." that still contains the field name is an echo
    let value_lower = value.trim().to_lowercase();
    value_lower.starts_with("the ") && value_lower.contains(&name_norm)
}

/// Case-insensitive substring search safe to slice with: bytes that match
/// a valid UTF-8 needle always start and end on char boundaries.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

fn strip_pattern(text: &str, pattern: &str) -> Option<String> {
    let idx = find_ci(text, pattern)?;
    let mut stripped = String::with_capacity(text.len() - pattern.len());
    stripped.push_str(&text[..idx]);
    stripped.push_str(&text[idx + pattern.len()..]);
    Some(stripped.trim().to_string())
}

/// Strip the field's name/description phrasing from a raw utterance and
/// return the residual as a candidate value. `None` when nothing usable
/// remains.
pub fn residual_value(utterance: &str, field: &Field) -> Option<String> {
    let name_phrase = field.name.to_lowercase().replace('_', " ");
    let mut residual = utterance.trim().to_string();

    for pattern in [
        format!("the {} is", name_phrase),
        format!("{} is", name_phrase),
        format!("the {}", name_phrase),
        name_phrase.clone(),
    ] {
        if let Some(stripped) = strip_pattern(&residual, &pattern) {
            residual = stripped;
        }
    }

    if let Some(desc) = field.description.as_deref() {
        if !desc.trim().is_empty() {
            if let Some(stripped) = strip_pattern(&residual, desc.trim()) {
                residual = stripped;
            }
        }
    }

    let residual = residual
        .trim_matches(|c: char| c == ':' || c == '=' || c == ',' || c.is_whitespace())
        .trim()
        .to_string();

    if residual.is_empty() || residual.len() < 2 || residual.eq_ignore_ascii_case("is") {
        return None;
    }
    if is_field_echo(&residual, field) {
        return None;
    }
    Some(residual)
}
