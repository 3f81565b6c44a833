//! Placeholder registry
//!
//! Ordered, read-only view of a document's fields plus the name-matching
//! policy used for edit targeting. Matching is exact on the normalized
//! name first; failing that, substring containment in either direction
//! collects candidates and the best Jaro-Winkler score wins.

use std::collections::HashSet;

use uuid::Uuid;

use crate::model::Field;

/// Lower-case, underscores to spaces, collapsed whitespace.
fn normalize_name(raw: &str) -> String {
    raw.to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The document's fields in fill order
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    pub fn new(mut fields: Vec<Field>) -> Self {
        fields.sort_by_key(|f| f.order_index);
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Lowest-order field without an accepted answer
    pub fn first_unanswered(&self, answered: &HashSet<Uuid>) -> Option<&Field> {
        self.fields.iter().find(|f| !answered.contains(&f.id))
    }

    /// Lowest-order unanswered field other than `current`
    pub fn next_unanswered(&self, current: Uuid, answered: &HashSet<Uuid>) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.id != current && !answered.contains(&f.id))
    }

    /// Count of fields whose id is in `answered`
    pub fn answered_count(&self, answered: &HashSet<Uuid>) -> usize {
        self.fields
            .iter()
            .filter(|f| answered.contains(&f.id))
            .count()
    }

    /// True when every required field has an accepted answer
    pub fn all_required_answered(&self, answered: &HashSet<Uuid>) -> bool {
        self.fields
            .iter()
            .filter(|f| f.required)
            .all(|f| answered.contains(&f.id))
    }

    /// Resolve a target name to a field.
    pub fn match_name(&self, target: &str) -> Option<&Field> {
        let target_norm = normalize_name(target);
        if target_norm.is_empty() {
            return None;
        }

        if let Some(exact) = self
            .fields
            .iter()
            .find(|f| normalize_name(&f.name) == target_norm)
        {
            return Some(exact);
        }

        let mut best: Option<(&Field, f64)> = None;
        for field in &self.fields {
            let name_norm = normalize_name(&field.name);
            if name_norm.contains(&target_norm) || target_norm.contains(&name_norm) {
                let score = strsim::jaro_winkler(&name_norm, &target_norm);
                if best.map(|(_, s)| score > s).unwrap_or(true) {
                    best = Some((field, score));
                }
            }
        }
        best.map(|(f, _)| f)
    }

    /// Find a field whose name appears verbatim in `message`.
    ///
    /// Variants longer than `min_len` characters are considered (short
    /// names cause false matches). With several mentions, the longest
    /// matched variant wins; ties keep document order. `restrict` narrows
    /// the search to a subset of fields.
    pub fn find_mentioned(
        &self,
        message: &str,
        min_len: usize,
        restrict: Option<&HashSet<Uuid>>,
    ) -> Option<&Field> {
        let message_lower = message.to_lowercase();
        let mut best: Option<(&Field, usize)> = None;

        for field in &self.fields {
            if let Some(allowed) = restrict {
                if !allowed.contains(&field.id) {
                    continue;
                }
            }
            let variants = [
                field.name.to_lowercase(),
                field.name.to_lowercase().replace('_', " "),
            ];
            for variant in variants {
                if variant.len() > min_len && message_lower.contains(&variant) {
                    let longer = best.map(|(_, len)| variant.len() > len).unwrap_or(true);
                    if longer {
                        best = Some((field, variant.len()));
                    }
                }
            }
        }
        best.map(|(f, _)| f)
    }
}
