//! Chooses which field a turn is about before any oracle call.

use std::collections::HashSet;

use uuid::Uuid;

use crate::model::Field;
use crate::registry::FieldRegistry;
use crate::resolver::lexicon::Lexicon;

/// Outcome of field selection for one incoming message.
#[derive(Debug)]
pub enum FieldSelection<'a> {
    /// Ask for or accept a value for this field
    Fill(&'a Field),
    /// The message targets an already answered field for editing
    Edit(&'a Field),
    /// Every field is answered and nothing was targeted
    Completed,
    /// The document has no fields at all
    NoFields,
}

/// Resolves the active field for a message.
///
/// An edit cue plus a mention of an answered field wins over the fill
/// order. Otherwise the first unanswered field is active. Once all
/// fields are answered, a mention of any field reopens it for editing
/// and anything else reports completion.
pub fn select_field<'a>(
    registry: &'a FieldRegistry,
    lexicon: &Lexicon,
    message: &str,
    answered: &HashSet<Uuid>,
) -> FieldSelection<'a> {
    if registry.is_empty() {
        return FieldSelection::NoFields;
    }

    let message_lower = message.to_lowercase();
    if lexicon.has_edit_cue(&message_lower) && !answered.is_empty() {
        if let Some(target) =
            registry.find_mentioned(message, lexicon.min_mention_len, Some(answered))
        {
            return FieldSelection::Edit(target);
        }
    }

    if let Some(field) = registry.first_unanswered(answered) {
        return FieldSelection::Fill(field);
    }

    match registry.find_mentioned(message, lexicon.min_mention_len, None) {
        Some(field) => FieldSelection::Edit(field),
        None => FieldSelection::Completed,
    }
}
