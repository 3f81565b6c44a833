//! Example values offered when prompting for a field.

use crate::model::FieldKind;

const COMPANY_EXAMPLES: &[&str] = &["Innovation Labs LLC", "Global Systems Corp"];

fn kind_examples(kind: FieldKind) -> &'static [&'static str] {
    match kind {
        FieldKind::PartyName => &["TechStart Inc.", "Jane Doe, Esq."],
        FieldKind::Date => &["January 15, 2024", "12/31/2024"],
        FieldKind::Money => &["$50,000.00", "100000"],
        FieldKind::Number => &["25", "1,500"],
        FieldKind::Address => &[
            "123 Main Street, New York, NY 10001",
            "456 Business Park, Suite 200, San Francisco, CA 94105",
        ],
        FieldKind::Boolean => &["Yes", "No"],
        FieldKind::EnumChoice => &["Option A", "Option B"],
        FieldKind::Text => &["Acme Corporation", "John Smith"],
    }
}

/// Picks example values for a field, letting hints in the field name
/// override the declared kind.
pub fn examples_for(kind: FieldKind, name: &str) -> String {
    let name_lower = name.to_lowercase();
    let list: &[&str] = if name_lower.contains("company") || name_lower.contains("corporation") {
        COMPANY_EXAMPLES
    } else if name_lower.contains("date") {
        kind_examples(FieldKind::Date)
    } else if name_lower.contains("amount")
        || name_lower.contains("money")
        || name_lower.contains("price")
    {
        kind_examples(FieldKind::Money)
    } else if name_lower.contains("address") {
        kind_examples(FieldKind::Address)
    } else {
        kind_examples(kind)
    };
    list.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
}
