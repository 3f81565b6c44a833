//! Placeholder analysis
//!
//! Finds the blanks in a registered document by asking the oracle for a
//! JSON array of field descriptors, then validating each entry and
//! backfilling text positions from the source excerpt. Output the oracle
//! produced but that cannot be read as a field array yields an empty
//! set; only transport failures surface as errors.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::document::DocumentText;
use crate::error::OracleResult;
use crate::model::{Field, FieldKind};
use crate::oracle::{build_detection_prompt, extract_json_array, OracleClient};

pub struct FieldAnalyzer {
    oracle: Arc<dyn OracleClient>,
    /// Maximum number of characters of document text sent for analysis
    truncation: usize,
}

impl FieldAnalyzer {
    pub fn new(oracle: Arc<dyn OracleClient>, truncation: usize) -> Self {
        Self { oracle, truncation }
    }

    /// Detect the fields of one document.
    pub async fn detect_fields(
        &self,
        document_id: Uuid,
        text: &DocumentText,
    ) -> OracleResult<Vec<Field>> {
        let analysis = text.analysis_text();
        let truncated = truncate_chars(&analysis, self.truncation);
        if truncated.len() < analysis.len() {
            warn!(
                "analysis text truncated from {} to {} bytes",
                analysis.len(),
                truncated.len()
            );
        }

        let raw = self.oracle.generate(&build_detection_prompt(truncated)).await?;
        let fields = parse_detected_fields(&raw, document_id, text);
        info!(
            "detected {} fields for document {}",
            fields.len(),
            document_id
        );
        Ok(fields)
    }
}

/// Cut after `limit` characters without splitting a code point.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Read the oracle's detection output into validated fields. Entries
/// without a name are skipped; everything else is normalized with
/// lenient defaults. Detection order becomes the fill order.
fn parse_detected_fields(raw: &str, document_id: Uuid, text: &DocumentText) -> Vec<Field> {
    let Some(block) = extract_json_array(raw) else {
        warn!("field detection output had no JSON array");
        return Vec::new();
    };
    let value: serde_json::Value = match serde_json::from_str(block) {
        Ok(value) => value,
        Err(err) => {
            warn!("field detection output was not valid JSON: {}", err);
            return Vec::new();
        }
    };
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for item in items {
        let Some(object) = item.as_object() else {
            warn!("skipping non-object field entry");
            continue;
        };
        let Some(name) = object
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|n| !n.is_empty())
        else {
            warn!("skipping field entry without a name");
            continue;
        };

        let mut field = Field {
            id: Uuid::new_v4(),
            document_id,
            name: name.to_string(),
            description: object
                .get("description")
                .and_then(|v| v.as_str())
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            kind: object
                .get("type")
                .and_then(|v| v.as_str())
                .map(FieldKind::parse_loose)
                .unwrap_or_default(),
            required: object.get("required").and_then(|v| v.as_bool()).unwrap_or(true),
            order_index: fields.len(),
            source_excerpt: object
                .get("source_excerpt")
                .and_then(|v| v.as_str())
                .map(|e| e.to_string())
                .filter(|e| !e.trim().is_empty()),
            paragraph_index: object
                .get("paragraph_index")
                .and_then(|v| v.as_u64())
                .map(|v| v as usize),
            char_start: object
                .get("char_start")
                .and_then(|v| v.as_u64())
                .map(|v| v as usize),
            char_end: object.get("char_end").and_then(|v| v.as_u64()).map(|v| v as usize),
        };
        if field.paragraph_index.is_none() {
            backfill_position(&mut field, text);
        }
        fields.push(field);
    }
    fields
}

/// Locate a field's excerpt in the document when the oracle gave no
/// position. Left unset when the excerpt is absent or not found.
fn backfill_position(field: &mut Field, text: &DocumentText) {
    let Some(excerpt) = field.source_excerpt.as_deref() else {
        return;
    };
    for (idx, paragraph) in text.paragraphs.iter().enumerate() {
        if let Some(start) = paragraph.find(excerpt) {
            field.paragraph_index = Some(idx);
            field.char_start = Some(start);
            field.char_end = Some(start + excerpt.len());
            return;
        }
    }
}
