//! Plain-text document model
//!
//! The engine treats a template as ordered paragraphs plus tables of cells.
//! Binary container parsing happens upstream; registration accepts either
//! raw text or this structure directly.

use serde::{Deserialize, Serialize};

/// One table, row-major plain text cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableText {
    pub rows: Vec<Vec<String>>,
}

/// A template document as the engine sees it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentText {
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub tables: Vec<TableText>,
}

impl DocumentText {
    /// Build from raw text, one paragraph per line
    pub fn from_plain_text(raw: &str) -> Self {
        Self {
            paragraphs: raw.lines().map(|l| l.to_string()).collect(),
            tables: Vec::new(),
        }
    }

    /// Text handed to field detection: non-empty paragraphs, then table
    /// cells row by row
    pub fn analysis_text(&self) -> String {
        let mut parts: Vec<&str> = self
            .paragraphs
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| p.as_str())
            .collect();
        for table in &self.tables {
            for row in &table.rows {
                for cell in row {
                    if !cell.trim().is_empty() {
                        parts.push(cell.as_str());
                    }
                }
            }
        }
        parts.join("\n")
    }

    /// Serialize the (possibly filled) document back to plain text.
    /// Table rows render with tab-separated cells after the paragraphs.
    pub fn to_plain_text(&self) -> String {
        let mut out = self.paragraphs.join("\n");
        for table in &self.tables {
            for row in &table.rows {
                out.push('\n');
                out.push_str(&row.join("\t"));
            }
        }
        out
    }
}
