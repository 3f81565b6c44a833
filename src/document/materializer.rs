//! Document materializer
//!
//! Applies a set of accepted values back onto the document text. `fill`
//! produces the filled plain-text document; `render_preview` produces an
//! HTML page with each substituted value wrapped in a highlight span.
//! Both walk paragraphs and table cells, locate each field's span with the
//! shared locator, and replace at most once per field per paragraph or
//! cell. Fields whose span cannot be found are skipped without error.

use std::collections::HashMap;

use uuid::Uuid;

use crate::document::locator::locate;
use crate::document::text::DocumentText;
use crate::guard::is_field_echo;
use crate::model::Field;

/// Options for preview rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewOptions {
    /// Render as a work-in-progress view rather than the final artifact
    pub partial: bool,
}

// Private-use sentinels keep highlight markers apart from document text
// while the whole paragraph is HTML-escaped.
const MARK_OPEN: char = '\u{E000}';
const MARK_CLOSE: char = '\u{E001}';

const HIGHLIGHT_OPEN: &str = "<span class=\"filled-value\">";
const HIGHLIGHT_CLOSE: &str = "</span>";

/// Drop empty values and values that merely echo the field's own label.
fn sanitized_values(fields: &[Field], values: &HashMap<Uuid, String>) -> HashMap<Uuid, String> {
    let mut out = HashMap::new();
    for field in fields {
        if let Some(value) = values.get(&field.id) {
            let cleaned = value.trim();
            if cleaned.is_empty() || is_field_echo(cleaned, field) {
                continue;
            }
            out.insert(field.id, cleaned.to_string());
        }
    }
    out
}

fn replace_in_line(line: &mut String, fields: &[Field], values: &HashMap<Uuid, String>, wrap: bool) {
    for field in fields {
        let Some(value) = values.get(&field.id) else {
            continue;
        };
        if let Some(span) = locate(line, field) {
            let replacement = if wrap {
                format!("{}{}{}", MARK_OPEN, value, MARK_CLOSE)
            } else {
                value.clone()
            };
            line.replace_range(span.start..span.end, &replacement);
        }
    }
}

/// Substitute accepted values into the document text.
pub fn fill(text: &DocumentText, fields: &[Field], values: &HashMap<Uuid, String>) -> DocumentText {
    let values = sanitized_values(fields, values);
    let mut out = text.clone();

    for paragraph in &mut out.paragraphs {
        replace_in_line(paragraph, fields, &values, false);
    }
    for table in &mut out.tables {
        for row in &mut table.rows {
            for cell in row {
                replace_in_line(cell, fields, &values, false);
            }
        }
    }
    out
}

/// HTML-escape in the manner of Python's `html.escape`.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape a processed line, then swap the sentinels for highlight markup so
/// only the marker tags survive escaping.
fn escape_with_highlights(line: &str) -> String {
    escape_html(line)
        .replace(MARK_OPEN, HIGHLIGHT_OPEN)
        .replace(MARK_CLOSE, HIGHLIGHT_CLOSE)
}

const PREVIEW_STYLE: &str = r#"        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            font-family: 'Georgia', 'Times New Roman', serif;
            max-width: 900px;
            margin: 0 auto;
            padding: 40px 20px;
            line-height: 1.8;
            color: #333;
            background-color: #fafafa;
        }
        .document-container {
            background-color: white;
            padding: 60px 80px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
            min-height: 800px;
        }
        h1 {
            color: #1a1a1a;
            margin-bottom: 30px;
            font-size: 24px;
            text-align: center;
            font-weight: bold;
        }
        p {
            margin-bottom: 12px;
            text-align: justify;
        }
        table {
            border-collapse: collapse;
            margin-bottom: 12px;
            width: 100%;
        }
        td {
            border: 1px solid #ddd;
            padding: 6px 10px;
        }
        .filled-value {
            background-color: #e3f2fd;
            padding: 2px 6px;
            border-radius: 3px;
            font-weight: 500;
            color: #1565c0;
            border-bottom: 2px solid #64b5f6;
        }
        .header-info {
            background-color: #f5f5f5;
            padding: 20px;
            margin-bottom: 30px;
            border-radius: 8px;
            border-left: 4px solid #2196f3;
        }
        .header-info p {
            margin: 5px 0;
            text-align: left;
        }
        .header-info strong {
            color: #424242;
        }
        @media print {
            body {
                background: white;
                padding: 0;
            }
            .document-container {
                box-shadow: none;
                padding: 40px;
            }
        }"#;

/// Render an HTML preview with substituted values highlighted.
pub fn render_preview(
    filename: &str,
    text: &DocumentText,
    fields: &[Field],
    values: &HashMap<Uuid, String>,
    options: PreviewOptions,
) -> String {
    let values = sanitized_values(fields, values);

    let mut body = String::new();
    for paragraph in &text.paragraphs {
        let mut line = paragraph.clone();
        replace_in_line(&mut line, fields, &values, true);
        if line.trim().is_empty() {
            continue;
        }
        body.push_str("        <p>");
        body.push_str(&escape_with_highlights(&line));
        body.push_str("</p>\n");
    }
    for table in &text.tables {
        if table.rows.is_empty() {
            continue;
        }
        body.push_str("        <table>\n");
        for row in &table.rows {
            body.push_str("            <tr>");
            for cell in row {
                let mut line = cell.clone();
                replace_in_line(&mut line, fields, &values, true);
                body.push_str("<td>");
                body.push_str(&escape_with_highlights(&line));
                body.push_str("</td>");
            }
            body.push_str("</tr>\n");
        }
        body.push_str("        </table>\n");
    }

    let status_line = if options.partial {
        format!(
            "<p><strong>Progress:</strong> {} of {} placeholder(s) filled</p>",
            values.len(),
            fields.len()
        )
    } else {
        format!(
            "<p><strong>Status:</strong> Filled with {} placeholder(s)</p>",
            values.len()
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Preview</title>
    <style>
{style}
    </style>
</head>
<body>
    <div class="header-info">
        <p><strong>Document:</strong> {title}</p>
        {status}
    </div>
    <div class="document-container">
{body}    </div>
</body>
</html>
"#,
        title = escape_html(filename),
        style = PREVIEW_STYLE,
        status = status_line,
        body = body,
    )
}
