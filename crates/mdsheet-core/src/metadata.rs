//! Metadata comment wire format
//!
//! Metadata travels through Markdown as a single-line HTML comment:
//!
//! ```text
//! <!-- md-spreadsheet-table-metadata: {"column_widths": {"0": 100}} -->
//! ```
//!
//! Plain Markdown viewers hide it. This is the only place metadata is ever
//! text; everywhere else it is a [`Metadata`] map.

use crate::error::{Error, Result};
use crate::table::Metadata;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<!--\s*md-spreadsheet-(table|sheet|workbook)-metadata:\s*(.*?)\s*-->$")
        .expect("valid metadata comment pattern")
});

/// Which element a metadata comment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Table,
    Sheet,
    Workbook,
}

impl MetadataKind {
    /// Reserved marker text inside the comment
    pub fn marker(self) -> &'static str {
        match self {
            MetadataKind::Table => "md-spreadsheet-table-metadata",
            MetadataKind::Sheet => "md-spreadsheet-sheet-metadata",
            MetadataKind::Workbook => "md-spreadsheet-workbook-metadata",
        }
    }
}

/// Recognise a metadata comment line and return its kind and raw JSON payload
pub fn match_comment(line: &str) -> Option<(MetadataKind, &str)> {
    let caps = COMMENT.captures(line.trim())?;
    let kind = match caps.get(1)?.as_str() {
        "table" => MetadataKind::Table,
        "sheet" => MetadataKind::Sheet,
        _ => MetadataKind::Workbook,
    };
    Some((kind, caps.get(2)?.as_str()))
}

/// True when the line is a metadata comment of any kind
pub fn is_comment(line: &str) -> bool {
    match_comment(line).is_some()
}

/// Decode a JSON payload; `line` is the 1-based line number used in the error
pub fn decode_payload(payload: &str, line: usize) -> Result<Metadata> {
    serde_json::from_str(payload).map_err(|source| Error::MetadataDecode { line, source })
}

/// Read metadata of the given kind from one line.
///
/// Returns `None` when the line is not such a comment, or when its JSON is
/// malformed; the latter is logged and the line stays ordinary text.
pub fn read_comment(line: &str, kind: MetadataKind, line_no: usize) -> Option<Metadata> {
    let (found, payload) = match_comment(line)?;
    if found != kind {
        return None;
    }

    match decode_payload(payload, line_no) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            tracing::warn!("ignoring {} comment: {}", kind.marker(), e);
            None
        }
    }
}

/// Render metadata as a comment line (no trailing newline)
pub fn encode_comment(kind: MetadataKind, metadata: &Metadata) -> String {
    let json = Value::Object(metadata.clone()).to_string();
    format!("<!-- {}: {} -->", kind.marker(), json)
}
