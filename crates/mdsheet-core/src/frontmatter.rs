//! YAML frontmatter at the top of a workbook document
//!
//! ```markdown
//! ---
//! title: Budget 2026
//! owner: finance
//! ---
//! ## Sheet 1
//! ```
//!
//! A frontmatter block with a `title` stands in for the workbook root
//! heading. Its fields are kept in the workbook metadata under
//! [`FRONTMATTER_KEY`], tagged by [`HEADER_TYPE_KEY`], so generation can
//! write the block back.

use crate::table::Metadata;
use serde_json::Value;

/// Metadata key holding the frontmatter fields
pub const FRONTMATTER_KEY: &str = "frontmatter";

/// Metadata key recording how the workbook header was written
pub const HEADER_TYPE_KEY: &str = "header_type";

const DELIMITER: &str = "---";

/// A frontmatter block found at the start of a document
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    /// Parsed fields; `None` when the YAML was invalid or not a mapping
    pub fields: Option<Metadata>,
    /// Index of the closing `---` line
    pub end: usize,
}

impl Frontmatter {
    /// The `title` field as text, if present and non-empty
    pub fn title(&self) -> Option<String> {
        let title = match self.fields.as_ref()?.get("title")? {
            Value::String(s) => s.trim().to_string(),
            Value::Null => return None,
            other => other.to_string(),
        };
        (!title.is_empty()).then_some(title)
    }
}

/// Find a frontmatter block starting on the first line.
///
/// Returns `None` without both delimiters. Invalid YAML still yields a
/// block (so its lines are skipped) but without fields.
pub fn read(lines: &[&str]) -> Option<Frontmatter> {
    if lines.first()?.trim_end() != DELIMITER {
        return None;
    }
    let end = (1..lines.len()).find(|&i| lines[i].trim_end() == DELIMITER)?;

    let yaml = lines[1..end].join("\n");
    let fields = if yaml.trim().is_empty() {
        Some(Metadata::new())
    } else {
        match serde_yaml::from_str::<Metadata>(&yaml) {
            Ok(fields) => Some(fields),
            Err(e) => {
                tracing::warn!("ignoring invalid frontmatter: {}", e);
                None
            }
        }
    };

    Some(Frontmatter { fields, end })
}

/// Frontmatter fields stored in workbook metadata, if the workbook was read from frontmatter
pub fn stored_fields(metadata: &Metadata) -> Option<&Metadata> {
    if metadata.get(HEADER_TYPE_KEY)?.as_str()? != FRONTMATTER_KEY {
        return None;
    }
    metadata.get(FRONTMATTER_KEY)?.as_object()
}

/// Tag workbook metadata with frontmatter fields
pub fn store(metadata: &mut Metadata, fields: Metadata) {
    metadata.insert(
        HEADER_TYPE_KEY.to_string(),
        Value::String(FRONTMATTER_KEY.to_string()),
    );
    metadata.insert(FRONTMATTER_KEY.to_string(), Value::Object(fields));
}

/// Render fields as a delimited YAML block (no trailing newline)
pub fn render(fields: &Metadata) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(fields)?;
    Ok(format!("{}\n{}{}", DELIMITER, yaml, DELIMITER))
}
