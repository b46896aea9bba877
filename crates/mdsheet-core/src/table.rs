//! Core document types: tables, sheets and workbooks

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured side-channel data attached to a table, sheet or workbook.
///
/// Always a JSON object in memory; it only becomes text inside a metadata
/// comment when a document is generated.
pub type Metadata = Map<String, Value>;

/// Column alignment declared by the separator row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    #[default]
    None,
}

/// 1-based, inclusive line range of an element in its source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    /// Build a span from 0-based, inclusive line indices
    pub fn from_indices(first: usize, last: usize) -> Self {
        Self {
            start: first + 1,
            end: last + 1,
        }
    }
}

/// A single Markdown table.
///
/// Every row has exactly `headers.len()` cells. Equality ignores `span`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Column names in order (duplicates allowed)
    pub headers: Vec<String>,
    /// Row data, one string per column
    pub rows: Vec<Vec<String>>,
    /// Per-column alignment; `None` when the separator row declared none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignments: Option<Vec<Alignment>>,
    /// Name taken from the table heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Text between the table heading and the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Where the table was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<LineSpan>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.headers == other.headers
            && self.rows == other.rows
            && self.alignments == other.alignments
            && self.name == other.name
            && self.description == other.description
            && self.metadata == other.metadata
    }
}

impl Table {
    /// Create a table from headers and rows, normalising every row to the header width
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| normalize_row(row, width))
            .collect();

        Self {
            headers,
            rows,
            ..Self::default()
        }
    }

    /// Attach a name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach alignments, padded or truncated to the header count
    pub fn with_alignments(mut self, mut alignments: Vec<Alignment>) -> Self {
        alignments.resize(self.headers.len(), Alignment::None);
        self.alignments = Some(alignments);
        self
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has neither headers nor rows
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Find the index of the first column with the given header
    pub fn find_column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Get a cell by row and column index
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Alignment of a column, `Alignment::None` when undeclared
    pub fn alignment(&self, col: usize) -> Alignment {
        self.alignments
            .as_ref()
            .and_then(|a| a.get(col).copied())
            .unwrap_or_default()
    }
}

/// Pad with empty cells or truncate so the row has exactly `width` cells
pub(crate) fn normalize_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

/// Whether a sheet holds tables or free-form document text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    #[default]
    Table,
    Doc,
}

/// A named group of tables inside a workbook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub tables: Vec<Table>,
    #[serde(default)]
    pub kind: SheetKind,
    /// Raw section text of a document sheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<LineSpan>,
}

impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.tables == other.tables
            && self.kind == other.kind
            && self.content == other.content
            && self.metadata == other.metadata
    }
}

impl Sheet {
    /// Create a new empty table sheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a sheet holding the given tables
    pub fn with_tables(name: impl Into<String>, tables: Vec<Table>) -> Self {
        Self {
            name: name.into(),
            tables,
            ..Self::default()
        }
    }

    /// Create a document sheet with free-form content
    pub fn doc(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SheetKind::Doc,
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Find the first table with the given name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.as_deref() == Some(name))
    }

    /// Mutable lookup of the first table with the given name
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name.as_deref() == Some(name))
    }
}

/// An ordered collection of sheets under a root marker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    /// Root marker text without the heading hashes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sheets: Vec<Sheet>,
    /// Text between the root marker and the first sheet heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<LineSpan>,
}

impl PartialEq for Workbook {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.sheets == other.sheets
            && self.root_content == other.root_content
            && self.metadata == other.metadata
    }
}

impl Workbook {
    /// Create a new empty workbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Find the first sheet with the given name
    pub fn get_sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Mutable lookup of the first sheet with the given name
    pub fn get_sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Iterate over every table in every sheet, in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.sheets.iter().flat_map(|s| s.tables.iter())
    }
}
