//! mdsheet-core: Markdown tables as spreadsheets
//!
//! This library provides functionality to:
//! - Split table rows, honouring escaped separators and inline code spans
//! - Scan documents for tables, sheets and a workbook root, skipping code fences
//! - Read and write JSON metadata carried in HTML comments and YAML frontmatter
//! - Generate Markdown back from tables, sheets and workbooks
//! - Convert rows into JSON records or serde types
//! - Apply structural edits, singly or as all-or-nothing patch documents

pub mod convert;
pub mod edit;
pub mod error;
pub mod frontmatter;
pub mod generator;
pub mod metadata;
pub mod parser;
pub mod patch;
pub mod row;
pub mod scanner;
pub mod schema;
pub mod table;

pub use convert::{
    convert_rows, normalize_header, parse_bool, serde_validator, ConversionSchema, FieldConverter,
    RowFields, RowResult,
};
pub use edit::SheetRef;
pub use error::{Error, Result, ValidationError};
pub use generator::{generate_sheet_markdown, generate_table_markdown, generate_workbook_markdown};
pub use metadata::MetadataKind;
pub use parser::parse_table;
pub use patch::{apply_patch, ColumnRef, Edit, PatchFile, PatchResult};
pub use scanner::{parse_sheet, parse_workbook, scan_tables};
pub use schema::{MultiTableParsingSchema, ParsingSchema, SchemaConfig};
pub use table::{Alignment, LineSpan, Metadata, Sheet, SheetKind, Table, Workbook};
