//! Parsing and generation options
//!
//! Schemas are immutable values handed to every entry point. They are built
//! through builders that reject inconsistent options up front, so scanning
//! code never has to re-check them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Root marker used when none is configured
pub const DEFAULT_ROOT_MARKER: &str = "# Tables";

/// Level-1 headings tried, in document order, when detecting the root finds no better candidate
pub const FALLBACK_ROOT_MARKERS: [&str; 2] = ["# Tables", "# Workbook"];

/// Options for tokenising and rendering a single table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingSchema {
    column_separator: char,
    header_separator_char: char,
    require_outer_pipes: bool,
    strip_whitespace: bool,
    convert_br_to_newline: bool,
}

impl Default for ParsingSchema {
    fn default() -> Self {
        Self {
            column_separator: '|',
            header_separator_char: '-',
            require_outer_pipes: true,
            strip_whitespace: true,
            convert_br_to_newline: false,
        }
    }
}

impl ParsingSchema {
    /// Start from the defaults
    pub fn builder() -> ParsingSchemaBuilder {
        ParsingSchemaBuilder {
            schema: Self::default(),
        }
    }

    pub fn column_separator(&self) -> char {
        self.column_separator
    }

    pub fn header_separator_char(&self) -> char {
        self.header_separator_char
    }

    /// Emit leading and trailing separators on generated rows
    pub fn require_outer_pipes(&self) -> bool {
        self.require_outer_pipes
    }

    pub fn strip_whitespace(&self) -> bool {
        self.strip_whitespace
    }

    pub fn convert_br_to_newline(&self) -> bool {
        self.convert_br_to_newline
    }

    fn validate(&self) -> Result<()> {
        let reserved = |c: char| c == '`' || c == '\\' || c == ':' || c.is_whitespace();

        if reserved(self.column_separator) {
            return Err(Error::Configuration(format!(
                "'{}' cannot be used as a column separator",
                self.column_separator.escape_default()
            )));
        }
        if reserved(self.header_separator_char) {
            return Err(Error::Configuration(format!(
                "'{}' cannot be used as a header separator character",
                self.header_separator_char.escape_default()
            )));
        }
        if self.column_separator == self.header_separator_char {
            return Err(Error::Configuration(format!(
                "column separator and header separator are both '{}'",
                self.column_separator
            )));
        }
        Ok(())
    }
}

/// Builder for [`ParsingSchema`]
#[derive(Debug, Clone)]
pub struct ParsingSchemaBuilder {
    schema: ParsingSchema,
}

impl ParsingSchemaBuilder {
    pub fn column_separator(mut self, c: char) -> Self {
        self.schema.column_separator = c;
        self
    }

    pub fn header_separator_char(mut self, c: char) -> Self {
        self.schema.header_separator_char = c;
        self
    }

    pub fn require_outer_pipes(mut self, on: bool) -> Self {
        self.schema.require_outer_pipes = on;
        self
    }

    pub fn strip_whitespace(mut self, on: bool) -> Self {
        self.schema.strip_whitespace = on;
        self
    }

    pub fn convert_br_to_newline(mut self, on: bool) -> Self {
        self.schema.convert_br_to_newline = on;
        self
    }

    /// Validate and freeze the schema
    pub fn build(self) -> Result<ParsingSchema> {
        self.schema.validate()?;
        Ok(self.schema)
    }
}

/// Options for scanning documents with several tables, sheets and a workbook root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiTableParsingSchema {
    table: ParsingSchema,
    root_marker: Option<String>,
    sheet_header_level: usize,
    table_header_level: Option<usize>,
    capture_description: bool,
}

impl Default for MultiTableParsingSchema {
    fn default() -> Self {
        Self {
            table: ParsingSchema::default(),
            root_marker: Some(DEFAULT_ROOT_MARKER.to_string()),
            sheet_header_level: 2,
            table_header_level: None,
            capture_description: false,
        }
    }
}

impl MultiTableParsingSchema {
    /// Start from the defaults
    pub fn builder() -> MultiTableSchemaBuilder {
        MultiTableSchemaBuilder {
            schema: Self::default(),
        }
    }

    /// Row-level options shared with single-table parsing
    pub fn table(&self) -> &ParsingSchema {
        &self.table
    }

    /// Fixed root marker line; `None` means the root is detected per document
    pub fn root_marker(&self) -> Option<&str> {
        self.root_marker.as_deref()
    }

    pub fn sheet_header_level(&self) -> usize {
        self.sheet_header_level
    }

    /// Heading level that names tables; `None` disables table names
    pub fn table_header_level(&self) -> Option<usize> {
        self.table_header_level
    }

    pub fn capture_description(&self) -> bool {
        self.capture_description
    }

    /// Workbook name implied by a fixed root marker (`# Tables` -> `Tables`)
    pub fn workbook_name(&self) -> Option<String> {
        self.root_marker
            .as_deref()
            .map(|m| m.trim().trim_start_matches('#').trim().to_string())
    }

    /// Heading level of the root marker.
    ///
    /// Detected roots are always level 1. A fixed marker that is not a
    /// heading has level 0.
    pub fn root_level(&self) -> usize {
        let Some(marker) = self.root_marker.as_deref() else {
            return 1;
        };
        let marker = marker.trim();
        let hashes = marker.chars().take_while(|&c| c == '#').count();
        if hashes > 0 && marker[hashes..].starts_with(' ') {
            hashes
        } else {
            0
        }
    }

    fn validate(&self) -> Result<()> {
        self.table.validate()?;

        if self
            .root_marker
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(Error::Configuration("root marker is empty".to_string()));
        }
        check_level("sheet header level", self.sheet_header_level)?;
        let root_level = self.root_level();
        if root_level > 0 && root_level >= self.sheet_header_level {
            return Err(Error::Configuration(format!(
                "sheet header level {} must be deeper than the root marker level {}",
                self.sheet_header_level, root_level
            )));
        }
        if let Some(level) = self.table_header_level {
            check_level("table header level", level)?;
            if level <= self.sheet_header_level {
                return Err(Error::Configuration(format!(
                    "table header level {} must be deeper than sheet header level {}",
                    level, self.sheet_header_level
                )));
            }
        }
        if self.capture_description && self.table_header_level.is_none() {
            return Err(Error::Configuration(
                "capture_description requires table_header_level to be set".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_level(what: &str, level: usize) -> Result<()> {
    if (1..=6).contains(&level) {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "{} must be between 1 and 6, got {}",
            what, level
        )))
    }
}

/// Builder for [`MultiTableParsingSchema`]
#[derive(Debug, Clone)]
pub struct MultiTableSchemaBuilder {
    schema: MultiTableParsingSchema,
}

impl MultiTableSchemaBuilder {
    /// Replace the row-level options
    pub fn table(mut self, table: ParsingSchema) -> Self {
        self.schema.table = table;
        self
    }

    pub fn root_marker(mut self, marker: impl Into<String>) -> Self {
        self.schema.root_marker = Some(marker.into());
        self
    }

    /// Detect the workbook root per document instead of matching a fixed marker
    pub fn detect_root(mut self) -> Self {
        self.schema.root_marker = None;
        self
    }

    pub fn sheet_header_level(mut self, level: usize) -> Self {
        self.schema.sheet_header_level = level;
        self
    }

    pub fn table_header_level(mut self, level: Option<usize>) -> Self {
        self.schema.table_header_level = level;
        self
    }

    pub fn capture_description(mut self, on: bool) -> Self {
        self.schema.capture_description = on;
        self
    }

    /// Validate and freeze the schema
    pub fn build(self) -> Result<MultiTableParsingSchema> {
        self.schema.validate()?;
        Ok(self.schema)
    }
}

/// Serialized form of a schema, as read from a JSON config file.
///
/// Every option is optional and falls back to the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub column_separator: Option<char>,
    pub header_separator_char: Option<char>,
    pub require_outer_pipes: Option<bool>,
    pub strip_whitespace: Option<bool>,
    pub convert_br_to_newline: Option<bool>,
    pub root_marker: Option<String>,
    /// Detect the workbook root instead of using `root_marker`
    pub detect_root: Option<bool>,
    pub sheet_header_level: Option<usize>,
    pub table_header_level: Option<usize>,
    pub capture_description: Option<bool>,
}

impl SchemaConfig {
    /// Parse a config document from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(Error::Json)
    }
}

impl TryFrom<SchemaConfig> for MultiTableParsingSchema {
    type Error = Error;

    fn try_from(config: SchemaConfig) -> Result<Self> {
        let defaults = ParsingSchema::default();
        let table = ParsingSchema::builder()
            .column_separator(config.column_separator.unwrap_or(defaults.column_separator))
            .header_separator_char(
                config
                    .header_separator_char
                    .unwrap_or(defaults.header_separator_char),
            )
            .require_outer_pipes(
                config
                    .require_outer_pipes
                    .unwrap_or(defaults.require_outer_pipes),
            )
            .strip_whitespace(config.strip_whitespace.unwrap_or(defaults.strip_whitespace))
            .convert_br_to_newline(
                config
                    .convert_br_to_newline
                    .unwrap_or(defaults.convert_br_to_newline),
            )
            .build()?;

        let builder = match (config.detect_root.unwrap_or(false), config.root_marker) {
            (true, Some(_)) => {
                return Err(Error::Configuration(
                    "root_marker and detect_root cannot both be set".to_string(),
                ));
            }
            (true, None) => MultiTableParsingSchema::builder().detect_root(),
            (false, marker) => MultiTableParsingSchema::builder()
                .root_marker(marker.unwrap_or_else(|| DEFAULT_ROOT_MARKER.to_string())),
        };

        builder
            .table(table)
            .sheet_header_level(config.sheet_header_level.unwrap_or(2))
            .table_header_level(config.table_header_level)
            .capture_description(config.capture_description.unwrap_or(false))
            .build()
    }
}
