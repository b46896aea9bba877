//! Markdown generation, the structural inverse of the scanners
//!
//! Output is normalised rather than byte-identical to any source document;
//! re-scanning it yields the same tables, sheets and workbook.

use crate::frontmatter;
use crate::metadata::{encode_comment, MetadataKind};
use crate::parser::heading_line;
use crate::row::escape_cell;
use crate::schema::{MultiTableParsingSchema, ParsingSchema};
use crate::table::{Alignment, Sheet, SheetKind, Table, Workbook};
use serde_json::Value;

/// Render one table: header, separator, data rows and metadata comment.
///
/// A table without headers renders as an empty string. No trailing newline.
pub fn generate_table_markdown(table: &Table, schema: &ParsingSchema) -> String {
    let width = table.headers.len();
    if width == 0 {
        return String::new();
    }

    let mut lines = Vec::with_capacity(table.rows.len() + 3);

    let header: Vec<&str> = table.headers.iter().map(String::as_str).collect();
    lines.push(render_row(&header, schema));

    let separator: Vec<String> = (0..width)
        .map(|col| separator_cell(table.alignment(col), schema.header_separator_char()))
        .collect();
    let separator: Vec<&str> = separator.iter().map(String::as_str).collect();
    lines.push(render_row(&separator, schema));

    for row in &table.rows {
        let cells: Vec<&str> = (0..width)
            .map(|col| row.get(col).map_or("", String::as_str))
            .collect();
        lines.push(render_row(&cells, schema));
    }

    if let Some(metadata) = &table.metadata {
        lines.push(encode_comment(MetadataKind::Table, metadata));
    }

    lines.join("\n")
}

/// Render a sheet heading followed by its tables (or document content) and metadata.
///
/// No trailing newline.
pub fn generate_sheet_markdown(sheet: &Sheet, schema: &MultiTableParsingSchema) -> String {
    let mut blocks = vec![heading_line(schema.sheet_header_level(), &sheet.name)];

    match sheet.kind {
        SheetKind::Doc => {
            if let Some(content) = sheet.content.as_deref().filter(|c| !c.trim().is_empty()) {
                blocks.push(content.trim_end().to_string());
            }
        }
        SheetKind::Table => {
            for table in &sheet.tables {
                push_table_blocks(&mut blocks, table, schema);
            }
        }
    }

    if let Some(metadata) = &sheet.metadata {
        blocks.push(encode_comment(MetadataKind::Sheet, metadata));
    }

    blocks.join("\n\n")
}

/// Render a whole workbook document, ending with a newline.
///
/// A workbook read from frontmatter gets its frontmatter block back, titled
/// with the workbook name when the schema detects its root. Without a fixed
/// marker or frontmatter, the root is a level-1 heading with the workbook name.
pub fn generate_workbook_markdown(workbook: &Workbook, schema: &MultiTableParsingSchema) -> String {
    let mut blocks = Vec::new();
    let mut metadata = workbook.metadata.clone();

    let header = metadata
        .as_ref()
        .and_then(frontmatter::stored_fields)
        .and_then(|fields| {
            let mut fields = fields.clone();
            if let (None, Some(name)) = (schema.root_marker(), &workbook.name) {
                fields.insert("title".to_string(), Value::String(name.clone()));
            }
            match frontmatter::render(&fields) {
                Ok(block) => Some(block),
                Err(e) => {
                    tracing::warn!("frontmatter not written: {}", e);
                    None
                }
            }
        });
    if let Some(block) = header {
        blocks.push(block);
        if let Some(m) = metadata.as_mut() {
            m.remove(frontmatter::HEADER_TYPE_KEY);
            m.remove(frontmatter::FRONTMATTER_KEY);
        }
    }

    match schema.root_marker() {
        Some(marker) => blocks.push(marker.trim().to_string()),
        None if blocks.is_empty() => {
            blocks.push(heading_line(1, workbook.name.as_deref().unwrap_or("Workbook")))
        }
        None => {}
    }

    if let Some(content) = workbook.root_content.as_deref().filter(|c| !c.trim().is_empty()) {
        blocks.push(content.trim_end().to_string());
    }

    for sheet in &workbook.sheets {
        blocks.push(generate_sheet_markdown(sheet, schema));
    }

    if let Some(metadata) = metadata.filter(|m| !m.is_empty()) {
        blocks.push(encode_comment(MetadataKind::Workbook, &metadata));
    }

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn push_table_blocks(blocks: &mut Vec<String>, table: &Table, schema: &MultiTableParsingSchema) {
    match schema.table_header_level() {
        Some(level) => {
            if let Some(name) = &table.name {
                blocks.push(heading_line(level, name));
            }
            if let Some(description) = table.description.as_deref() {
                let lines: Vec<&str> = description
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect();
                if !lines.is_empty() {
                    blocks.push(lines.join("\n"));
                }
            }
        }
        None if table.name.is_some() || table.description.is_some() => {
            tracing::warn!(
                table = table.name.as_deref().unwrap_or_default(),
                "no table header level configured; table name and description not written"
            );
        }
        None => {}
    }

    let markdown = generate_table_markdown(table, schema.table());
    if !markdown.is_empty() {
        blocks.push(markdown);
    }
}

/// Escape and join cells into one row.
///
/// Outer separators are always written when the row would otherwise not
/// re-parse to the same cells: one column, an empty first or last cell, edge
/// whitespace that trimming the line would lose, or a first cell that would
/// start a heading, fence or comment.
///
/// Cells are padded with one space on each side only when the scanner strips
/// whitespace; otherwise the padding would become part of the cell.
fn render_row(cells: &[&str], schema: &ParsingSchema) -> String {
    let sep = schema.column_separator();
    let padded = schema.strip_whitespace();

    let needs_outer = schema.require_outer_pipes()
        || cells.len() == 1
        || cells.first().is_some_and(|c| {
            c.is_empty()
                || c.starts_with(char::is_whitespace)
                || c.starts_with(['#', '`', '~', '<'])
        })
        || cells
            .last()
            .is_some_and(|c| c.is_empty() || c.ends_with(char::is_whitespace));

    let last = cells.len().saturating_sub(1);
    let escaped: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| escape_cell(cell, sep, !padded && (i < last || needs_outer)))
        .collect();

    match (needs_outer, padded) {
        (true, true) => format!("{} {} {}", sep, escaped.join(&format!(" {} ", sep)), sep),
        (true, false) => format!("{}{}{}", sep, escaped.join(&sep.to_string()), sep),
        (false, true) => escaped.join(&format!(" {} ", sep)),
        (false, false) => escaped.join(&sep.to_string()),
    }
}

fn separator_cell(alignment: Alignment, c: char) -> String {
    let dashes = c.to_string().repeat(3);
    match alignment {
        Alignment::Left => format!(":{}", dashes),
        Alignment::Center => format!(":{}:", dashes),
        Alignment::Right => format!("{}:", dashes),
        Alignment::None => dashes,
    }
}
