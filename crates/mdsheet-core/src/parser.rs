//! Table scanner: assembles one table from a run of lines

use crate::metadata::{self, MetadataKind};
use crate::row::{has_separator, parse_separator_row, split_row};
use crate::scanner::fence_mask;
use crate::schema::ParsingSchema;
use crate::table::{normalize_row, Alignment, LineSpan, Table};

/// Parse the first table found in `text`.
///
/// Fenced code blocks are skipped. Returns an empty table when the text
/// holds no header + separator pair.
pub fn parse_table(text: &str, schema: &ParsingSchema) -> Table {
    let lines: Vec<&str> = text.lines().collect();
    let fenced = fence_mask(&lines);

    (0..lines.len())
        .filter(|&i| !fenced[i])
        .find_map(|i| scan_table(&lines, i, schema).map(|(table, _)| table))
        .unwrap_or_default()
}

/// Scan a table starting at the first non-blank line at or after `start`.
///
/// That line must be a header row and the next line a separator row,
/// otherwise there is no table here and `None` is returned. Data rows run
/// until a blank line, a heading, a code fence, a metadata comment or the
/// end of input. A table metadata comment following the data block (blank
/// lines allowed in between) is consumed as the table's metadata.
///
/// Returns the table and the index of the first line after it. The table's
/// span uses 1-based numbers relative to `lines`.
pub fn scan_table(lines: &[&str], start: usize, schema: &ParsingSchema) -> Option<(Table, usize)> {
    let header_idx = (start..lines.len()).find(|&i| !lines[i].trim().is_empty())?;
    let header_line = lines[header_idx];
    let separator_line = lines.get(header_idx + 1)?;

    if !is_row_line(header_line, schema) || !is_row_line(separator_line, schema) {
        return None;
    }

    let separator = split_row(separator_line, schema);
    let alignments = parse_separator_row(&separator, schema.header_separator_char())?;

    let headers = split_row(header_line, schema);
    let width = headers.len();
    let alignments = if alignments.iter().any(|a| *a != Alignment::None) {
        let mut alignments = alignments;
        alignments.resize(width, Alignment::None);
        Some(alignments)
    } else {
        None
    };

    let mut rows = Vec::new();
    let mut i = header_idx + 2;
    while i < lines.len() && !ends_data_block(lines[i]) {
        rows.push(normalize_row(split_row(lines[i], schema), width));
        i += 1;
    }
    let mut last = i - 1;

    let mut metadata = None;
    let comment_idx = (i..lines.len()).find(|&j| !lines[j].trim().is_empty());
    if let Some(j) = comment_idx {
        if let Some(m) = metadata::read_comment(lines[j], MetadataKind::Table, j + 1) {
            metadata = Some(m);
            last = j;
            i = j + 1;
        }
    }

    tracing::debug!(
        line = header_idx + 1,
        columns = width,
        rows = rows.len(),
        "found table"
    );

    let table = Table {
        headers,
        rows,
        alignments,
        metadata,
        span: Some(LineSpan::from_indices(header_idx, last)),
        ..Table::default()
    };
    Some((table, i))
}

/// A line that can be a header or separator row
fn is_row_line(line: &str, schema: &ParsingSchema) -> bool {
    heading(line).is_none()
        && fence_marker(line).is_none()
        && !metadata::is_comment(line)
        && has_separator(line, schema)
}

fn ends_data_block(line: &str) -> bool {
    line.trim().is_empty()
        || heading(line).is_some()
        || fence_marker(line).is_some()
        || metadata::is_comment(line)
}

/// ATX heading level and text, e.g. `## Sheet 1 ##` -> `(2, "Sheet 1")`
pub(crate) fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }

    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    // optional closing sequence: spaces then only `#`s
    let text = rest.trim();
    let open = text.trim_end_matches('#');
    let text = if open.is_empty() || open.ends_with(char::is_whitespace) {
        open.trim_end()
    } else {
        text
    };
    Some((level, text))
}

/// Render an ATX heading that [`heading`] reads back as `text`
pub(crate) fn heading_line(level: usize, text: &str) -> String {
    let marks = "#".repeat(level);
    if text.ends_with('#') {
        format!("{} {} {}", marks, text, marks)
    } else {
        format!("{} {}", marks, text)
    }
}

/// Code fence opener/closer: fence character, run length, and whether an info string follows
pub(crate) fn fence_marker(line: &str) -> Option<(char, usize, bool)> {
    let trimmed = line.trim_start();
    let c = trimmed.chars().next()?;
    if c != '`' && c != '~' {
        return None;
    }

    let run = trimmed.chars().take_while(|&x| x == c).count();
    if run < 3 {
        return None;
    }
    let info = trimmed[run..].trim();
    if c == '`' && info.contains('`') {
        return None;
    }
    Some((c, run, !info.is_empty()))
}
