//! Document scanner for workbooks, sheets and free-standing tables
//!
//! Two modes share the same table discovery:
//! - workbook mode (`parse_workbook`) finds the workbook root (a fixed marker
//!   or a detected heading or frontmatter block), splits the section after it
//!   into sheets at the sheet heading level, and parses each sheet;
//! - scan mode (`scan_tables`) ignores workbook and sheet structure and
//!   returns every table in the document.
//!
//! Headings, tables and metadata comments inside fenced code blocks are never
//! structural.

use crate::frontmatter;
use crate::metadata::{self, MetadataKind};
use crate::parser::{fence_marker, heading, scan_table};
use crate::schema::{MultiTableParsingSchema, FALLBACK_ROOT_MARKERS};
use crate::table::{LineSpan, Metadata, Sheet, SheetKind, Table, Workbook};

/// Find every table in a document, in line order
pub fn scan_tables(text: &str, schema: &MultiTableParsingSchema) -> Vec<Table> {
    let lines: Vec<&str> = text.lines().collect();
    let fenced = fence_mask(&lines);
    extract_tables(&lines, &fenced, 0, schema)
}

/// Parse one sheet section (the text after its heading).
///
/// `line_offset` is the number of document lines before `text`; it makes
/// the reported spans absolute.
pub fn parse_sheet(
    text: &str,
    name: &str,
    schema: &MultiTableParsingSchema,
    line_offset: usize,
) -> Sheet {
    let lines: Vec<&str> = text.lines().collect();
    let fenced = fence_mask(&lines);
    let mut sheet = sheet_from_lines(name, &lines, &fenced, line_offset, schema);
    if !lines.is_empty() {
        sheet.span = Some(LineSpan::from_indices(
            line_offset,
            line_offset + lines.len() - 1,
        ));
    }
    sheet
}

/// Parse a workbook document.
///
/// The root is the configured marker line, or, when the schema detects it,
/// in order of preference:
/// 1. a YAML frontmatter block with a `title`;
/// 2. the only level-1 heading;
/// 3. the last level-1 heading before the workbook metadata comment (the
///    first one if none precedes it);
/// 4. the first `# Tables` or `# Workbook` line.
///
/// Returns an empty workbook when no root is found.
pub fn parse_workbook(text: &str, schema: &MultiTableParsingSchema) -> Workbook {
    let mut lines: Vec<&str> = text.lines().collect();

    let block = frontmatter::read(&lines);
    if let Some(block) = &block {
        lines[..=block.end].fill("");
    }
    let fenced = fence_mask(&lines);

    let mut metadata = None;
    let mut metadata_idx = None;
    for i in 0..lines.len() {
        if fenced[i] {
            continue;
        }
        if let Some(m) = metadata::read_comment(lines[i], MetadataKind::Workbook, i + 1) {
            metadata = Some(m);
            metadata_idx = Some(i);
            lines[i] = "";
            break;
        }
    }

    let titled = block.as_ref().and_then(|b| Some((b.title()?, b)));
    if let Some((_, block)) = &titled {
        if let Some(fields) = block.fields.clone() {
            frontmatter::store(metadata.get_or_insert_with(Metadata::new), fields);
        }
    }

    let root = match schema.root_marker() {
        Some(marker) => {
            let marker = marker.trim();
            (0..lines.len())
                .find(|&i| !fenced[i] && lines[i].trim() == marker)
                .map(|line| Root {
                    line,
                    name: schema.workbook_name().unwrap_or_default(),
                    span_start: line,
                })
        }
        None => match titled {
            Some((title, block)) => Some(Root {
                line: block.end,
                name: title,
                span_start: 0,
            }),
            None => detect_root(&lines, &fenced, metadata_idx),
        },
    };
    let Some(root) = root else {
        tracing::debug!(marker = ?schema.root_marker(), "workbook root not found");
        return Workbook::default();
    };
    tracing::debug!(name = %root.name, line = root.line + 1, "found workbook root");
    let root_idx = root.line;

    let sheet_level = schema.sheet_header_level();
    let mut headings: Vec<(usize, &str)> = Vec::new();
    let mut end = lines.len();

    for i in root_idx + 1..lines.len() {
        if fenced[i] {
            continue;
        }
        if let Some((level, title)) = heading(lines[i]) {
            if level < sheet_level {
                end = i;
                break;
            }
            if level == sheet_level {
                headings.push((i, title));
            }
        }
    }

    let root_end = headings.first().map_or(end, |&(i, _)| i);
    let root_content = join_trimmed(&lines[root_idx + 1..root_end]);

    let mut sheets = Vec::with_capacity(headings.len());
    for (n, &(heading_idx, title)) in headings.iter().enumerate() {
        let body_start = heading_idx + 1;
        let body_end = headings.get(n + 1).map_or(end, |&(i, _)| i);

        tracing::debug!(sheet = title, line = heading_idx + 1, "found sheet");
        let mut sheet = sheet_from_lines(
            title,
            &lines[body_start..body_end],
            &fenced[body_start..body_end],
            body_start,
            schema,
        );
        sheet.span = Some(LineSpan::from_indices(heading_idx, body_end - 1));
        sheets.push(sheet);
    }

    Workbook {
        name: Some(root.name),
        sheets,
        root_content,
        metadata,
        span: Some(LineSpan::from_indices(
            root.span_start,
            end.max(root_idx + 1) - 1,
        )),
    }
}

/// Where a workbook starts: the root line, or the frontmatter's closing line
struct Root {
    line: usize,
    name: String,
    span_start: usize,
}

fn detect_root(lines: &[&str], fenced: &[bool], metadata_idx: Option<usize>) -> Option<Root> {
    let h1: Vec<(usize, &str)> = (0..lines.len())
        .filter(|&i| !fenced[i])
        .filter_map(|i| match heading(lines[i]) {
            Some((1, title)) if !title.is_empty() => Some((i, title)),
            _ => None,
        })
        .collect();

    let chosen = match (h1.as_slice(), metadata_idx) {
        ([only], _) => Some(*only),
        ([first, ..], Some(meta)) => Some(
            h1.iter()
                .rev()
                .find(|&&(i, _)| i < meta)
                .copied()
                .unwrap_or(*first),
        ),
        _ => None,
    };
    if let Some((line, title)) = chosen {
        return Some(Root {
            line,
            name: title.to_string(),
            span_start: line,
        });
    }

    (0..lines.len())
        .filter(|&i| !fenced[i])
        .find_map(|i| {
            let text = lines[i].trim();
            FALLBACK_ROOT_MARKERS
                .iter()
                .any(|m| *m == text)
                .then_some((i, text))
        })
        .map(|(line, marker)| Root {
            line,
            name: marker.trim_start_matches('#').trim().to_string(),
            span_start: line,
        })
}

fn sheet_from_lines(
    name: &str,
    lines: &[&str],
    fenced: &[bool],
    offset: usize,
    schema: &MultiTableParsingSchema,
) -> Sheet {
    let mut lines = lines.to_vec();
    let mut metadata = None;

    for i in 0..lines.len() {
        if fenced[i] {
            continue;
        }
        if let Some(m) = metadata::read_comment(lines[i], MetadataKind::Sheet, offset + i + 1) {
            metadata = Some(m);
            lines[i] = "";
            break;
        }
    }

    let tables = extract_tables(&lines, fenced, offset, schema);
    let content = if tables.is_empty() {
        join_trimmed(&lines)
    } else {
        None
    };
    let kind = if content.is_some() {
        SheetKind::Doc
    } else {
        SheetKind::Table
    };

    Sheet {
        name: name.to_string(),
        tables,
        kind,
        content,
        metadata,
        span: None,
    }
}

/// Walk lines collecting tables, plus names and descriptions when a table
/// heading level is configured.
///
/// Only the first table after a heading is labelled with that heading's
/// name and the non-blank text lines between the two.
fn extract_tables(
    lines: &[&str],
    fenced: &[bool],
    offset: usize,
    schema: &MultiTableParsingSchema,
) -> Vec<Table> {
    let table_level = schema.table_header_level();
    let mut tables = Vec::new();
    let mut name: Option<String> = None;
    let mut description: Vec<&str> = Vec::new();
    let mut labelled = true;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let text = line.trim();

        if fenced[i] || text.is_empty() {
            if fenced[i] && labelled && !text.is_empty() {
                description.push(text);
            }
            i += 1;
            continue;
        }

        if let Some((level, title)) = heading(line) {
            match table_level {
                Some(t) if level == t => name = Some(title.to_string()),
                Some(t) if level < t => name = None,
                _ => {}
            }
            description.clear();
            labelled = true;
            i += 1;
            continue;
        }

        if let Some((mut table, next)) = scan_table(lines, i, schema.table()) {
            if labelled {
                table.name = name.take();
                if schema.capture_description() && !description.is_empty() {
                    table.description = Some(description.join("\n"));
                }
            }
            table.span = table.span.map(|s| LineSpan {
                start: s.start + offset,
                end: s.end + offset,
            });
            labelled = false;
            description.clear();
            tables.push(table);
            i = next;
            continue;
        }

        if labelled && !metadata::is_comment(line) {
            description.push(text);
        }
        i += 1;
    }

    tables
}

/// Mark every line that belongs to a fenced code block, fences included
pub(crate) fn fence_mask(lines: &[&str]) -> Vec<bool> {
    let mut mask = Vec::with_capacity(lines.len());
    let mut open: Option<(char, usize)> = None;

    for line in lines {
        let marker = fence_marker(line);
        match (open, marker) {
            (None, Some((c, run, _))) => {
                open = Some((c, run));
                mask.push(true);
            }
            (Some((c, run)), Some((close_c, close_run, false)))
                if close_c == c && close_run >= run =>
            {
                open = None;
                mask.push(true);
            }
            (Some(_), _) => mask.push(true),
            (None, None) => mask.push(false),
        }
    }

    mask
}

/// Join lines with leading and trailing blank lines removed; `None` if nothing remains
fn join_trimmed(lines: &[&str]) -> Option<String> {
    let first = lines.iter().position(|l| !l.trim().is_empty())?;
    let last = lines.iter().rposition(|l| !l.trim().is_empty())?;
    Some(lines[first..=last].join("\n").trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn named_schema(capture: bool) -> MultiTableParsingSchema {
        MultiTableParsingSchema::builder()
            .table_header_level(Some(3))
            .capture_description(capture)
            .build()
            .unwrap()
    }

    #[test]
    fn test_workbook_two_sheets() {
        let text = "# Tables\n\n## S1\n\n| A |\n|---|\n| 1 |\n\n## S2\n\n| B |\n|---|\n| 2 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());

        assert_eq!(workbook.name.as_deref(), Some("Tables"));
        assert_eq!(workbook.sheets.len(), 2);
        assert_eq!(workbook.sheets[0].name, "S1");
        assert_eq!(workbook.sheets[1].name, "S2");
        assert_eq!(workbook.sheets[1].tables[0].rows, vec![strings(&["2"])]);
        assert_eq!(workbook.sheets[0].span, Some(LineSpan { start: 3, end: 8 }));
        assert_eq!(
            workbook.sheets[1].tables[0].span,
            Some(LineSpan { start: 11, end: 13 })
        );
    }

    #[test]
    fn test_workbook_missing_root_is_empty() {
        let workbook = parse_workbook(
            "## Sheet 1\n| A |\n|---|\n| 1 |\n",
            &MultiTableParsingSchema::default(),
        );
        assert_eq!(workbook.sheet_count(), 0);
        assert!(workbook.get_sheet("Sheet 1").is_none());
    }

    #[test]
    fn test_content_before_root_ignored() {
        let text = "Intro\n## Not a sheet\n# Tables\n\n## Sheet 1\n| A |\n|---|\n| 1 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.sheets[0].name, "Sheet 1");
        assert_eq!(workbook.span.map(|s| s.start), Some(3));
    }

    #[test]
    fn test_root_marker_in_fence_skipped() {
        let text = "# Doc\n\n```markdown\n# Tables\n## Fake\n```\n\n# Tables\n\n## Sheet 1\n\n| A | B |\n|---|---|\n| 1 | 2 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.sheets[0].name, "Sheet 1");
    }

    #[test]
    fn test_sheet_heading_in_fence_skipped() {
        let text = "# Tables\n\n## Sheet 1\n\nSome description.\n\n```python\n# Not a sheet header\n## Not a sheet header\n```\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\n## Sheet 2\n\n| C | D |\n|---|---|\n| 3 | 4 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        assert_eq!(workbook.sheets.len(), 2);
        assert_eq!(workbook.sheets[0].name, "Sheet 1");
        assert_eq!(workbook.sheets[0].tables.len(), 1);
        assert_eq!(workbook.sheets[1].name, "Sheet 2");
    }

    #[test]
    fn test_shallower_heading_ends_workbook() {
        let text = "# Tables\n\n## S1\n\n| A |\n|---|\n| 1 |\n\n# Appendix\n\n## Not a sheet\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.span, Some(LineSpan { start: 1, end: 8 }));
    }

    #[test]
    fn test_root_content_captured() {
        let text = "# Tables\n\nThis is root content.\n It has multiple lines.\n\n## Sheet 1\n\n| A |\n|---|\n| 1 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        assert_eq!(
            workbook.root_content.as_deref(),
            Some("This is root content.\n It has multiple lines.")
        );
    }

    #[test]
    fn test_root_content_without_sheets() {
        let workbook = parse_workbook(
            "# Tables\n\nThis is a Root Document\n",
            &MultiTableParsingSchema::default(),
        );
        assert!(workbook.sheets.is_empty());
        assert_eq!(
            workbook.root_content.as_deref(),
            Some("This is a Root Document")
        );
    }

    #[test]
    fn test_multiple_tables_in_sheet() {
        let text = "# Tables\n\n## Sheet 2\n\n| X | Y |\n| --- | --- |\n| 9 | 8 |\n\n| Z |\n| --- |\n| 7 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.tables.len(), 2);
        assert_eq!(sheet.tables[0].headers, strings(&["X", "Y"]));
        assert_eq!(sheet.tables[1].headers, strings(&["Z"]));
    }

    #[test]
    fn test_sheet_metadata() {
        let text = "# Tables\n\n## Sheet 1\n<!-- md-spreadsheet-sheet-metadata: {\"layout\": {\"type\": \"split\"}} -->\n\n| A | B |\n|---|---|\n| 1 | 2 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        let sheet = &workbook.sheets[0];
        assert_eq!(
            sheet.metadata.clone().map(serde_json::Value::Object),
            Some(json!({"layout": {"type": "split"}}))
        );
        assert_eq!(sheet.tables.len(), 1);
    }

    #[test]
    fn test_workbook_metadata() {
        let text = "# Tables\n\n## S\n\n| A |\n|---|\n| 1 |\n\n<!-- md-spreadsheet-workbook-metadata: {\"active\": 0} -->\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        assert_eq!(
            workbook.metadata.map(serde_json::Value::Object),
            Some(json!({"active": 0}))
        );
        assert_eq!(workbook.sheets[0].kind, SheetKind::Table);
    }

    #[test]
    fn test_doc_sheet() {
        let text = "# Tables\n\n## Notes\n\nThis is my documentation.\n\n- Point 1\n\n## Data\n\n| A |\n|---|\n| 1 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        let notes = workbook.get_sheet("Notes").unwrap();
        assert_eq!(notes.kind, SheetKind::Doc);
        assert_eq!(
            notes.content.as_deref(),
            Some("This is my documentation.\n\n- Point 1")
        );
        assert_eq!(workbook.get_sheet("Data").unwrap().kind, SheetKind::Table);
    }

    #[test]
    fn test_table_names_and_descriptions() {
        let text = "# Tables\n\n## Sheet\n\n### Users\n\nAll registered users.\nUpdated daily.\n\n| id |\n|----|\n| 1 |\n\n### Orders\n\n| no |\n|----|\n| 9 |\n";
        let workbook = parse_workbook(text, &named_schema(true));
        let sheet = &workbook.sheets[0];

        let users = sheet.get_table("Users").unwrap();
        assert_eq!(
            users.description.as_deref(),
            Some("All registered users.\nUpdated daily.")
        );
        let orders = sheet.get_table("Orders").unwrap();
        assert_eq!(orders.description, None);
        assert_eq!(orders.rows, vec![strings(&["9"])]);
    }

    #[test]
    fn test_names_without_description_capture() {
        let text = "### T1\n\nText here.\n\n| a |\n|---|\n| 1 |\n";
        let tables = scan_tables(text, &named_schema(false));
        assert_eq!(tables[0].name.as_deref(), Some("T1"));
        assert_eq!(tables[0].description, None);
    }

    #[test]
    fn test_only_first_table_after_heading_is_named() {
        let text = "### T1\n\n| a |\n|---|\n| 1 |\n\nbetween\n\n| b |\n|---|\n| 2 |\n";
        let tables = scan_tables(text, &named_schema(true));
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name.as_deref(), Some("T1"));
        assert_eq!(tables[1].name, None);
        assert_eq!(tables[1].description, None);
    }

    #[test]
    fn test_scan_ignores_structure() {
        let text = "Intro text\n\n| A |\n|---|\n| 1 |\n\n## Heading\n\n```\n| X |\n|---|\n```\n\n| B | C |\n|:--|--:|\n| 2 | 3 |\n";
        let tables = scan_tables(text, &MultiTableParsingSchema::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, strings(&["A"]));
        assert_eq!(tables[1].headers, strings(&["B", "C"]));
        assert_eq!(tables[1].span, Some(LineSpan { start: 14, end: 16 }));
    }

    #[test]
    fn test_parse_sheet_with_offset() {
        let sheet = parse_sheet(
            "\n| A |\n|---|\n| 1 |\n",
            "Data",
            &MultiTableParsingSchema::default(),
            10,
        );
        assert_eq!(sheet.name, "Data");
        assert_eq!(sheet.tables[0].span, Some(LineSpan { start: 12, end: 14 }));
        assert_eq!(sheet.span, Some(LineSpan { start: 11, end: 14 }));
    }

    fn detecting() -> MultiTableParsingSchema {
        MultiTableParsingSchema::builder().detect_root().build().unwrap()
    }

    #[test]
    fn test_sheet_heading_closing_sequence() {
        let text = "# Tables ##\n\n## Sheet 1 ##\n\n| A |\n|---|\n| 1 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        assert_eq!(workbook.sheets.len(), 0);

        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Tables"));
        assert_eq!(workbook.sheets[0].name, "Sheet 1");
    }

    #[test]
    fn test_detect_single_h1() {
        let text = "Some intro text.\n\n# My Project\n\n## Sheet1\n\n| A | B |\n| - | - |\n| 1 | 2 |\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("My Project"));
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.sheets[0].name, "Sheet1");
        assert_eq!(workbook.span.map(|s| s.start), Some(3));
    }

    #[test]
    fn test_detect_falls_back_to_tables_or_workbook() {
        let text = "# Front Matter\n\nIntro.\n\n# Tables\n\n## Data\n\n| A |\n| - |\n| 1 |\n\n# Appendix\n\nNotes.\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Tables"));
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.sheets[0].name, "Data");

        let text = "# Introduction\n\nSome intro.\n\n# Workbook\n\n## Sheet1\n\n| A |\n| - |\n| 1 |\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Workbook"));
        assert_eq!(workbook.sheets.len(), 1);

        let text = "# First\n\n# Second\n\nNo fallback markers here.\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name, None);
        assert!(workbook.sheets.is_empty());
    }

    #[test]
    fn test_detect_h1_holding_metadata() {
        let text = "# Notes\n\nPlain text.\n\n# Budget\n\n## Q1\n\n| A |\n|---|\n| 1 |\n\n<!-- md-spreadsheet-workbook-metadata: {\"active\": 0} -->\n\n# Appendix\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Budget"));
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(
            workbook.metadata.map(serde_json::Value::Object),
            Some(json!({"active": 0}))
        );
    }

    #[test]
    fn test_detect_ignores_fenced_h1() {
        let text = "Some intro text.\n\n```markdown\n# This is in a code block\n```\n\n# Tables\n\n## Sheet1\n\n| A |\n| - |\n| 1 |\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Tables"));
        assert_eq!(workbook.sheets.len(), 1);

        let text = "# Real H1\n\n## Sheet1\n\n```markdown\n# Not a Real H1\n```\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Real H1"));
        assert!(workbook.sheets[0]
            .content
            .as_deref()
            .unwrap()
            .contains("# Not a Real H1"));
    }

    #[test]
    fn test_frontmatter_title_is_root() {
        let text = "---\ntitle: My Cool App\ndescription: A test app\n---\n## Sheet 1\n| Col A |\n|---|\n| Val |\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("My Cool App"));
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.sheets[0].name, "Sheet 1");
        assert_eq!(workbook.span.map(|s| s.start), Some(1));

        let metadata = serde_json::Value::Object(workbook.metadata.unwrap());
        assert_eq!(metadata["header_type"], json!("frontmatter"));
        assert_eq!(metadata["frontmatter"]["description"], json!("A test app"));
    }

    #[test]
    fn test_frontmatter_without_title_ignored() {
        let text = "---\nauthor: john_doe\n---\n# Real Book\n## Sheet 1\n| A |\n|---|\n| 1 |\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Real Book"));
        assert_eq!(workbook.metadata, None);
        assert_eq!(workbook.sheets.len(), 1);
    }

    #[test]
    fn test_frontmatter_workbook_ends_at_next_h1() {
        let text = "---\ntitle: Book 1\n---\n## Sheet 1\n| A |\n|---|\n| 1 |\n\n# Book 2\n## Sheet 2\n| B |\n|---|\n| 2 |\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Book 1"));
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.span, Some(LineSpan { start: 1, end: 8 }));
    }

    #[test]
    fn test_frontmatter_beside_comment_metadata() {
        let text = "---\ntitle: Frontmatter Title\nauthor: overriding_author\n---\n<!-- md-spreadsheet-workbook-metadata: {\"title\": \"Comment Title\", \"author\": \"original\", \"guiData\": 123} -->\n## Sheet\n| A |\n|---|\n| 1 |\n";
        let workbook = parse_workbook(text, &detecting());
        assert_eq!(workbook.name.as_deref(), Some("Frontmatter Title"));

        let metadata = serde_json::Value::Object(workbook.metadata.unwrap());
        assert_eq!(metadata["frontmatter"]["title"], json!("Frontmatter Title"));
        assert_eq!(metadata["frontmatter"]["author"], json!("overriding_author"));
        assert_eq!(metadata["guiData"], json!(123));
        assert_eq!(metadata["title"], json!("Comment Title"));
        assert_eq!(metadata["author"], json!("original"));
    }

    #[test]
    fn test_fixed_marker_keeps_frontmatter_fields() {
        let text = "---\ntitle: Ledger\n---\n# Tables\n\n## S\n\n| A |\n|---|\n| 1 |\n";
        let workbook = parse_workbook(text, &MultiTableParsingSchema::default());
        assert_eq!(workbook.name.as_deref(), Some("Tables"));
        let metadata = serde_json::Value::Object(workbook.metadata.unwrap());
        assert_eq!(metadata["frontmatter"]["title"], json!("Ledger"));
    }

    #[test]
    fn test_fence_mask() {
        let lines = vec!["a", "````", "```", "## x", "````", "b", "~~~", "```", "~~~", "c"];
        assert_eq!(
            fence_mask(&lines),
            vec![false, true, true, true, true, false, true, true, true, false]
        );
    }
}
