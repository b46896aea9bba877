//! Row tokenizer and separator-row classifier
//!
//! A row is split on the column separator, except where the separator is
//! escaped with a backslash or sits inside an inline-code span. Code spans
//! follow the usual Markdown rule: a run of N backticks is closed by the next
//! run of exactly N backticks; an unmatched run is literal text.

use crate::schema::ParsingSchema;
use crate::table::Alignment;
use regex::Regex;
use std::sync::LazyLock;

static BR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid <br> pattern"));

/// Split one line into cleaned cell strings.
///
/// Leading and trailing separators are optional (`| a | b |` and `a | b`
/// give the same cells). A line without any separator yields a single cell.
pub fn split_row(line: &str, schema: &ParsingSchema) -> Vec<String> {
    let raw = split_raw(line.trim(), schema.column_separator());
    let last = raw.len() - 1;
    let mut parts: Vec<(&str, bool)> = raw
        .into_iter()
        .enumerate()
        .map(|(i, part)| (part, i < last))
        .collect();

    if parts.len() > 1 && parts[0].0.is_empty() {
        parts.remove(0);
    }
    if parts.len() > 1 && parts.last().is_some_and(|(p, _)| p.is_empty()) {
        parts.pop();
    }

    parts
        .into_iter()
        .map(|(part, closed)| clean_cell(part, closed, schema))
        .collect()
}

/// True when the line contains at least one splitting separator
pub fn has_separator(line: &str, schema: &ParsingSchema) -> bool {
    split_raw(line.trim(), schema.column_separator()).len() > 1
}

/// Apply `<br>` conversion, unescaping and whitespace trimming to one raw cell.
///
/// `closed` is true when a separator directly follows the cell on its line.
pub fn clean_cell(cell: &str, closed: bool, schema: &ParsingSchema) -> String {
    let cell = if schema.convert_br_to_newline() {
        BR_TAG.replace_all(cell, "\n").into_owned()
    } else {
        cell.to_string()
    };

    let cell = unescape_cell(&cell, schema.column_separator(), closed);

    if schema.strip_whitespace() {
        cell.trim().to_string()
    } else {
        cell
    }
}

/// Encode cell text so that [`split_row`] reads it back unchanged.
///
/// Newlines become `<br>`. Outside code spans, separators and unmatched
/// backtick runs are escaped, and so are backslashes that precede them.
/// Inside code spans only separators are escaped. `closed` must be true when
/// a separator will directly follow the cell, so that a trailing backslash
/// run does not escape it.
pub fn escape_cell(cell: &str, sep: char, closed: bool) -> String {
    let cell = cell.replace("\r\n", "<br>").replace('\n', "<br>");
    let chars: Vec<char> = cell.chars().collect();
    let mut out = String::with_capacity(cell.len() + 4);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            let k = run_len(&chars, i, '\\');
            match chars.get(i + k) {
                Some(&next) if next == sep => {
                    push_n(&mut out, '\\', 2 * k + 1);
                    out.push(sep);
                    i += k + 1;
                }
                // the backtick branch below escapes an unmatched run itself
                Some('`') => {
                    push_n(&mut out, '\\', 2 * k);
                    i += k;
                }
                None if closed => {
                    push_n(&mut out, '\\', 2 * k);
                    i += k;
                }
                _ => {
                    push_n(&mut out, '\\', k);
                    i += k;
                }
            }
            continue;
        }

        if c == '`' {
            let n = run_len(&chars, i, '`');
            match closing_run(&chars, i + n, n) {
                Some(close) => {
                    push_n(&mut out, '`', n);
                    escape_span(&chars[i + n..close], sep, &mut out);
                    push_n(&mut out, '`', n);
                    i = close + n;
                }
                None => {
                    push_escaped_ticks(&mut out, n);
                    i += n;
                }
            }
            continue;
        }

        if c == sep {
            out.push('\\');
        }
        out.push(c);
        i += 1;
    }

    out
}

fn escape_span(chars: &[char], sep: char, out: &mut String) {
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            let k = run_len(chars, i, '\\');
            if chars.get(i + k) == Some(&sep) {
                push_n(out, '\\', 2 * k + 1);
                out.push(sep);
                i += k + 1;
            } else {
                push_n(out, '\\', k);
                i += k;
            }
            continue;
        }
        if chars[i] == sep {
            out.push('\\');
        }
        out.push(chars[i]);
        i += 1;
    }
}

/// Inverse of [`escape_cell`] on one raw cell.
///
/// A backslash run before a separator or backtick is halved; an odd run
/// makes that character literal. A backslash run at the very end of a
/// closed cell is halved too. Inside code spans only the separator rule
/// applies. Other backslashes are kept as written.
fn unescape_cell(raw: &str, sep: char, closed: bool) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            let m = run_len(&chars, i, '\\');
            match chars.get(i + m) {
                Some(&next) if next == sep || next == '`' => {
                    push_n(&mut out, '\\', m / 2);
                    i += m;
                    if m % 2 == 1 {
                        out.push(next);
                        i += 1;
                    }
                }
                None if closed => {
                    push_n(&mut out, '\\', m / 2);
                    i += m;
                }
                _ => {
                    push_n(&mut out, '\\', m);
                    i += m;
                }
            }
            continue;
        }

        if c == '`' {
            let n = run_len(&chars, i, '`');
            match closing_run(&chars, i + n, n) {
                Some(close) => {
                    push_n(&mut out, '`', n);
                    unescape_span(&chars[i + n..close], sep, &mut out);
                    push_n(&mut out, '`', n);
                    i = close + n;
                }
                None => {
                    push_n(&mut out, '`', n);
                    i += n;
                }
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

fn unescape_span(chars: &[char], sep: char, out: &mut String) {
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            let m = run_len(chars, i, '\\');
            if chars.get(i + m) == Some(&sep) {
                push_n(out, '\\', m / 2);
                out.push(sep);
                i += m + 1;
            } else {
                push_n(out, '\\', m);
                i += m;
            }
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
}

fn push_n(out: &mut String, c: char, n: usize) {
    out.extend(std::iter::repeat(c).take(n));
}

fn push_escaped_ticks(out: &mut String, n: usize) {
    for _ in 0..n {
        out.push_str("\\`");
    }
}

/// Classify a split row as a header separator.
///
/// Returns one alignment per cell, or `None` if the row is empty or any
/// cell is not of the form `:?` + one or more `header_char` + `:?`.
pub fn parse_separator_row(cells: &[String], header_char: char) -> Option<Vec<Alignment>> {
    if cells.is_empty() {
        return None;
    }

    cells
        .iter()
        .map(|cell| classify_cell(cell.trim(), header_char))
        .collect()
}

fn classify_cell(cell: &str, header_char: char) -> Option<Alignment> {
    let (left, rest) = match cell.strip_prefix(':') {
        Some(rest) => (true, rest),
        None => (false, cell),
    };
    let (right, body) = match rest.strip_suffix(':') {
        Some(body) => (true, body),
        None => (false, rest),
    };

    if body.is_empty() || !body.chars().all(|c| c == header_char) {
        return None;
    }

    Some(match (left, right) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::None,
    })
}

/// Split on unescaped separators outside code spans, keeping raw slices
fn split_raw(line: &str, sep: char) -> Vec<&str> {
    let (offsets, chars): (Vec<usize>, Vec<char>) = line.char_indices().unzip();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            // escaped character never splits
            i += 2;
            continue;
        }

        if c == '`' {
            let run = run_len(&chars, i, '`');
            i = match closing_run(&chars, i + run, run) {
                Some(close) => close + run,
                None => i + run,
            };
            continue;
        }

        if c == sep {
            parts.push(&line[start..offsets[i]]);
            start = offsets[i] + c.len_utf8();
        }
        i += 1;
    }

    parts.push(&line[start..]);
    parts
}

fn run_len(chars: &[char], from: usize, c: char) -> usize {
    chars[from..].iter().take_while(|&&x| x == c).count()
}

/// Start of the next backtick run of exactly `len` at or after `from`
fn closing_run(chars: &[char], from: usize, len: usize) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        if chars[j] == '`' {
            let run = run_len(chars, j, '`');
            if run == len {
                return Some(j);
            }
            j += run;
        } else {
            j += 1;
        }
    }
    None
}
