use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;

use tracing::{debug, trace};

use crate::assembly::{RowSet, assemble};
use crate::config::Config;
use crate::document::Document;
use crate::error::{Error, ParseError};
use crate::grammar::{Line, comment_text, parse_line, strip_comment_markers};
use crate::row::Row;

/// Parse `.env` text into a grouped, sorted document.
pub fn parse_str(input: &str) -> Result<Document, Error> {
    parse_str_with_config(input, &Config::default())
}

pub fn parse_str_with_config(input: &str, config: &Config) -> Result<Document, Error> {
    let rows = parse_rows_with_config(input, config)?;
    Ok(assemble(rows, config))
}

/// Parse UTF-8 bytes into a document.
pub fn parse_bytes(input: &[u8]) -> Result<Document, Error> {
    parse_bytes_with_config(input, &Config::default())
}

pub fn parse_bytes_with_config(input: &[u8], config: &Config) -> Result<Document, Error> {
    let text = std::str::from_utf8(input)?;
    parse_str_with_config(text, config)
}

/// Parse a buffered reader into a document.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Document, Error> {
    parse_reader_with_config(reader, &Config::default())
}

pub fn parse_reader_with_config<R: BufRead>(
    mut reader: R,
    config: &Config,
) -> Result<Document, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    parse_bytes_with_config(&buf, config)
}

/// Extract the flat row set of one source without grouping it.
pub fn parse_rows(input: &str) -> Result<RowSet, Error> {
    parse_rows_with_config(input, &Config::default())
}

pub fn parse_rows_with_config(input: &str, config: &Config) -> Result<RowSet, Error> {
    let normalized = normalize_newlines(input);
    let mut collector = Collector::new(config);

    for statement in Statements::new(normalized.as_ref()) {
        collector.feed(statement.text, statement.line)?;
    }

    Ok(collector.finish())
}

/// Accumulates rows of a single source and applies the in-file collision
/// rules: the first live value wins and later values become its shadows.
struct Collector<'a> {
    config: &'a Config,
    rows: RowSet,
    /// Comment lines waiting for the row they annotate.
    pending_comments: Vec<String>,
    pending_banner: Option<String>,
    /// Values of repeated commented-out rows, kept until a live row takes
    /// them over as shadows.
    commented_history: HashMap<String, Vec<String>>,
}

impl<'a> Collector<'a> {
    fn new(config: &'a Config) -> Self {
        Self {
            config,
            rows: RowSet::new(),
            pending_comments: Vec::new(),
            pending_banner: None,
            commented_history: HashMap::new(),
        }
    }

    fn feed(&mut self, statement: &str, line: u32) -> Result<(), ParseError> {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        if trimmed.starts_with('#') {
            self.feed_comment(trimmed);
            return Ok(());
        }

        let mut logical = self.pending_comments.join("\n");
        if !logical.is_empty() {
            logical.push('\n');
        }
        logical.push_str(trimmed);
        self.pending_comments.clear();

        let assignment = match parse_line(&logical) {
            Ok(Line::Assignment(assignment)) => assignment,
            Ok(Line::Empty | Line::CommentOnly(_) | Line::BareExport) => return Ok(()),
            Err(kind) => return Err(ParseError::new(line, kind, trimmed)),
        };

        let row = Row::new(&assignment.key, assignment.value).with_comment(assignment.comment);
        if let Some(banner) = self.pending_banner.take() {
            self.rows.set_banner(row.key(), banner);
        }
        self.insert_live(row);
        Ok(())
    }

    fn feed_comment(&mut self, line: &str) {
        if let Some(banner) = self.config.banner_template().matches(line) {
            self.pending_banner = Some(banner);
            return;
        }

        let body = line.trim_start_matches('#');
        match parse_line(body) {
            Ok(Line::Assignment(assignment)) => {
                let comment = comment_text(self.pending_comments.iter().map(String::as_str));
                self.pending_comments.clear();
                let comment = join_lines(comment, &assignment.comment);
                let row = Row::new(&assignment.key, assignment.value)
                    .with_comment(comment)
                    .commented();
                if let Some(banner) = self.pending_banner.take() {
                    self.rows.set_banner(row.key(), banner);
                }
                self.insert_commented(row);
            }
            Ok(Line::Empty) => {}
            Ok(Line::CommentOnly(_) | Line::BareExport) | Err(_) => {
                if !strip_comment_markers(line).is_empty() {
                    self.pending_comments.push(line.to_owned());
                }
            }
        }
    }

    fn insert_live(&mut self, row: Row) {
        let key = row.key().to_owned();
        let Some(existing) = self.rows.get_mut(&key) else {
            self.rows.insert(row);
            return;
        };

        if !existing.is_commented() {
            debug!(key = %key, "duplicate key, keeping first value and shadowing later one");
            existing.add_shadow(row.value());
            existing.backfill_comment(row.comment());
            return;
        }

        trace!(key = %key, "live row replaces commented-out row");
        let mut replacement = row;
        replacement.add_shadow(existing.value());
        if let Some(history) = self.commented_history.remove(&key) {
            replacement.add_shadows(history);
        }
        replacement.backfill_comment(existing.comment());
        self.rows.insert(replacement);
    }

    fn insert_commented(&mut self, row: Row) {
        let key = row.key().to_owned();
        match self.rows.get_mut(&key) {
            Some(existing) if existing.is_commented() => {
                let history = self.commented_history.entry(key).or_default();
                if !history.iter().any(|value| value == row.value()) {
                    history.push(row.value().to_owned());
                }
            }
            Some(existing) => {
                existing.add_shadow(row.value());
            }
            None => {
                self.rows.insert(row);
            }
        }
    }

    fn finish(self) -> RowSet {
        self.rows
    }
}

fn join_lines(head: String, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (_, true) => head,
        (true, false) => tail.to_owned(),
        (false, false) => format!("{head}\n{tail}"),
    }
}

struct Statement<'a> {
    text: &'a str,
    line: u32,
}

/// Splits input into statements: one physical line each, except that a
/// value opening with a quote extends until the matching closing quote.
struct Statements<'a> {
    input: &'a str,
    offset: usize,
    line: u32,
}

impl<'a> Statements<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
        }
    }
}

impl<'a> Iterator for Statements<'a> {
    type Item = Statement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.input.len() {
            return None;
        }

        let rest = &self.input[self.offset..];
        let first_line_end = rest.find('\n').unwrap_or(rest.len());
        let end = quoted_statement_end(rest).unwrap_or(first_line_end);

        let text = &rest[..end];
        let statement = Statement {
            text,
            line: self.line,
        };

        self.line += text.matches('\n').count() as u32 + 1;
        self.offset += end + 1;
        Some(statement)
    }
}

/// End offset of a statement whose value opens a quote that spans lines.
///
/// Returns `None` for single-line statements, comment lines, and quotes
/// that are never closed.
fn quoted_statement_end(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let start = bytes.iter().position(|byte| !byte.is_ascii_whitespace())?;
    if bytes[start] == b'#' {
        return None;
    }

    let separator = bytes[start..]
        .iter()
        .position(|byte| matches!(byte, b'=' | b':' | b'\n'))
        .map(|idx| idx + start)?;
    if bytes[separator] == b'\n' {
        return None;
    }

    let value_start = bytes[separator + 1..]
        .iter()
        .position(|byte| *byte != b' ' && *byte != b'\t')
        .map(|idx| idx + separator + 1)?;
    let quote = bytes[value_start];
    if !matches!(quote, b'"' | b'\'') {
        return None;
    }

    let mut idx = value_start + 1;
    let mut newline_seen = false;
    while idx < bytes.len() {
        let byte = bytes[idx];
        if byte == b'\n' {
            newline_seen = true;
        } else if byte == quote && !is_escaped_quote(bytes, idx) {
            if !newline_seen {
                return None;
            }
            let tail = rest[idx..].find('\n').map_or(rest.len(), |end| idx + end);
            return Some(tail);
        }
        idx += 1;
    }

    None
}

fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            out.push('\n');
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            continue;
        }
        out.push(ch);
    }

    Cow::Owned(out)
}

/// Backslashes escape only double quotes; single-quoted text is literal.
fn is_escaped_quote(bytes: &[u8], idx: usize) -> bool {
    bytes[idx] == b'"' && is_preceded_by_odd_backslashes(bytes, idx)
}

fn is_preceded_by_odd_backslashes(bytes: &[u8], idx: usize) -> bool {
    let mut cursor = idx;
    let mut backslash_count = 0usize;
    while cursor > 0 && bytes[cursor - 1] == b'\\' {
        cursor -= 1;
        backslash_count += 1;
    }

    backslash_count % 2 == 1
}
