//! Line-level tokenizer for a single logical `.env` statement.
//!
//! A logical statement is one assignment, optionally preceded by the comment
//! lines that annotate it. The assignment side accepts:
//!
//! - an optional leading `export` keyword,
//! - a key made of word characters and periods,
//! - `=` or a YAML-style `: ` separator (space after the colon is required),
//! - a single-quoted, double-quoted or unquoted value,
//! - a trailing `# comment`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseErrorKind;
use crate::value::strip_outer_quotes;

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\A\s*(?:export\s+)?([A-Za-z0-9_.]+)(?:\s*=\s*|:\s+?)('[\s\S]*'|"[\s\S]*"|[^#\n]+)?\s*(?:\s*#(.*))?\z"#,
    )
    .expect("line grammar is a valid regex")
});

static UNESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([^$])").expect("unescape pattern is a valid regex"));

const COMMENT_MARKER: char = '#';

/// Outcome of tokenizing one logical statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Nothing but whitespace.
    Empty,
    /// Only comment lines, with markers stripped and lines newline-joined.
    CommentOnly(String),
    /// `export` on its own; tolerated and ignored.
    BareExport,
    Assignment(Assignment),
}

/// The `(key, value, comment)` triple of a matched statement.
///
/// `key` is returned exactly as written; normalization happens when a row is
/// built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: String,
    pub comment: String,
}

/// Tokenize a logical statement.
pub fn parse_line(line: &str) -> Result<Line, ParseErrorKind> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Line::Empty);
    }

    if line.starts_with(COMMENT_MARKER) {
        let (first, rest) = match line.split_once('\n') {
            Some((first, rest)) => (first, Some(rest)),
            None => (line, None),
        };
        let leading = strip_comment_markers(first);

        let Some(rest) = rest else {
            return Ok(Line::CommentOnly(leading));
        };

        return Ok(match parse_line(rest)? {
            Line::Empty => Line::CommentOnly(leading),
            Line::CommentOnly(more) => Line::CommentOnly(join_comments(leading, &more)),
            Line::BareExport => Line::BareExport,
            Line::Assignment(mut assignment) => {
                assignment.comment = join_comments(leading, &assignment.comment);
                Line::Assignment(assignment)
            }
        });
    }

    let Some(captures) = LINE_RE.captures(line) else {
        return if is_bare_export(line) {
            Ok(Line::BareExport)
        } else {
            Err(ParseErrorKind::MalformedLine)
        };
    };

    let key = captures[1].to_owned();
    let raw_value = captures.get(2).map_or("", |m| m.as_str()).trim();
    let comment = captures.get(3).map_or("", |m| m.as_str()).trim().to_owned();

    Ok(Line::Assignment(Assignment {
        key,
        value: unquote_value(raw_value),
        comment,
    }))
}

/// Strip comment markers and surrounding whitespace from one comment line.
pub fn strip_comment_markers(line: &str) -> String {
    line.trim_matches(|ch: char| ch == COMMENT_MARKER || ch.is_whitespace())
        .to_owned()
}

/// Flatten buffered comment lines into newline-joined comment text.
pub(crate) fn comment_text<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines
        .into_iter()
        .map(strip_comment_markers)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_comments(leading: String, trailing: &str) -> String {
    match (leading.is_empty(), trailing.is_empty()) {
        (_, true) => leading,
        (true, false) => trailing.to_owned(),
        (false, false) => format!("{leading}\n{trailing}"),
    }
}

fn unquote_value(raw: &str) -> String {
    let double_quoted = raw.starts_with('"');
    let value = strip_outer_quotes(raw).unwrap_or(raw);
    if !double_quoted {
        return value.to_owned();
    }

    let value = value.replace("\\n", "\n").replace("\\r", "\r");
    UNESCAPE_RE.replace_all(&value, "$1").into_owned()
}

fn is_bare_export(line: &str) -> bool {
    line.strip_prefix("export")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}
