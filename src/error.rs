use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid UTF-8 input: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
}

/// A statement that could not be tokenized.
///
/// Parsing stops at the first such statement; nothing parsed before it is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}: {kind}: `{content}`")]
pub struct ParseError {
    pub line: u32,
    pub kind: ParseErrorKind,
    pub content: String,
}

impl ParseError {
    pub(crate) fn new(line: u32, kind: ParseErrorKind, content: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Neither an assignment, a comment, a blank line nor a bare `export`.
    #[error("malformed line")]
    MalformedLine,
}
