use crate::config::Config;
use crate::value::normalize_value;

/// A single variable definition.
///
/// A row only knows its own key. When it lives inside a [`Block`](crate::Block)
/// the block supplies its prefix at serialization and lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    key: String,
    value: String,
    comment: String,
    commented: bool,
    shadows: Vec<String>,
}

impl Row {
    /// Create a row; the key is normalized with [`normalize_key`].
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: normalize_key(key),
            value: value.into(),
            comment: String::new(),
            commented: false,
            shadows: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment(comment);
        self
    }

    /// Mark the row as disabled: it is written behind a comment marker.
    pub fn commented(mut self) -> Self {
        self.set_commented(true);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_commented(&self) -> bool {
        self.commented
    }

    /// Superseded values, oldest first.
    pub fn shadows(&self) -> &[String] {
        &self.shadows
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.value = value.into();
        self.shadows.retain(|shadow| *shadow != self.value);
        self
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = comment.into();
        self
    }

    pub fn set_commented(&mut self, commented: bool) -> &mut Self {
        self.commented = commented;
        if commented {
            self.shadows.clear();
        }
        self
    }

    pub fn has_shadow(&self, value: &str) -> bool {
        self.shadows.iter().any(|shadow| shadow == value)
    }

    /// Remember a superseded value.
    ///
    /// Duplicates, the current value, and any shadow on a commented row are
    /// ignored.
    pub fn add_shadow(&mut self, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if self.commented || value == self.value || self.has_shadow(&value) {
            return self;
        }

        self.shadows.push(value);
        self
    }

    pub fn add_shadows<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.add_shadow(value);
        }
        self
    }

    /// Take over the value of `other`, union its shadows and fill an empty
    /// comment from it.
    pub fn merge(&mut self, other: &Row) {
        self.set_value(other.value.clone());
        self.add_shadows(other.shadows.iter().cloned());
        self.backfill_comment(&other.comment);
    }

    pub(crate) fn backfill_comment(&mut self, comment: &str) {
        if self.comment.is_empty() && !comment.is_empty() {
            self.comment = comment.to_owned();
        }
    }

    pub(crate) fn set_key(&mut self, key: String) {
        self.key = key;
    }

    /// The serialized key: `PREFIX_KEY` inside a block, `KEY` otherwise.
    pub fn full_key(&self, prefix: Option<&str>) -> String {
        match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}_{}", self.key),
            _ => self.key.clone(),
        }
    }

    /// Serialize as output lines: comment lines, shadow lines, then the
    /// assignment itself.
    pub fn lines(&self, prefix: Option<&str>, config: &Config) -> Vec<String> {
        if self.commented && config.omits_commented() {
            return Vec::new();
        }

        let full_key = self.full_key(prefix);
        let mut lines = Vec::with_capacity(1 + self.shadows.len());

        if !self.comment.is_empty() && !config.omits_comments() {
            lines.extend(self.comment.split('\n').map(|line| format!("# {line}")));
        }

        if !self.commented && !config.omits_shadows() {
            lines.extend(
                self.shadows
                    .iter()
                    .map(|shadow| format_assignment(&full_key, shadow, true)),
            );
        }

        lines.push(format_assignment(&full_key, &self.value, self.commented));
        lines
    }

    pub fn marshal(&self, prefix: Option<&str>, config: &Config) -> String {
        self.lines(prefix, config).join("\n")
    }
}

fn format_assignment(key: &str, value: &str, commented: bool) -> String {
    let line = format!("{key}={}", normalize_value(value));
    if commented { format!("# {line}") } else { line }
}

/// Uppercase a key and collapse every run of characters other than ASCII
/// letters, digits and `.` into a single `_`.
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        let ch = if ch.is_ascii_alphanumeric() || ch == '.' {
            ch.to_ascii_uppercase()
        } else {
            '_'
        };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }

    out
}
