use crate::config::Config;
use crate::row::{Row, normalize_key};

/// An ordered group of rows sharing a key prefix.
///
/// Member rows are stored under their local key (prefix stripped); the block
/// is the only place that knows the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    prefix: String,
    comment: String,
    rows: Vec<Row>,
}

impl Block {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: normalize_key(prefix),
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment(comment);
        self
    }

    pub fn with_row(mut self, row: Row) -> Self {
        self.add_row(row);
        self
    }

    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.add_value(key, value);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = comment.into();
        self
    }

    pub fn set_prefix(&mut self, prefix: &str) -> &mut Self {
        self.prefix = normalize_key(prefix);
        self
    }

    /// Append a row keyed by its local key; a no-op if the key is taken.
    pub fn add_row(&mut self, row: Row) -> &mut Self {
        if !self.has_local(row.key()) {
            self.rows.push(row);
        }
        self
    }

    pub fn add_rows(&mut self, rows: impl IntoIterator<Item = Row>) -> &mut Self {
        for row in rows {
            self.add_row(row);
        }
        self
    }

    pub fn add_value(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.add_row(Row::new(key, value))
    }

    /// Append a row whose key still carries this block's prefix.
    ///
    /// Rows whose key does not start with `PREFIX_` are ignored.
    pub fn add_prefixed_row(&mut self, mut row: Row) -> &mut Self {
        let Some(local) = self.strip_prefix(row.key()).map(str::to_owned) else {
            return self;
        };

        row.set_key(local);
        self.add_row(row)
    }

    pub fn add_prefixed_rows(&mut self, rows: impl IntoIterator<Item = Row>) -> &mut Self {
        for row in rows {
            self.add_prefixed_row(row);
        }
        self
    }

    pub fn get_row(&self, key: &str) -> Option<&Row> {
        self.position(&normalize_key(key))
            .map(|index| &self.rows[index])
    }

    pub fn get_row_mut(&mut self, key: &str) -> Option<&mut Row> {
        self.position(&normalize_key(key))
            .map(|index| &mut self.rows[index])
    }

    /// Look up a row by a key that may include the block prefix.
    pub fn get_prefixed_row(&self, key: &str) -> Option<&Row> {
        let key = self.local_key(key);
        self.position(&key).map(|index| &self.rows[index])
    }

    pub fn get_prefixed_row_mut(&mut self, key: &str) -> Option<&mut Row> {
        let key = self.local_key(key);
        self.position(&key).map(|index| &mut self.rows[index])
    }

    pub fn has_row(&self, key: &str) -> bool {
        self.get_row(key).is_some()
    }

    pub fn remove_row(&mut self, key: &str) -> Option<Row> {
        let index = self.position(&normalize_key(key))?;
        Some(self.rows.remove(index))
    }

    pub fn remove_prefixed_row(&mut self, key: &str) -> Option<Row> {
        let index = self.position(&self.local_key(key))?;
        Some(self.rows.remove(index))
    }

    pub fn remove_row_at(&mut self, index: usize) -> Option<Row> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Override merge: rows of `other` replace values of same-key rows and
    /// missing rows are appended. The banner is only filled when empty.
    pub fn merge_block(&mut self, other: Block) {
        for row in other.rows {
            self.merge_row(row);
        }
        self.backfill_comment(&other.comment);
    }

    pub fn merge_row(&mut self, row: Row) {
        match self.position(row.key()) {
            Some(index) => self.rows[index].merge(&row),
            None => self.rows.push(row),
        }
    }

    /// Additive merge: only rows missing here are taken from `other`.
    pub fn add_from_block(&mut self, other: Block) {
        self.add_rows(other.rows);
        self.backfill_comment(&other.comment);
    }

    pub(crate) fn backfill_comment(&mut self, comment: &str) {
        if self.comment.is_empty() && !comment.is_empty() {
            self.comment = comment.to_owned();
        }
    }

    pub(crate) fn sort_rows(&mut self) {
        self.rows.sort_by(|a, b| a.key().cmp(b.key()));
    }

    /// Full keys of every member row, in row order.
    pub fn full_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.rows.iter().map(|row| row.full_key(Some(&self.prefix)))
    }

    /// Banner line (if any) followed by every member row's lines.
    ///
    /// An empty block renders nothing, banner included.
    pub fn lines(&self, config: &Config) -> Vec<String> {
        if self.rows.is_empty() {
            return Vec::new();
        }

        let mut lines = Vec::new();
        if !self.comment.is_empty() && !config.omits_comments() {
            lines.push(config.banner_template().render(&self.comment));
        }
        for row in &self.rows {
            lines.extend(row.lines(Some(&self.prefix), config));
        }

        lines
    }

    pub fn marshal(&self, config: &Config) -> String {
        self.lines(config).join("\n")
    }

    fn position(&self, local_key: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.key() == local_key)
    }

    fn has_local(&self, local_key: &str) -> bool {
        self.position(local_key).is_some()
    }

    fn strip_prefix<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?.strip_prefix('_')
    }

    fn local_key(&self, key: &str) -> String {
        let key = normalize_key(key);
        match self.strip_prefix(&key) {
            Some(local) => local.to_owned(),
            None => key,
        }
    }
}
