use std::fmt::{Display, Formatter};

use crate::block::Block;
use crate::config::Config;
use crate::model::Entry;
use crate::row::{Row, normalize_key};

/// A top-level document item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Row(Row),
    Block(Block),
}

impl Item {
    /// Sort and lookup key: the full key of a row, the prefix of a block.
    pub fn key(&self) -> &str {
        match self {
            Self::Row(row) => row.key(),
            Self::Block(block) => block.prefix(),
        }
    }

    pub fn lines(&self, config: &Config) -> Vec<String> {
        match self {
            Self::Row(row) => row.lines(None, config),
            Self::Block(block) => block.lines(config),
        }
    }

    pub fn marshal(&self, config: &Config) -> String {
        self.lines(config).join("\n")
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Self::Row(row) => Some(row),
            Self::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(block) => Some(block),
            Self::Row(_) => None,
        }
    }
}

impl From<Row> for Item {
    fn from(value: Row) -> Self {
        Self::Row(value)
    }
}

impl From<Block> for Item {
    fn from(value: Block) -> Self {
        Self::Block(value)
    }
}

/// An ordered sequence of loose rows and blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub(crate) items: Vec<Item>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of top-level items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stable sort of the top-level items by key.
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| a.key().cmp(b.key()));
    }

    /// Number of `(blocks, loose rows)`.
    pub fn counts(&self) -> (usize, usize) {
        self.items
            .iter()
            .fold((0, 0), |(blocks, rows), item| match item {
                Item::Block(_) => (blocks + 1, rows),
                Item::Row(_) => (blocks, rows + 1),
            })
    }

    pub fn blocks_count(&self) -> usize {
        self.counts().0
    }

    pub fn rows_count(&self) -> usize {
        self.counts().1
    }

    /// Total number of rows, block members included.
    pub fn count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                Item::Block(block) => block.len(),
                Item::Row(_) => 1,
            })
            .sum()
    }

    pub fn get_block(&self, prefix: &str) -> Option<&Block> {
        let prefix = normalize_key(prefix);
        self.items.iter().find_map(|item| match item {
            Item::Block(block) if block.prefix() == prefix => Some(block),
            _ => None,
        })
    }

    pub fn get_block_mut(&mut self, prefix: &str) -> Option<&mut Block> {
        let prefix = normalize_key(prefix);
        self.items.iter_mut().find_map(|item| match item {
            Item::Block(block) if block.prefix() == prefix => Some(block),
            _ => None,
        })
    }

    /// Look up a row by full key, resolving `PREFIX_KEY` through a block when
    /// one with that prefix exists.
    pub fn get(&self, key: &str) -> Option<&Row> {
        let key = normalize_key(key);
        if let Some((prefix, local)) = split_prefix(&key)
            && let Some(block) = self.get_block(prefix)
        {
            return block.get_row(local);
        }

        self.loose_position(&key).and_then(|index| self.items[index].as_row())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Row> {
        let key = normalize_key(key);
        if let Some((prefix, local)) = split_prefix(&key)
            && self.get_block(prefix).is_some()
        {
            return self
                .get_block_mut(prefix)
                .and_then(|block| block.get_row_mut(local));
        }

        let index = self.loose_position(&key)?;
        match &mut self.items[index] {
            Item::Row(row) => Some(row),
            Item::Block(_) => None,
        }
    }

    /// Loose rows whose key starts with `PREFIX_`.
    pub fn rows_by_prefix(&self, prefix: &str) -> Vec<&Row> {
        let prefix = format!("{}_", normalize_key(prefix));
        self.items
            .iter()
            .filter_map(Item::as_row)
            .filter(|row| row.key().starts_with(&prefix))
            .collect()
    }

    pub fn remove_item_at(&mut self, index: usize) -> Option<Item> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Remove a block and all of its rows.
    pub fn remove_block(&mut self, prefix: &str) -> Option<Block> {
        let prefix = normalize_key(prefix);
        let index = self
            .items
            .iter()
            .position(|item| matches!(item, Item::Block(block) if block.prefix() == prefix))?;
        match self.items.remove(index) {
            Item::Block(block) => Some(block),
            Item::Row(_) => None,
        }
    }

    /// Remove a row by full key.
    ///
    /// Removing the last member of a block leaves the (empty) block in place;
    /// use [`Document::remove_block`] to drop it.
    pub fn remove_row(&mut self, key: &str) -> Option<Row> {
        let key = normalize_key(key);
        if let Some((prefix, local)) = split_prefix(&key)
            && let Some(block) = self.get_block_mut(prefix)
        {
            return block.remove_row(local);
        }

        self.remove_loose_row(&key)
    }

    /// Live rows resolved to their full keys, in document order.
    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = Vec::with_capacity(self.count());
        for item in &self.items {
            match item {
                Item::Row(row) => push_entry(&mut entries, row, None),
                Item::Block(block) => {
                    for row in block.rows() {
                        push_entry(&mut entries, row, Some(block.prefix()));
                    }
                }
            }
        }
        entries
    }

    /// Output lines of every item, without separators.
    pub fn lines(&self, config: &Config) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|item| item.lines(config))
            .collect()
    }

    /// Full text, items separated by the configured number of blank lines.
    pub fn marshal(&self, config: &Config) -> String {
        let separator = "\n".repeat(config.blank_line_count() + 1);
        self.items
            .iter()
            .map(|item| item.marshal(config))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(&separator)
    }

    pub(crate) fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub(crate) fn loose_position(&self, full_key: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| matches!(item, Item::Row(row) if row.key() == full_key))
    }

    pub(crate) fn remove_loose_row(&mut self, full_key: &str) -> Option<Row> {
        let index = self.loose_position(full_key)?;
        match self.items.remove(index) {
            Item::Row(row) => Some(row),
            Item::Block(_) => None,
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.marshal(&Config::default()))
    }
}

impl FromIterator<Item> for Document {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

fn push_entry(entries: &mut Vec<Entry>, row: &Row, prefix: Option<&str>) {
    if row.is_commented() {
        return;
    }
    entries.push(Entry {
        key: row.full_key(prefix),
        value: row.value().to_owned(),
    });
}

/// Split a full key on its first underscore into `(prefix, local key)`.
///
/// A key starting with `_` has no prefix.
pub(crate) fn split_prefix(key: &str) -> Option<(&str, &str)> {
    key.split_once('_').filter(|(prefix, _)| !prefix.is_empty())
}
