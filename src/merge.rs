//! Additive and overriding merges of items into a live [`Document`].

use tracing::debug;

use crate::block::Block;
use crate::document::{Document, Item, split_prefix};
use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Fill gaps only.
    Add,
    /// Incoming values replace existing ones.
    Merge,
}

impl Document {
    /// Add an item without overwriting anything already present.
    pub fn add(&mut self, item: impl Into<Item>) {
        match item.into() {
            Item::Block(block) => self.insert_block(block, Mode::Add),
            Item::Row(row) => self.add_row(row),
        }
    }

    pub fn add_items<I>(&mut self, items: I)
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        for item in items {
            self.add(item);
        }
    }

    /// Merge every item of `other` into this document; `other` wins.
    pub fn merge(&mut self, other: Document) {
        self.merge_items(other.items);
    }

    pub fn merge_items<I>(&mut self, items: I)
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        for item in items {
            self.merge_item(item);
        }
    }

    /// Merge a single item; existing values are replaced.
    pub fn merge_item(&mut self, item: impl Into<Item>) {
        match item.into() {
            Item::Block(block) => self.insert_block(block, Mode::Merge),
            Item::Row(row) => self.merge_row(row),
        }
    }

    fn insert_block(&mut self, incoming: Block, mode: Mode) {
        if let Some(block) = self.get_block_mut(incoming.prefix()) {
            match mode {
                Mode::Add => block.add_from_block(incoming),
                Mode::Merge => block.merge_block(incoming),
            }
            return;
        }

        let loose = self.take_loose_rows(incoming.prefix());
        if loose.is_empty() {
            self.push(Item::Block(incoming));
            return;
        }

        debug!(
            prefix = incoming.prefix(),
            rows = loose.len(),
            "absorbing loose rows into incoming block"
        );
        let mut block = Block::new(incoming.prefix());
        block.add_prefixed_rows(loose);
        match mode {
            Mode::Add => block.add_from_block(incoming),
            Mode::Merge => block.merge_block(incoming),
        }
        self.push(Item::Block(block));
    }

    fn add_row(&mut self, row: Row) {
        if self.loose_position(row.key()).is_some() {
            return;
        }

        let Some(prefix) = split_prefix(row.key()).map(|(prefix, _)| prefix.to_owned()) else {
            self.push(Item::Row(row));
            return;
        };

        if let Some(block) = self.get_block_mut(&prefix) {
            block.add_prefixed_row(row);
            return;
        }

        let siblings = self.take_loose_rows(&prefix);
        if siblings.is_empty() {
            self.push(Item::Row(row));
            return;
        }

        debug!(
            prefix = %prefix,
            rows = siblings.len() + 1,
            "promoting loose rows into block"
        );
        let mut block = Block::new(&prefix);
        block.add_prefixed_rows(siblings);
        block.add_prefixed_row(row);
        self.push(Item::Block(block));
    }

    fn merge_row(&mut self, row: Row) {
        match self.get_mut(row.key()) {
            Some(existing) => existing.merge(&row),
            None => self.add_row(row),
        }
    }

    /// Detach every loose row carrying `PREFIX_`, keeping their order.
    fn take_loose_rows(&mut self, prefix: &str) -> Vec<Row> {
        let needle = format!("{prefix}_");
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            match item {
                Item::Row(row) if row.key().starts_with(&needle) => taken.push(row),
                other => kept.push(other),
            }
        }
        self.items = kept;
        taken
    }
}
