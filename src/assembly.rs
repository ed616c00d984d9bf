//! Grouping of flat parsed rows into a sorted [`Document`].

use std::collections::BTreeMap;
use std::collections::btree_map::Entry as MapEntry;

use tracing::trace;

use crate::block::Block;
use crate::config::Config;
use crate::document::{Document, Item, split_prefix};
use crate::row::Row;

/// Rows extracted from one or more sources, keyed by full key, before they
/// are grouped into blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowSet {
    rows: BTreeMap<String, Row>,
    banners: BTreeMap<String, String>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Banner comment captured directly above the row with this key.
    pub fn banner(&self, key: &str) -> Option<&str> {
        self.banners.get(key).map(String::as_str)
    }

    /// Insert or replace a row without any collision handling.
    pub fn insert(&mut self, row: Row) -> Option<Row> {
        self.rows.insert(row.key().to_owned(), row)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Row> {
        self.rows.get_mut(key)
    }

    pub(crate) fn set_banner(&mut self, key: &str, banner: String) {
        self.banners.entry(key.to_owned()).or_insert(banner);
    }

    /// Merge rows from a later source; the later source wins.
    ///
    /// A live incoming row replaces a commented-out one, a commented-out
    /// incoming row only contributes its value as a shadow of a live row,
    /// and otherwise the row-level merge applies.
    pub fn merge(&mut self, other: RowSet) {
        for (key, incoming) in other.rows {
            match self.rows.entry(key) {
                MapEntry::Vacant(slot) => {
                    slot.insert(incoming);
                }
                MapEntry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    match (existing.is_commented(), incoming.is_commented()) {
                        (true, false) => {
                            let mut replacement = incoming;
                            replacement.backfill_comment(existing.comment());
                            *existing = replacement;
                        }
                        (false, true) => {
                            existing.add_shadow(incoming.value());
                        }
                        _ => existing.merge(&incoming),
                    }
                }
            }
        }

        for (key, banner) in other.banners {
            self.banners.entry(key).or_insert(banner);
        }
    }
}

impl FromIterator<Row> for RowSet {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        let mut set = Self::new();
        for row in iter {
            set.insert(row);
        }
        set
    }
}

/// Group rows by the text before their first underscore.
///
/// A prefix shared by more than `config.threshold()` rows becomes a block
/// (member keys stripped of the prefix, rows sorted by local key); smaller
/// groups and unprefixed keys stay loose. The result is sorted by item key.
pub fn assemble(rows: RowSet, config: &Config) -> Document {
    let RowSet { rows, banners } = rows;

    let mut document = Document::new();
    let mut groups: BTreeMap<String, Vec<(String, Row)>> = BTreeMap::new();

    for (key, row) in rows {
        match split_prefix(&key) {
            Some((prefix, local)) => groups
                .entry(prefix.to_owned())
                .or_default()
                .push((local.to_owned(), row)),
            None => document.push(Item::Row(row)),
        }
    }

    for (prefix, members) in groups {
        if members.len() <= config.threshold() {
            for (_, row) in members {
                document.push(Item::Row(row));
            }
            continue;
        }

        trace!(prefix = %prefix, rows = members.len(), "grouping rows into block");
        let mut block = Block::new(&prefix);
        for (local, mut row) in members {
            if let Some(banner) = banners.get(row.key()) {
                block.backfill_comment(banner);
            }
            row.set_key(local);
            block.add_row(row);
        }
        block.sort_rows();
        document.push(Item::Block(block));
    }

    document.sort();
    document
}

impl Document {
    /// Build a document from an unordered key/value mapping.
    pub fn from_map<I, K, V>(map: I, config: &Config) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let rows = map
            .into_iter()
            .map(|(key, value)| Row::new(key.as_ref(), value))
            .collect();
        assemble(rows, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[(&str, &str)]) -> RowSet {
        pairs
            .iter()
            .map(|(key, value)| Row::new(key, *value))
            .collect()
    }

    #[test]
    fn groups_shared_prefix_into_block() {
        let set = rows(&[
            ("APP_SESSION", ".example.com"),
            ("APP_URL", "https://example.com"),
            ("APP_SECURE", "true"),
        ]);

        let doc = assemble(set, &Config::default());

        assert_eq!(doc.len(), 1);
        let block = doc.get_block("APP").expect("APP block");
        assert_eq!(block.len(), 3);
        let keys: Vec<&str> = block.rows().iter().map(Row::key).collect();
        assert_eq!(keys, ["SECURE", "SESSION", "URL"]);
    }

    #[test]
    fn unprefixed_keys_stay_loose_and_document_is_sorted() {
        let set = rows(&[
            ("Z_ALPHA", "zed"),
            ("APPLICATION", "Hello!"),
            ("APP_URL", "u"),
            ("SECURE_HTTP", "true"),
        ]);

        let doc = assemble(set, &Config::default());

        let keys: Vec<&str> = doc.items().iter().map(Item::key).collect();
        assert_eq!(keys, ["APP", "APPLICATION", "SECURE", "Z"]);
        assert_eq!(doc.counts(), (3, 1));
    }

    #[test]
    fn threshold_keeps_small_groups_loose_with_full_keys() {
        let set = rows(&[("APP_URL", "u"), ("APP_ENV", "prod"), ("DB_HOST", "h")]);

        let doc = assemble(set, &Config::default().group_threshold(1));

        let keys: Vec<&str> = doc.items().iter().map(Item::key).collect();
        assert_eq!(keys, ["APP", "DB_HOST"]);
        assert_eq!(doc.get("DB_HOST").expect("db host").value(), "h");
    }

    #[test]
    fn leading_underscore_is_not_a_prefix() {
        let set = rows(&[("_SECRET", "1"), ("HOST", "h")]);

        let doc = assemble(set, &Config::default());

        assert_eq!(doc.counts(), (0, 2));
        let keys: Vec<&str> = doc.items().iter().map(Item::key).collect();
        assert_eq!(keys, ["HOST", "_SECRET"]);
        assert_eq!(doc.get("_SECRET").expect("secret").value(), "1");
    }

    #[test]
    fn block_takes_first_member_banner() {
        let mut set = rows(&[("APP_URL", "u"), ("APP_ENV", "prod")]);
        set.set_banner("APP_URL", "Application".to_owned());

        let doc = assemble(set, &Config::default());

        assert_eq!(doc.get_block("app").expect("app").comment(), "Application");
    }

    #[test]
    fn merge_last_source_wins() {
        let mut base = rows(&[("APP_ENV", "prod"), ("APP_URL", "u")]);
        let mut local = rows(&[("APP_ENV", "local")]);
        local
            .get_mut("APP_ENV")
            .expect("env row")
            .set_comment("Environment");

        base.merge(local);

        let row = base.get("APP_ENV").expect("env row");
        assert_eq!(row.value(), "local");
        assert_eq!(row.comment(), "Environment");
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn merge_live_row_replaces_commented_row() {
        let mut base = RowSet::new();
        base.insert(Row::new("DEBUG", "false").commented().with_comment("Debug flag"));
        let mut local = RowSet::new();
        local.insert(Row::new("DEBUG", "true"));

        base.merge(local);

        let row = base.get("DEBUG").expect("debug row");
        assert!(!row.is_commented());
        assert_eq!(row.value(), "true");
        assert_eq!(row.comment(), "Debug flag");
    }

    #[test]
    fn merge_commented_row_becomes_shadow() {
        let mut base = RowSet::new();
        base.insert(Row::new("DEBUG", "true"));
        let mut local = RowSet::new();
        local.insert(Row::new("DEBUG", "false").commented());

        base.merge(local);

        let row = base.get("DEBUG").expect("debug row");
        assert_eq!(row.value(), "true");
        assert_eq!(row.shadows(), ["false"]);
    }

    #[test]
    fn from_map_groups_like_parsing() {
        let doc = Document::from_map(
            [("app-url", "u"), ("app-env", "prod"), ("debug", "true")],
            &Config::default(),
        );

        assert_eq!(doc.counts(), (1, 1));
        assert_eq!(doc.get("APP_ENV").expect("env").value(), "prod");
    }
}
