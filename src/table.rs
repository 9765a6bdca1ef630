//! The working table: the engine's in-flight set of keyed entries.
//!
//! Entries start raw (straight from the parser), become typed as mappings
//! claim them, and carry the index of the claiming mapping so later passes
//! know who owns what. Keys are unique — inserting an existing key replaces
//! the entry in place — and entry order is preserved otherwise. The table
//! lives for exactly one translate call.

use crate::key::KeyPath;
use crate::parse::RawValue;
use crate::value::{TermTree, TermValue};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EntryValue {
    Raw(RawValue),
    Typed(TermValue),
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub key: KeyPath,
    pub value: EntryValue,
    pub claimed_by: Option<usize>,
}

impl Entry {
    pub fn is_raw(&self) -> bool {
        matches!(self.value, EntryValue::Raw(_))
    }

    pub fn typed(&self) -> Option<&TermValue> {
        match &self.value {
            EntryValue::Typed(v) => Some(v),
            EntryValue::Raw(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Table {
    entries: Vec<Entry>,
}

impl Table {
    /// Seed the table from parser output. Duplicate keys keep the last
    /// occurrence, at the position of the first.
    pub fn from_pairs(pairs: Vec<(KeyPath, RawValue)>) -> Self {
        let mut table = Table::default();
        for (key, raw) in pairs {
            table.put(key, EntryValue::Raw(raw), None);
        }
        table
    }

    fn position(&self, key: &KeyPath) -> Option<usize> {
        self.entries.iter().position(|e| &e.key == key)
    }

    pub fn put(&mut self, key: KeyPath, value: EntryValue, claimed_by: Option<usize>) {
        match self.position(&key) {
            Some(i) => {
                self.entries[i].value = value;
                self.entries[i].claimed_by = claimed_by;
            }
            None => self.entries.push(Entry {
                key,
                value,
                claimed_by,
            }),
        }
    }

    pub fn insert_typed(&mut self, key: KeyPath, value: TermValue, claimed_by: usize) {
        self.put(key, EntryValue::Typed(value), Some(claimed_by));
    }

    pub fn get(&self, key: &KeyPath) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    pub fn remove(&mut self, key: &KeyPath) -> Option<Entry> {
        self.position(key).map(|i| self.entries.remove(i))
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> + '_ {
        self.entries.iter_mut()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Fold `value` into the tree entry at `key`, nested under `path`.
    /// Creates the entry (and any missing intermediate subtree) as needed;
    /// an existing non-tree entry is replaced. With an empty `path` the
    /// value lands at the entry itself, tree values unioning right-biased.
    pub fn merge_tree_at(
        &mut self,
        key: KeyPath,
        path: &[String],
        value: TermValue,
        claimed_by: usize,
    ) {
        if path.is_empty() {
            match (self.position(&key), value) {
                (Some(i), TermValue::Tree(new)) => {
                    if let EntryValue::Typed(TermValue::Tree(old)) = &mut self.entries[i].value {
                        old.union(new);
                    } else {
                        self.entries[i].value = EntryValue::Typed(TermValue::Tree(new));
                    }
                    self.entries[i].claimed_by = Some(claimed_by);
                }
                (Some(i), new) => {
                    self.entries[i].value = EntryValue::Typed(new);
                    self.entries[i].claimed_by = Some(claimed_by);
                }
                (None, new) => self.entries.push(Entry {
                    key,
                    value: EntryValue::Typed(new),
                    claimed_by: Some(claimed_by),
                }),
            }
            return;
        }
        let i = match self.position(&key) {
            Some(i) => i,
            None => {
                self.entries.push(Entry {
                    key,
                    value: EntryValue::Typed(TermValue::Tree(TermTree::new())),
                    claimed_by: Some(claimed_by),
                });
                self.entries.len() - 1
            }
        };
        if !matches!(
            self.entries[i].value,
            EntryValue::Typed(TermValue::Tree(_))
        ) {
            self.entries[i].value = EntryValue::Typed(TermValue::Tree(TermTree::new()));
        }
        self.entries[i].claimed_by = Some(claimed_by);
        if let EntryValue::Typed(TermValue::Tree(tree)) = &mut self.entries[i].value {
            tree.set_path(path, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    fn seed(pairs: &[(&str, &str)]) -> Table {
        Table::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (kp(k), RawValue::Scalar(v.to_string())))
                .collect(),
        )
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let table = seed(&[("a.b", "1"), ("a.b", "2")]);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&kp("a.b")).unwrap().value,
            EntryValue::Raw(RawValue::Scalar("2".into()))
        );
    }

    #[test]
    fn insert_typed_replaces_raw() {
        let mut table = seed(&[("a.b", "1")]);
        table.insert_typed(kp("a.b"), TermValue::Int(1), 0);
        let entry = table.get(&kp("a.b")).unwrap();
        assert_eq!(entry.typed(), Some(&TermValue::Int(1)));
        assert_eq!(entry.claimed_by, Some(0));
    }

    #[test]
    fn remove_returns_entry() {
        let mut table = seed(&[("a", "1"), ("b", "2")]);
        let entry = table.remove(&kp("a")).unwrap();
        assert_eq!(entry.key, kp("a"));
        assert_eq!(table.len(), 1);
        assert!(table.remove(&kp("a")).is_none());
    }

    #[test]
    fn merge_tree_at_accumulates_matches() {
        let mut table = Table::default();
        table.merge_tree_at(
            kp("listener.http"),
            &["internal".into()],
            TermValue::String("127.0.0.1:8098".into()),
            0,
        );
        table.merge_tree_at(
            kp("listener.http"),
            &["external".into()],
            TermValue::String("0.0.0.0:8098".into()),
            0,
        );
        let entry = table.get(&kp("listener.http")).unwrap();
        let Some(TermValue::Tree(tree)) = entry.typed() else {
            panic!("expected a tree entry");
        };
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.get("internal"),
            Some(&TermValue::String("127.0.0.1:8098".into()))
        );
    }

    #[test]
    fn merge_tree_at_with_empty_path_unions_trees() {
        let mut table = Table::default();
        table.merge_tree_at(
            kp("a"),
            &[],
            TermValue::Tree(TermTree::from_pairs([("x", TermValue::Int(1))])),
            0,
        );
        table.merge_tree_at(
            kp("a"),
            &[],
            TermValue::Tree(TermTree::from_pairs([("y", TermValue::Int(2))])),
            0,
        );
        let Some(TermValue::Tree(tree)) = table.get(&kp("a")).unwrap().typed() else {
            panic!("expected a tree entry");
        };
        assert_eq!(tree.len(), 2);
    }
}
