//! Building the final term tree and merging it over a baseline.
//!
//! The build walks remaining table entries shortest-key-first so parents
//! are materialised before their children. Entries still raw at this point
//! were never claimed by a mapping and are dropped.
//!
//! The merge layers the translated tree over a pre-existing baseline:
//! matching subtrees merge recursively, and in every other case (scalars,
//! char-lists, and notably list-vs-list) the new value wins.

use tracing::debug;

use crate::table::{EntryValue, Table};
use crate::value::{TermTree, TermValue};

pub(crate) fn build_tree(table: Table) -> TermTree {
    let mut entries = table.into_entries();
    entries.retain(|entry| {
        if entry.is_raw() {
            debug!(key = %entry.key, "dropping setting not claimed by any mapping");
            false
        } else {
            true
        }
    });
    // Stable sort: parents before children, input order preserved among
    // keys of equal length.
    entries.sort_by_key(|entry| entry.key.len());

    let mut tree = TermTree::new();
    for entry in entries {
        let EntryValue::Typed(value) = entry.value else {
            continue;
        };
        let segments = entry.key.literal_segments();
        if segments.is_empty() {
            continue;
        }
        tree.set_path(&segments, value);
    }
    tree
}

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a tree for the same key, recurse.
/// Otherwise, `overlay`'s value wins, including when both sides are
/// lists or char-lists.
pub fn deep_merge(mut base: TermTree, overlay: TermTree) -> TermTree {
    for (key, new) in overlay {
        match base.get_mut(&key) {
            Some(slot) => {
                let old = std::mem::replace(slot, TermValue::Bool(false));
                *slot = merge_value(old, new);
            }
            None => base.insert(key, new),
        }
    }
    base
}

fn merge_value(old: TermValue, new: TermValue) -> TermValue {
    match (old, new) {
        (TermValue::Tree(a), TermValue::Tree(b)) => TermValue::Tree(deep_merge(a, b)),
        // Scalars, char-lists, and lists alike: the new value replaces the
        // old one.
        (_, new) => new,
    }
}
