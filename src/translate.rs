//! The translation pass: run user-supplied functions over aggregated
//! entries.
//!
//! Each translation names a mapping by key. Entries matching that mapping's
//! rewritten (`to`) pattern are fed to the function one leaf at a time. An
//! arity-2 function maps a single leaf: its result is folded under the
//! entry's parent key as a `(leaf, value)` keyword entry. An arity-3
//! function folds: it also receives whatever has accumulated at the parent
//! key so far, and its return replaces that value wholesale. A
//! single-segment entry keeps its own key either way.
//!
//! Translations run in declaration order, so later ones observe the
//! effects of earlier ones.

use tracing::debug;

use crate::error::ConftreeError;
use crate::key::KeyPath;
use crate::schema::{Schema, TranslationFn};
use crate::table::{EntryValue, Table};
use crate::value::{TermTree, TermValue};

pub(crate) fn apply_translations(schema: &Schema, table: &mut Table) -> Result<(), ConftreeError> {
    for translation in schema.translations() {
        let Some((index, mapping)) = schema.mapping_for_key(translation.key()) else {
            debug!(key = %translation.key(), "translation has no mapping; skipping");
            continue;
        };
        // After aggregation the table is keyed by to-paths, so entries are
        // selected against the mapping's `to` pattern (identical to the key
        // in the default case).
        let matched: Vec<KeyPath> = table
            .entries()
            .iter()
            .filter(|e| !e.is_raw() && mapping.to().matches(&e.key))
            .map(|e| e.key.clone())
            .collect();

        for result_key in matched {
            let Some(entry) = table.remove(&result_key) else {
                continue;
            };
            let EntryValue::Typed(value) = entry.value else {
                continue;
            };
            let Some(leaf) = result_key.last_literal().map(str::to_string) else {
                continue;
            };
            let parent = result_key.parent();
            let fail = |reason: String| ConftreeError::Translation {
                key: translation.key().to_string(),
                reason,
            };
            match translation.func() {
                TranslationFn::Two(func) => {
                    let out = func(mapping, (&leaf, value)).map_err(fail)?;
                    if parent.is_empty() {
                        table.insert_typed(result_key, out, index);
                    } else {
                        let wrapped = TermValue::Tree(TermTree::from_pairs([(leaf, out)]));
                        table.merge_tree_at(parent, &[], wrapped, index);
                    }
                }
                TranslationFn::Three(func) => {
                    let accumulator: Option<TermValue> = if parent.is_empty() {
                        None
                    } else {
                        table.get(&parent).and_then(|e| e.typed().cloned())
                    };
                    let out = func(mapping, (&leaf, value), accumulator.as_ref()).map_err(fail)?;
                    if parent.is_empty() {
                        table.insert_typed(result_key, out, index);
                    } else {
                        table.insert_typed(parent.clone(), out, index);
                    }
                }
            }
        }
    }
    Ok(())
}
