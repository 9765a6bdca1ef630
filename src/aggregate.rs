//! The aggregation pass: collapse wildcard-matched entries into nested
//! subtrees and rewrite every claimed key to its mapping's `to` template.
//!
//! For a complex mapping, each matching entry yields its wildcard captures
//! and the child suffix beyond the mapping key. The entry's value is folded
//! into a subtree rooted at the unconsumed captures plus the child suffix,
//! stored under the `to` template with captures substituted in order.
//! `List(Complex)` differs only in grouping: the first capture becomes a
//! final key segment, so each group is its own entry. Matched originals are
//! deleted.
//!
//! Non-complex mappings just rekey the entries they claimed to their
//! substituted `to` paths. After this pass, every claimed key is concrete.

use tracing::debug;

use crate::datatype::Datatype;
use crate::error::ConftreeError;
use crate::key::KeyPath;
use crate::schema::{Mapping, Schema};
use crate::table::{EntryValue, Table};

pub(crate) fn aggregate(schema: &Schema, table: &mut Table) -> Result<(), ConftreeError> {
    for (index, mapping) in schema.processing_order() {
        match mapping.datatype() {
            Datatype::Complex => aggregate_complex(mapping, index, table, false),
            Datatype::List(inner) if matches!(**inner, Datatype::Complex) => {
                aggregate_complex(mapping, index, table, true)
            }
            _ => rekey(mapping, index, table),
        }
    }
    Ok(())
}

fn aggregate_complex(mapping: &Mapping, index: usize, table: &mut Table, as_list: bool) {
    // Snapshot first: inserting grouped subtrees must not feed back into
    // the match set.
    let matches: Vec<(KeyPath, Vec<String>, Vec<String>)> = table
        .entries()
        .iter()
        .filter_map(|entry| {
            if entry.is_raw() {
                return None;
            }
            mapping
                .key()
                .match_prefix(&entry.key)
                .map(|(captures, child)| (entry.key.clone(), captures, child))
        })
        .collect();

    for (original, captures, child) in matches {
        let Some(entry) = table.remove(&original) else {
            continue;
        };
        let EntryValue::Typed(value) = entry.value else {
            continue;
        };
        let (to_key, used) = mapping.to().substitute(&captures);
        let mut path: Vec<String> = captures[used..].to_vec();
        path.extend(child);
        if as_list {
            if path.is_empty() {
                debug!(key = %original, "no grouping segment for complex list; dropping");
                continue;
            }
            let group = path.remove(0);
            table.merge_tree_at(to_key.child(group), &path, value, index);
        } else {
            table.merge_tree_at(to_key, &path, value, index);
        }
    }
}

fn rekey(mapping: &Mapping, index: usize, table: &mut Table) {
    if mapping.key() == mapping.to() {
        return;
    }
    let claimed: Vec<KeyPath> = table
        .entries()
        .iter()
        .filter(|e| e.claimed_by == Some(index))
        .map(|e| e.key.clone())
        .collect();
    for key in claimed {
        let Some(captures) = mapping.key().captures(&key) else {
            continue;
        };
        let (new_key, _) = mapping.to().substitute(&captures);
        if new_key == key {
            continue;
        }
        if let Some(entry) = table.remove(&key) {
            table.put(new_key, entry.value, entry.claimed_by);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::coerce;
    use crate::key::KeyPath;
    use crate::parse::RawValue;
    use crate::schema::{MappingDef, Schema};
    use crate::value::{TermTree, TermValue};

    fn kp(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    fn run(schema: &Schema, pairs: &[(&str, &str)]) -> Table {
        let mut table = Table::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (kp(k), RawValue::Scalar(v.to_string())))
                .collect(),
        );
        coerce(schema, &mut table).unwrap();
        aggregate(schema, &mut table).unwrap();
        table
    }

    fn tree_at<'a>(table: &'a Table, key: &str) -> &'a TermTree {
        match table.get(&kp(key)).and_then(|e| e.typed()) {
            Some(TermValue::Tree(tree)) => tree,
            other => panic!("expected tree at {key}, got {other:?}"),
        }
    }

    #[test]
    fn complex_default_to_keeps_concrete_child_paths() {
        // With `to` defaulting to the key, every capture substitutes back
        // into its own position; grouping happens at tree build instead.
        let schema = Schema::new(
            vec![MappingDef::new("listener.http.*").datatype(Datatype::Complex)],
            vec![],
        )
        .unwrap();
        let table = run(
            &schema,
            &[
                ("listener.http.internal", "127.0.0.1:8098"),
                ("listener.http.external", "0.0.0.0:8098"),
            ],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(&kp("listener.http.internal")).unwrap().typed(),
            Some(&TermValue::String("127.0.0.1:8098".into()))
        );
    }

    #[test]
    fn complex_with_explicit_to_lands_there() {
        let schema = Schema::new(
            vec![MappingDef::new("listener.http.*")
                .to("listener.http")
                .datatype(Datatype::Complex)],
            vec![],
        )
        .unwrap();
        let table = run(&schema, &[("listener.http.internal", "127.0.0.1:8098")]);
        let tree = tree_at(&table, "listener.http");
        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.get("internal"),
            Some(&TermValue::String("127.0.0.1:8098".into()))
        );
    }

    #[test]
    fn complex_collects_deep_children_by_capture() {
        let schema = Schema::new(
            vec![MappingDef::new("multi_backend.*")
                .to("multi_backend")
                .datatype(Datatype::Complex)],
            vec![],
        )
        .unwrap();
        let table = run(
            &schema,
            &[
                ("multi_backend.first.storage", "bitcask"),
                ("multi_backend.first.ttl", "3600"),
                ("multi_backend.second.storage", "leveldb"),
            ],
        );
        let tree = tree_at(&table, "multi_backend");
        let first = match tree.get("first") {
            Some(TermValue::Tree(t)) => t,
            other => panic!("expected subtree, got {other:?}"),
        };
        assert_eq!(first.get("storage"), Some(&TermValue::String("bitcask".into())));
        assert_eq!(first.get("ttl"), Some(&TermValue::String("3600".into())));
        assert!(tree.get("second").is_some());
    }

    #[test]
    fn complex_list_splits_groups_into_entries() {
        let schema = Schema::new(
            vec![MappingDef::new("pool.*")
                .to("pool")
                .datatype(Datatype::List(Box::new(Datatype::Complex)))],
            vec![],
        )
        .unwrap();
        let table = run(
            &schema,
            &[("pool.a.size", "8"), ("pool.b.size", "16")],
        );
        assert_eq!(table.len(), 2);
        let a = tree_at(&table, "pool.a");
        assert_eq!(a.get("size"), Some(&TermValue::String("8".into())));
        let b = tree_at(&table, "pool.b");
        assert_eq!(b.get("size"), Some(&TermValue::String("16".into())));
    }

    #[test]
    fn typed_children_keep_their_datatype() {
        let schema = Schema::new(
            vec![
                MappingDef::new("listener.*.port").datatype(Datatype::Integer),
                MappingDef::new("listener.*")
                    .to("listeners")
                    .datatype(Datatype::Complex),
            ],
            vec![],
        )
        .unwrap();
        let table = run(&schema, &[("listener.http.port", "8098")]);
        let tree = tree_at(&table, "listeners");
        let http = match tree.get("http") {
            Some(TermValue::Tree(t)) => t,
            other => panic!("expected subtree, got {other:?}"),
        };
        assert_eq!(http.get("port"), Some(&TermValue::Int(8098)));
    }

    #[test]
    fn wildcard_captures_substitute_into_to_in_order() {
        let schema = Schema::new(
            vec![MappingDef::new("a.*.c.*")
                .to("out.*.*")
                .datatype(Datatype::Atom)],
            vec![],
        )
        .unwrap();
        let table = run(&schema, &[("a.x.c.y", "v")]);
        assert_eq!(
            table.get(&kp("out.x.y")).unwrap().typed(),
            Some(&TermValue::Atom("v".into()))
        );
    }

    #[test]
    fn simple_rekey_moves_entry_to_to_path() {
        let schema = Schema::new(
            vec![MappingDef::new("ring_size")
                .to("riak_core.ring_creation_size")
                .datatype(Datatype::Integer)],
            vec![],
        )
        .unwrap();
        let table = run(&schema, &[("ring_size", "64")]);
        assert!(table.get(&kp("ring_size")).is_none());
        assert_eq!(
            table.get(&kp("riak_core.ring_creation_size")).unwrap().typed(),
            Some(&TermValue::Int(64))
        );
    }

    #[test]
    fn unclaimed_raw_entries_survive_aggregation() {
        let schema = Schema::new(
            vec![MappingDef::new("known").datatype(Datatype::Integer)],
            vec![],
        )
        .unwrap();
        let table = run(&schema, &[("known", "1"), ("stray.key", "x")]);
        assert!(table.get(&kp("stray.key")).unwrap().is_raw());
    }
}
