//! Typed configuration values and the nested term tree they assemble into.
//!
//! [`TermValue`] is the recursive sum produced by coercion: scalars (atom,
//! string, char-list, bool, int, float), a `(host, port)` pair, lists, and
//! nested [`TermTree`]s. A term tree is an insertion-ordered list of
//! `(atom, value)` pairs — order is significant when the tree is rendered,
//! so it is a `Vec`, not a map. Inserting an existing key replaces the value
//! in place, keeping the original position.
//!
//! Both types implement [`serde::Serialize`] so hosts can ship the final
//! tree through whatever format they already use.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum TermValue {
    /// An interned-symbol-style name, rendered bare.
    Atom(String),
    /// A binary string.
    String(String),
    /// A sequence of code points, distinct from a binary string.
    CharList(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A `(host, port)` pair. Both sides are kept verbatim.
    Ip { host: String, port: String },
    List(Vec<TermValue>),
    /// A nested term tree used as a value.
    Tree(TermTree),
}

impl TermValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            TermValue::Atom(_) => "atom",
            TermValue::String(_) => "string",
            TermValue::CharList(_) => "charlist",
            TermValue::Bool(_) => "boolean",
            TermValue::Int(_) => "integer",
            TermValue::Float(_) => "float",
            TermValue::Ip { .. } => "ip",
            TermValue::List(_) => "list",
            TermValue::Tree(_) => "tree",
        }
    }
}

impl fmt::Display for TermValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermValue::Atom(a) => write!(f, "{a}"),
            TermValue::String(s) => write!(f, "\"{s}\""),
            TermValue::CharList(c) => write!(f, "'{c}'"),
            TermValue::Bool(b) => write!(f, "{b}"),
            TermValue::Int(i) => write!(f, "{i}"),
            TermValue::Float(x) => write!(f, "{x}"),
            TermValue::Ip { host, port } => write!(f, "\"{host}:{port}\""),
            TermValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            TermValue::Tree(tree) => write!(f, "{tree}"),
        }
    }
}

impl Serialize for TermValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TermValue::Atom(a) => serializer.serialize_str(a),
            TermValue::String(s) => serializer.serialize_str(s),
            TermValue::CharList(c) => serializer.serialize_str(c),
            TermValue::Bool(b) => serializer.serialize_bool(*b),
            TermValue::Int(i) => serializer.serialize_i64(*i),
            TermValue::Float(x) => serializer.serialize_f64(*x),
            TermValue::Ip { host, port } => (host.as_str(), port.as_str()).serialize(serializer),
            TermValue::List(items) => serializer.collect_seq(items),
            TermValue::Tree(tree) => tree.serialize(serializer),
        }
    }
}

/// An insertion-ordered mapping from atom to [`TermValue`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermTree {
    pairs: Vec<(String, TermValue)>,
}

impl TermTree {
    pub fn new() -> Self {
        TermTree { pairs: Vec::new() }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, TermValue)>,
        K: Into<String>,
    {
        let mut tree = TermTree::new();
        for (key, value) in pairs {
            tree.insert(key.into(), value);
        }
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, TermValue)> + '_ {
        self.pairs.iter()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.pairs.iter().position(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&TermValue> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut TermValue> {
        self.pairs
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert a pair. An existing key is replaced in place, keeping its
    /// original position; a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: TermValue) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.pairs[i].1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Navigate nested trees by a segment path.
    pub fn get_path(&self, path: &[&str]) -> Option<&TermValue> {
        let (first, rest) = path.split_first()?;
        let value = self.get(first)?;
        if rest.is_empty() {
            return Some(value);
        }
        match value {
            TermValue::Tree(sub) => sub.get_path(rest),
            _ => None,
        }
    }

    /// Set a leaf at a segment path, materialising empty subtrees for any
    /// missing intermediate. An intermediate that exists as a non-tree leaf
    /// is replaced by a tree. When both the existing leaf and the new value
    /// are trees, they union recursively, new entries winning per key.
    pub fn set_path(&mut self, path: &[String], value: TermValue) {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        let i = match self.position(first) {
            Some(i) => i,
            None => {
                self.pairs
                    .push((first.clone(), TermValue::Tree(TermTree::new())));
                self.pairs.len() - 1
            }
        };
        if rest.is_empty() {
            match (&mut self.pairs[i].1, value) {
                (TermValue::Tree(old), TermValue::Tree(new)) if !old.is_empty() => old.union(new),
                (slot, new) => *slot = new,
            }
            return;
        }
        if !matches!(self.pairs[i].1, TermValue::Tree(_)) {
            self.pairs[i].1 = TermValue::Tree(TermTree::new());
        }
        if let TermValue::Tree(sub) = &mut self.pairs[i].1 {
            sub.set_path(rest, value);
        }
    }

    /// Right-biased keyword union: entries from `other` replace same-key
    /// entries here, recursing when both sides are trees.
    pub(crate) fn union(&mut self, other: TermTree) {
        for (key, new) in other.pairs {
            match (self.position(&key), new) {
                (Some(i), TermValue::Tree(new_tree)) => {
                    if let TermValue::Tree(old) = &mut self.pairs[i].1 {
                        old.union(new_tree);
                    } else {
                        self.pairs[i].1 = TermValue::Tree(new_tree);
                    }
                }
                (Some(i), new) => self.pairs[i].1 = new,
                (None, new) => self.pairs.push((key, new)),
            }
        }
    }
}

impl IntoIterator for TermTree {
    type Item = (String, TermValue);
    type IntoIter = std::vec::IntoIter<(String, TermValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

impl FromIterator<(String, TermValue)> for TermTree {
    fn from_iter<I: IntoIterator<Item = (String, TermValue)>>(iter: I) -> Self {
        TermTree::from_pairs(iter)
    }
}

impl fmt::Display for TermTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{{{key}, {value}}}")?;
        }
        f.write_str("]")
    }
}

impl Serialize for TermTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (key, value) in &self.pairs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
