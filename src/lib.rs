//! Schema-driven translation between flat `.conf` files and nested
//! configuration term trees.
//!
//! A `.conf` file is the friendly, sysctl-style surface an operator edits:
//!
//! ```text
//! node.name = riak@127.0.0.1
//! storage.backend = bitcask
//! listener.http.internal = 127.0.0.1:8098
//! ```
//!
//! The host runtime wants none of that; it wants a nested tree of typed
//! terms. Conftree bridges the two, driven by a declarative schema that
//! says which keys exist, what type each one has, what its default is, and
//! what its documentation says.
//!
//! ```
//! use conftree::{translate, Datatype, MappingDef, Schema, TermTree, TermValue};
//!
//! let schema = Schema::new(
//!     vec![
//!         MappingDef::new("node.name").doc(&["Name of the node."]),
//!         MappingDef::new("ring.size")
//!             .datatype(Datatype::Integer)
//!             .default(TermValue::Int(64)),
//!     ],
//!     vec![],
//! )?;
//!
//! let tree = translate(&schema, "node.name = riak@127.0.0.1\n", &TermTree::new())?;
//! assert_eq!(
//!     tree.get_path(&["node", "name"]),
//!     Some(&TermValue::String("riak@127.0.0.1".into()))
//! );
//! assert_eq!(tree.get_path(&["ring", "size"]), Some(&TermValue::Int(64)));
//! # Ok::<(), conftree::ConftreeError>(())
//! ```
//!
//! # Design: schema as source of truth
//!
//! The schema's mappings define everything: which `.conf` keys are valid,
//! how their strings coerce into typed values, where each value lands in
//! the output tree (`to` templates, wildcards included), and what the
//! generated default `.conf` looks like. Add a mapping and the parser,
//! coercion, tree building, and template generation all pick it up.
//!
//! # The pipeline
//!
//! Translation is a straight, synchronous data pipeline:
//!
//! ```text
//! .conf text
//!    ↓ parse        flat (key, raw value) pairs, input order preserved
//!    ↓ coerce       typed values via each mapping's datatype; defaults fill
//!    ↓ aggregate    wildcard matches collapse into subtrees; keys rewritten
//!    ↓ translate    user functions post-process values, in schema order
//!    ↓ build/merge  nested tree, deep-merged over a baseline tree
//! ```
//!
//! Every stage is ordering-sensitive and the orderings are guaranteed:
//! parsing preserves input order, mappings process most-specific-first,
//! translations run in declaration order, and the tree builds parents
//! before children.
//!
//! # Wildcards and aggregation
//!
//! A schema key like `listener.http.*` matches any number of concrete
//! settings (`listener.http.internal`, `listener.http.external`, ...).
//! With the `Complex` datatype, the matched children are gathered into one
//! subtree keyed by what the wildcard captured; that is how flat dotted
//! keys grow back into hierarchies. Specificity is resolved the obvious
//! way: `a.b.c` beats `a.*.c`.
//!
//! # Translations
//!
//! A translation pairs a mapping key with a function that rewrites the
//! typed value — mapping `info` to a syslog level, say. Functions come in
//! exactly two arities: [`TranslationDef::two`] maps one leaf value, and
//! [`TranslationDef::three`] also sees the value accumulated so far at the
//! target key, for fold-style translations over wildcard matches.
//!
//! # Custom datatypes
//!
//! A mapping may name an external datatype with `Datatype::Custom`. The
//! handler implements [`CustomType`] (parse, format, and optional extra
//! docs) and registers on the schema with [`Schema::with_custom`]. An
//! unregistered module degrades to plain `Binary` handling.
//!
//! # The reverse direction
//!
//! [`write_conf`] renders a schema into an annotated default `.conf`: doc
//! comments, allowed enum values, and either `key = default` or a
//! commented-out `# key =` for settings with no default. The generated
//! file can never drift from the schema because it is derived from it.
//!
//! # Errors
//!
//! All fallible operations return [`ConftreeError`]. Errors are designed
//! to be user-facing: parse errors carry the 1-indexed line number,
//! coercion errors carry the offending setting's dotted key and datatype,
//! and translation errors carry the schema key and the function's own
//! message. A failed translate call never mutates the caller's baseline.

pub mod error;

mod aggregate;
mod coerce;
mod datatype;
mod engine;
mod key;
mod merge;
mod parse;
mod schema;
mod table;
mod translate;
mod value;
mod writer;

#[cfg(test)]
mod fixtures;

pub use datatype::{CustomRegistry, CustomType, Datatype};
pub use engine::translate;
pub use error::ConftreeError;
pub use key::{KeyPath, Segment};
pub use merge::deep_merge;
pub use parse::{parse, RawValue};
pub use schema::{Mapping, MappingDef, Schema, Translation, TranslationDef, TranslationFn};
pub use value::{TermTree, TermValue};
pub use writer::write_conf;
