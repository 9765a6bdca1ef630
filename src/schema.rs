//! The in-memory schema: mappings, translations, and custom-type handlers.
//!
//! A schema arrives as two sequences — mapping definitions and translation
//! definitions — with dotted string keys. [`Schema::new`] normalises every
//! key into a [`KeyPath`] and rejects malformed entries (empty segments, a
//! `to` template with more wildcards than its key). Mappings keep their
//! source order, which the `.conf` writer follows; the engine processes
//! them through [`Schema::processing_order`], sorted by descending key
//! length with literal count breaking ties so that more specific paths
//! claim entries first. Translations always run in declaration order.

use std::sync::Arc;

use crate::datatype::{CustomRegistry, CustomType, Datatype};
use crate::error::ConftreeError;
use crate::key::KeyPath;
use crate::value::TermValue;

/// A schema mapping definition, before key normalisation.
///
/// Built with chained setters:
///
/// ```
/// use conftree::{Datatype, MappingDef, TermValue};
///
/// let def = MappingDef::new("ring.size")
///     .datatype(Datatype::Integer)
///     .default(TermValue::Int(64))
///     .doc(&["Number of partitions in the ring."]);
/// # let _ = def;
/// ```
#[derive(Debug, Clone)]
pub struct MappingDef {
    key: String,
    to: Option<String>,
    datatype: Datatype,
    default: Option<TermValue>,
    doc: Vec<String>,
}

impl MappingDef {
    pub fn new(key: impl Into<String>) -> Self {
        MappingDef {
            key: key.into(),
            to: None,
            datatype: Datatype::Binary,
            default: None,
            doc: Vec::new(),
        }
    }

    /// Rewrite matched keys to this dotted template. Defaults to the key
    /// itself.
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn datatype(mut self, datatype: Datatype) -> Self {
        self.datatype = datatype;
        self
    }

    pub fn default(mut self, value: TermValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn doc(mut self, lines: &[&str]) -> Self {
        self.doc = lines.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// A normalised schema mapping.
#[derive(Debug, Clone)]
pub struct Mapping {
    key: KeyPath,
    to: KeyPath,
    datatype: Datatype,
    default: Option<TermValue>,
    doc: Vec<String>,
}

impl Mapping {
    pub fn key(&self) -> &KeyPath {
        &self.key
    }

    pub fn to(&self) -> &KeyPath {
        &self.to
    }

    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    pub fn default(&self) -> Option<&TermValue> {
        self.default.as_ref()
    }

    pub fn doc(&self) -> &[String] {
        &self.doc
    }
}

/// A user-supplied translation function.
///
/// The two variants are the two supported arities; anything else is
/// unrepresentable. `Two` maps one leaf value; `Three` additionally
/// receives the value already accumulated at the target key.
pub enum TranslationFn {
    #[allow(clippy::type_complexity)]
    Two(Box<dyn Fn(&Mapping, (&str, TermValue)) -> Result<TermValue, String> + Send + Sync>),
    #[allow(clippy::type_complexity)]
    Three(
        Box<
            dyn Fn(&Mapping, (&str, TermValue), Option<&TermValue>) -> Result<TermValue, String>
                + Send
                + Sync,
        >,
    ),
}

impl std::fmt::Debug for TranslationFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationFn::Two(_) => f.write_str("TranslationFn::Two(..)"),
            TranslationFn::Three(_) => f.write_str("TranslationFn::Three(..)"),
        }
    }
}

/// A translation definition, before key normalisation.
pub struct TranslationDef {
    key: String,
    func: TranslationFn,
}

impl TranslationDef {
    pub fn two<F>(key: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Mapping, (&str, TermValue)) -> Result<TermValue, String> + Send + Sync + 'static,
    {
        TranslationDef {
            key: key.into(),
            func: TranslationFn::Two(Box::new(func)),
        }
    }

    pub fn three<F>(key: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Mapping, (&str, TermValue), Option<&TermValue>) -> Result<TermValue, String>
            + Send
            + Sync
            + 'static,
    {
        TranslationDef {
            key: key.into(),
            func: TranslationFn::Three(Box::new(func)),
        }
    }
}

/// A normalised translation.
#[derive(Debug)]
pub struct Translation {
    key: KeyPath,
    func: TranslationFn,
}

impl Translation {
    pub fn key(&self) -> &KeyPath {
        &self.key
    }

    pub(crate) fn func(&self) -> &TranslationFn {
        &self.func
    }
}

/// The immutable schema consumed by the translation engine.
#[derive(Debug)]
pub struct Schema {
    mappings: Vec<Mapping>,
    order: Vec<usize>,
    translations: Vec<Translation>,
    customs: CustomRegistry,
}

impl Schema {
    pub fn new(
        mappings: Vec<MappingDef>,
        translations: Vec<TranslationDef>,
    ) -> Result<Self, ConftreeError> {
        let mut built = Vec::with_capacity(mappings.len());
        for def in mappings {
            let key = KeyPath::parse(&def.key)?;
            let to = match def.to {
                Some(t) => KeyPath::parse(&t)?,
                None => key.clone(),
            };
            if to.wildcard_count() > key.wildcard_count() {
                return Err(ConftreeError::SchemaShape(format!(
                    "mapping '{key}': 'to' template '{to}' has more wildcards than the key"
                )));
            }
            built.push(Mapping {
                key,
                to,
                datatype: def.datatype,
                default: def.default,
                doc: def.doc,
            });
        }

        let mut order: Vec<usize> = (0..built.len()).collect();
        order.sort_by(|&a, &b| {
            let (ka, kb) = (&built[a].key, &built[b].key);
            kb.len()
                .cmp(&ka.len())
                .then(kb.literal_count().cmp(&ka.literal_count()))
                .then(a.cmp(&b))
        });

        let mut normalised = Vec::with_capacity(translations.len());
        for def in translations {
            normalised.push(Translation {
                key: KeyPath::parse(&def.key)?,
                func: def.func,
            });
        }

        Ok(Schema {
            mappings: built,
            order,
            translations: normalised,
            customs: CustomRegistry::default(),
        })
    }

    /// Register a custom datatype handler under a module name.
    pub fn with_custom(mut self, module: impl Into<String>, handler: Arc<dyn CustomType>) -> Self {
        self.customs.register(module, handler);
        self
    }

    /// Mappings in source order.
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Translations in declaration order.
    pub fn translations(&self) -> &[Translation] {
        &self.translations
    }

    pub fn customs(&self) -> &CustomRegistry {
        &self.customs
    }

    /// Mappings in processing order: descending key length, more literals
    /// first among equals, source order as the final tie-break.
    pub(crate) fn processing_order(&self) -> impl Iterator<Item = (usize, &Mapping)> + '_ {
        self.order.iter().map(move |&i| (i, &self.mappings[i]))
    }

    /// The mapping whose key equals `key`, if any.
    pub(crate) fn mapping_for_key(&self, key: &KeyPath) -> Option<(usize, &Mapping)> {
        self.mappings
            .iter()
            .enumerate()
            .find(|(_, m)| &m.key == key)
    }

    /// Doc lines for a mapping, looked up by dotted key.
    pub fn doc_for(&self, key: &str) -> Option<&[String]> {
        self.mappings
            .iter()
            .find(|m| m.key.to_string() == key)
            .map(|m| m.doc.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_keys_and_defaults_to() {
        let schema = Schema::new(vec![MappingDef::new("a.b")], vec![]).unwrap();
        let m = &schema.mappings()[0];
        assert_eq!(m.key().to_string(), "a.b");
        assert_eq!(m.to(), m.key());
        assert_eq!(m.datatype(), &Datatype::Binary);
    }

    #[test]
    fn explicit_to_is_kept() {
        let schema = Schema::new(vec![MappingDef::new("a.b").to("x.y.z")], vec![]).unwrap();
        assert_eq!(schema.mappings()[0].to().to_string(), "x.y.z");
    }

    #[test]
    fn empty_segment_is_shape_error() {
        let err = Schema::new(vec![MappingDef::new("a..b")], vec![]).unwrap_err();
        assert!(matches!(err, ConftreeError::SchemaShape(_)));
    }

    #[test]
    fn to_with_extra_wildcards_rejected() {
        let err = Schema::new(vec![MappingDef::new("a.b").to("x.*")], vec![]).unwrap_err();
        assert!(matches!(err, ConftreeError::SchemaShape(_)));
    }

    #[test]
    fn processing_order_puts_longer_keys_first() {
        let schema = Schema::new(
            vec![
                MappingDef::new("a"),
                MappingDef::new("a.b.c"),
                MappingDef::new("a.b"),
            ],
            vec![],
        )
        .unwrap();
        let keys: Vec<String> = schema
            .processing_order()
            .map(|(_, m)| m.key().to_string())
            .collect();
        assert_eq!(keys, vec!["a.b.c", "a.b", "a"]);
    }

    #[test]
    fn literal_count_breaks_length_ties() {
        let schema = Schema::new(
            vec![MappingDef::new("a.*.c"), MappingDef::new("a.b.c")],
            vec![],
        )
        .unwrap();
        let keys: Vec<String> = schema
            .processing_order()
            .map(|(_, m)| m.key().to_string())
            .collect();
        assert_eq!(keys, vec!["a.b.c", "a.*.c"]);
    }

    #[test]
    fn doc_for_finds_mapping_docs() {
        let schema = Schema::new(
            vec![MappingDef::new("ring.size").doc(&["Ring partitions.", "Power of two."])],
            vec![],
        )
        .unwrap();
        assert_eq!(
            schema.doc_for("ring.size").unwrap(),
            &["Ring partitions.".to_string(), "Power of two.".to_string()]
        );
        assert!(schema.doc_for("missing").is_none());
    }

    #[test]
    fn translations_keep_declaration_order() {
        let schema = Schema::new(
            vec![],
            vec![
                TranslationDef::two("b", |_, (_, v)| Ok(v)),
                TranslationDef::two("a", |_, (_, v)| Ok(v)),
            ],
        )
        .unwrap();
        let keys: Vec<String> = schema
            .translations()
            .iter()
            .map(|t| t.key().to_string())
            .collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
