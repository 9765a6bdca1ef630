//! The datatype algebra: how raw `.conf` values become typed values and how
//! typed values render back into `.conf` text.
//!
//! Every datatype supports two operations: [`Datatype::parse`] turns a
//! [`RawValue`] into a [`TermValue`], and [`Datatype::format`] produces the
//! canonical `.conf` right-hand side for a value. `Complex` is the
//! aggregation marker — it is never parsed or formatted; the aggregation
//! pass builds its values.
//!
//! Custom datatypes plug in through the [`CustomType`] capability trait,
//! registered on the schema by module name. A `Custom` datatype whose module
//! has no registered handler behaves as `Binary`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConftreeError;
use crate::parse::RawValue;
use crate::value::{TermTree, TermValue};

/// A value datatype declared by a schema mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Datatype {
    Atom,
    Binary,
    CharList,
    Boolean,
    Integer,
    Float,
    /// A `host:port` pair, split on the last `:`.
    Ip,
    /// An atom restricted to a fixed set of allowed values.
    Enum(Vec<String>),
    /// A comma-separated list of the inner datatype.
    List(Box<Datatype>),
    /// A list of lists. Format-only.
    NestedList(Box<Datatype>),
    /// An atom key paired with an inner-typed value, written `key = value`.
    PairedAtom(Box<Datatype>),
    /// Aggregation marker: values are assembled from wildcard-matched
    /// children, not parsed.
    Complex,
    /// An externally-provided datatype, resolved through [`CustomRegistry`].
    Custom { module: String, args: Vec<String> },
}

impl Default for Datatype {
    fn default() -> Self {
        Datatype::Binary
    }
}

/// The capability set a custom datatype module must provide.
pub trait CustomType: Send + Sync {
    fn parse(&self, args: &[String], raw: &RawValue) -> Result<TermValue, String>;
    fn format(&self, args: &[String], value: &TermValue) -> Result<String, String>;
    /// Extra documentation lines for the generated `.conf`, if any.
    fn to_doc(&self, args: &[String]) -> Option<String>;
}

/// Custom datatype handlers, keyed by module name.
#[derive(Default, Clone)]
pub struct CustomRegistry {
    handlers: HashMap<String, Arc<dyn CustomType>>,
}

impl std::fmt::Debug for CustomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CustomRegistry {
    pub fn register(&mut self, module: impl Into<String>, handler: Arc<dyn CustomType>) {
        self.handlers.insert(module.into(), handler);
    }

    pub fn get(&self, module: &str) -> Option<&Arc<dyn CustomType>> {
        self.handlers.get(module)
    }
}

/// The shape a raw value takes when nothing more specific is asked of it:
/// scalars become strings, lists become string lists, bracketed pairs
/// become a one-level tree.
pub(crate) fn binary_shape(raw: &RawValue) -> TermValue {
    match raw {
        RawValue::Scalar(s) => TermValue::String(s.clone()),
        RawValue::List(items) => {
            TermValue::List(items.iter().map(|s| TermValue::String(s.clone())).collect())
        }
        RawValue::Pairs(pairs) => TermValue::Tree(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), TermValue::String(v.clone())))
                .collect(),
        ),
    }
}

impl Datatype {
    pub(crate) fn is_complex(&self) -> bool {
        match self {
            Datatype::Complex => true,
            Datatype::List(inner) => matches!(**inner, Datatype::Complex),
            _ => false,
        }
    }

    /// Coerce a raw value. `setting` is the dotted key of the originating
    /// `.conf` entry, used in error messages.
    pub fn parse(
        &self,
        raw: &RawValue,
        setting: &str,
        customs: &CustomRegistry,
    ) -> Result<TermValue, ConftreeError> {
        match self {
            Datatype::Atom => Ok(TermValue::Atom(self.scalar(raw, setting)?.to_string())),
            Datatype::Binary => Ok(TermValue::String(self.scalar(raw, setting)?.to_string())),
            Datatype::CharList => Ok(TermValue::CharList(self.scalar(raw, setting)?.to_string())),
            Datatype::Boolean => match self.scalar(raw, setting)? {
                "true" => Ok(TermValue::Bool(true)),
                "false" => Ok(TermValue::Bool(false)),
                other => Err(self.coerce_err(setting, format!("'{other}' is not true or false"))),
            },
            Datatype::Integer => {
                let s = self.scalar(raw, setting)?;
                s.parse::<i64>()
                    .map(TermValue::Int)
                    .map_err(|e| self.coerce_err(setting, e.to_string()))
            }
            Datatype::Float => {
                let s = self.scalar(raw, setting)?;
                s.parse::<f64>()
                    .map(TermValue::Float)
                    .map_err(|e| self.coerce_err(setting, e.to_string()))
            }
            Datatype::Ip => {
                let s = self.scalar(raw, setting)?;
                match s.rsplit_once(':') {
                    Some((host, port)) => Ok(TermValue::Ip {
                        host: host.to_string(),
                        port: port.to_string(),
                    }),
                    None => Err(self.coerce_err(setting, format!("'{s}' has no ':' separator"))),
                }
            }
            Datatype::Enum(allowed) => {
                let s = self.scalar(raw, setting)?;
                if allowed.iter().any(|a| a == s) {
                    Ok(TermValue::Atom(s.to_string()))
                } else {
                    Err(self.coerce_err(
                        setting,
                        format!("'{}' is not one of: {}", s, allowed.join(", ")),
                    ))
                }
            }
            Datatype::List(inner) => {
                let items: Vec<String> = match raw {
                    RawValue::Scalar(s) => {
                        s.split(',').map(|part| part.trim().to_string()).collect()
                    }
                    RawValue::List(items) => items.clone(),
                    RawValue::Pairs(_) => {
                        return Err(
                            self.coerce_err(setting, "bracketed list is not a value list".into())
                        );
                    }
                };
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(inner.parse(&RawValue::Scalar(item), setting, customs)?);
                }
                Ok(TermValue::List(out))
            }
            Datatype::NestedList(_) => Err(self.coerce_err(
                setting,
                "nested lists can be written but not read from .conf".into(),
            )),
            Datatype::PairedAtom(inner) => {
                let (name, value) = match raw {
                    RawValue::Scalar(s) => match s.split_once('=') {
                        Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
                        None => {
                            return Err(
                                self.coerce_err(setting, format!("'{s}' is not 'key = value'"))
                            );
                        }
                    },
                    RawValue::Pairs(pairs) if pairs.len() == 1 => pairs[0].clone(),
                    _ => {
                        return Err(
                            self.coerce_err(setting, "expected a single 'key = value' pair".into())
                        );
                    }
                };
                let parsed = inner.parse(&RawValue::Scalar(value), setting, customs)?;
                Ok(TermValue::Tree(TermTree::from_pairs([(name, parsed)])))
            }
            Datatype::Complex => Err(self.coerce_err(
                setting,
                "complex values are aggregated from child settings".into(),
            )),
            Datatype::Custom { module, args } => match customs.get(module) {
                Some(handler) => handler
                    .parse(args, raw)
                    .map_err(|reason| self.coerce_err(setting, reason)),
                None => Ok(binary_shape(raw)),
            },
        }
    }

    /// Render a value as its canonical `.conf` right-hand side.
    pub fn format(
        &self,
        value: &TermValue,
        customs: &CustomRegistry,
    ) -> Result<String, ConftreeError> {
        match (self, value) {
            (Datatype::Atom, TermValue::Atom(a)) => Ok(a.clone()),
            (Datatype::Binary, TermValue::String(s)) => Ok(s.clone()),
            (Datatype::Binary, TermValue::Atom(a)) => Ok(a.clone()),
            (Datatype::CharList, TermValue::CharList(c)) => Ok(c.clone()),
            (Datatype::CharList, TermValue::String(s)) => Ok(s.clone()),
            (Datatype::Boolean, TermValue::Bool(b)) => Ok(b.to_string()),
            (Datatype::Integer, TermValue::Int(i)) => Ok(i.to_string()),
            (Datatype::Float, TermValue::Float(x)) => Ok(x.to_string()),
            (Datatype::Ip, TermValue::Ip { host, port }) => Ok(format!("{host}:{port}")),
            (Datatype::Enum(allowed), TermValue::Atom(a)) => {
                if allowed.iter().any(|v| v == a) {
                    Ok(a.clone())
                } else {
                    Err(ConftreeError::SchemaShape(format!(
                        "'{}' is not an allowed value of {}",
                        a,
                        self.name()
                    )))
                }
            }
            (Datatype::List(inner), TermValue::List(items)) => {
                let parts: Result<Vec<String>, ConftreeError> =
                    items.iter().map(|v| inner.format(v, customs)).collect();
                Ok(parts?.join(", "))
            }
            (Datatype::NestedList(inner), TermValue::List(rows)) => {
                let mut parts = Vec::with_capacity(rows.len());
                for row in rows {
                    let formatted = Datatype::List(inner.clone()).format(row, customs)?;
                    parts.push(format!("[{formatted}]"));
                }
                Ok(parts.join(", "))
            }
            (Datatype::PairedAtom(inner), TermValue::Tree(tree)) => match tree.iter().next() {
                Some((name, v)) if tree.len() == 1 => {
                    Ok(format!("{} = {}", name, inner.format(v, customs)?))
                }
                _ => Err(ConftreeError::SchemaShape(format!(
                    "cannot format {} as {}",
                    value.type_name(),
                    self.name()
                ))),
            },
            (Datatype::Custom { module, args }, value) => match customs.get(module) {
                Some(handler) => {
                    handler
                        .format(args, value)
                        .map_err(|reason| ConftreeError::CustomType {
                            module: module.clone(),
                            reason,
                        })
                }
                None => Datatype::Binary.format(value, customs),
            },
            (datatype, value) => Err(ConftreeError::SchemaShape(format!(
                "cannot format {} as {}",
                value.type_name(),
                datatype.name()
            ))),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Datatype::Atom => "atom".into(),
            Datatype::Binary => "binary".into(),
            Datatype::CharList => "charlist".into(),
            Datatype::Boolean => "boolean".into(),
            Datatype::Integer => "integer".into(),
            Datatype::Float => "float".into(),
            Datatype::Ip => "ip".into(),
            Datatype::Enum(_) => "enum".into(),
            Datatype::List(inner) => format!("list of {}", inner.name()),
            Datatype::NestedList(inner) => format!("nested list of {}", inner.name()),
            Datatype::PairedAtom(inner) => format!("paired atom of {}", inner.name()),
            Datatype::Complex => "complex".into(),
            Datatype::Custom { module, .. } => format!("custom {module}"),
        }
    }

    fn scalar<'a>(&self, raw: &'a RawValue, setting: &str) -> Result<&'a str, ConftreeError> {
        match raw {
            RawValue::Scalar(s) => Ok(s),
            _ => Err(self.coerce_err(setting, "expected a single value".into())),
        }
    }

    fn coerce_err(&self, setting: &str, reason: String) -> ConftreeError {
        ConftreeError::Coerce {
            setting: setting.to_string(),
            datatype: self.name(),
            reason,
        }
    }
}
