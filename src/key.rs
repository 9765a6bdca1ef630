//! Dotted key paths with escape handling and wildcard matching.
//!
//! A key path is an ordered sequence of non-empty segments. Schema keys may
//! contain the wildcard segment `*`; keys parsed from `.conf` text never do.
//! A literal dot inside a segment is written `\.` in source form and
//! re-escaped by [`Display`](std::fmt::Display).
//!
//! Matching is segment-wise — no string-level patterns. [`KeyPath::matches`]
//! requires equal length with `*` matching any single segment;
//! [`KeyPath::match_prefix`] additionally yields the captured wildcard
//! segments and the child suffix beyond the pattern, which is what the
//! aggregation pass consumes.

use std::fmt;

use crate::error::ConftreeError;

/// One segment of a key path: a literal name, or the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Wildcard,
}

/// An ordered sequence of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    /// Parse a dotted source-form key (e.g. `listener.http.*` or `a\.b.c`).
    ///
    /// `\.` escapes a literal dot; a segment consisting of exactly `*` is a
    /// wildcard. Empty segments are rejected.
    pub fn parse(dotted: &str) -> Result<Self, ConftreeError> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = dotted.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('.') => current.push('.'),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => current.push('\\'),
                },
                '.' => {
                    segments.push(Self::segment_from(std::mem::take(&mut current), dotted)?);
                }
                c => current.push(c),
            }
        }
        segments.push(Self::segment_from(current, dotted)?);
        Ok(KeyPath { segments })
    }

    fn segment_from(text: String, source: &str) -> Result<Segment, ConftreeError> {
        if text.is_empty() {
            return Err(ConftreeError::SchemaShape(format!(
                "key '{source}' contains an empty segment"
            )));
        }
        if text == "*" {
            Ok(Segment::Wildcard)
        } else {
            Ok(Segment::Literal(text))
        }
    }

    /// Build a key path from literal segments, as the `.conf` parser does.
    pub(crate) fn from_literals<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyPath {
            segments: segments
                .into_iter()
                .map(|s| Segment::Literal(s.into()))
                .collect(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn wildcard_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Wildcard))
            .count()
    }

    pub fn literal_count(&self) -> usize {
        self.segments.len() - self.wildcard_count()
    }

    /// `true` when the path contains no wildcards.
    pub fn is_concrete(&self) -> bool {
        self.wildcard_count() == 0
    }

    /// The last segment's literal text, if the path is non-empty and its
    /// last segment is a literal.
    pub fn last_literal(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::Literal(s)) => Some(s),
            _ => None,
        }
    }

    /// The path with its last segment removed.
    pub fn parent(&self) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.pop();
        KeyPath { segments }
    }

    /// The path extended by one literal segment.
    pub(crate) fn child(&self, segment: String) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.push(Segment::Literal(segment));
        KeyPath { segments }
    }

    /// The literal text of every segment. Only valid on concrete paths;
    /// wildcard segments are skipped.
    pub(crate) fn literal_segments(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Literal(text) => Some(text.clone()),
                Segment::Wildcard => None,
            })
            .collect()
    }

    /// Whether this pattern matches `concrete` exactly: equal length, with
    /// `*` matching any single segment.
    pub fn matches(&self, concrete: &KeyPath) -> bool {
        self.captures(concrete).is_some()
    }

    /// Exact-length match returning the segments bound by each wildcard, in
    /// pattern order.
    pub(crate) fn captures(&self, concrete: &KeyPath) -> Option<Vec<String>> {
        if self.segments.len() != concrete.segments.len() {
            return None;
        }
        let mut captures = Vec::new();
        for (pattern, segment) in self.segments.iter().zip(&concrete.segments) {
            match (pattern, segment) {
                (Segment::Wildcard, Segment::Literal(text)) => captures.push(text.clone()),
                (Segment::Literal(a), Segment::Literal(b)) if a == b => {}
                _ => return None,
            }
        }
        Some(captures)
    }

    /// Prefix match for aggregation: literals must be equal, each wildcard
    /// captures one segment, and everything beyond the pattern length is the
    /// child suffix. A match must extend past the pattern's literal part —
    /// captures and child suffix cannot both be empty.
    pub(crate) fn match_prefix(&self, concrete: &KeyPath) -> Option<(Vec<String>, Vec<String>)> {
        if concrete.segments.len() < self.segments.len() {
            return None;
        }
        let mut captures = Vec::new();
        for (pattern, segment) in self.segments.iter().zip(&concrete.segments) {
            match (pattern, segment) {
                (Segment::Wildcard, Segment::Literal(text)) => captures.push(text.clone()),
                (Segment::Literal(a), Segment::Literal(b)) if a == b => {}
                _ => return None,
            }
        }
        let child: Vec<String> = concrete.segments[self.segments.len()..]
            .iter()
            .filter_map(|s| match s {
                Segment::Literal(text) => Some(text.clone()),
                Segment::Wildcard => None,
            })
            .collect();
        if captures.is_empty() && child.is_empty() {
            return None;
        }
        Some((captures, child))
    }

    /// Substitute `captures` into this template's wildcards in order (first
    /// wildcard gets the first capture, and so on). Returns the substituted
    /// path and the number of captures consumed.
    ///
    /// Schema ingest guarantees a `to` template never has more wildcards
    /// than its key, so every wildcard finds a capture.
    pub(crate) fn substitute(&self, captures: &[String]) -> (KeyPath, usize) {
        let mut used = 0;
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Wildcard => match captures.get(used) {
                    Some(text) => {
                        used += 1;
                        Segment::Literal(text.clone())
                    }
                    None => Segment::Wildcard,
                },
                literal => literal.clone(),
            })
            .collect();
        (KeyPath { segments }, used)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Literal(text) => f.write_str(&text.replace('.', "\\."))?,
                Segment::Wildcard => f.write_str("*")?,
            }
        }
        Ok(())
    }
}
