//! The `.conf` parser: flat sysctl-style text into ordered key/value pairs.
//!
//! Grammar (line-oriented): a line is a setting, a comment, whitespace, or
//! empty. A setting is a dotted key, `=`, one or more comma-separated
//! values, and an optional trailing comment. Keys are words (letters,
//! digits, `_`, `-`, with `\.` escaping a literal dot) or quoted strings;
//! values are bare scalars, quoted strings, or bracketed `[name = value]`
//! pair lists.
//!
//! Post-processing rules:
//!
//! - quoted strings strip their quotes and unescape `\\` and `\"`; their
//!   content must fit the Latin-1 code plane, otherwise parsing fails with
//!   the offending line number
//! - several comma-separated values form a list, a single value stays
//!   scalar, bracketed lists yield `(name, value)` pairs
//! - comments, blank lines, and whitespace-only lines produce nothing
//! - output order equals input order; a trailing comma is tolerated
//!
//! There is no error recovery: the first grammar mismatch aborts with a
//! [`ConftreeError::Parse`] carrying the 1-indexed line number.

use crate::error::ConftreeError;
use crate::key::KeyPath;

/// The uninterpreted right-hand side of a setting.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A single value.
    Scalar(String),
    /// Comma-separated values.
    List(Vec<String>),
    /// A bracketed `[name = value, ...]` list.
    Pairs(Vec<(String, String)>),
}

/// Parse `.conf` text into ordered `(key, raw value)` pairs.
pub fn parse(input: &str) -> Result<Vec<(KeyPath, RawValue)>, ConftreeError> {
    Parser::new(input).run()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Parser {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn run(mut self) -> Result<Vec<(KeyPath, RawValue)>, ConftreeError> {
        let mut pairs = Vec::new();
        while !self.eof() {
            self.skip_ws();
            if self.eof() {
                break;
            }
            if self.at_eol() {
                self.consume_eol()?;
                continue;
            }
            if self.peek() == Some('#') {
                self.skip_comment();
                if !self.eof() {
                    self.consume_eol()?;
                }
                continue;
            }
            pairs.push(self.setting()?);
        }
        Ok(pairs)
    }

    fn setting(&mut self) -> Result<(KeyPath, RawValue), ConftreeError> {
        let key = self.key()?;
        self.skip_ws();
        if self.peek() != Some('=') {
            return Err(self.err("expected '=' after key"));
        }
        self.pos += 1;
        self.skip_ws();
        let value = self.values()?;
        if !self.eof() {
            self.consume_eol()?;
        }
        Ok((key, value))
    }

    fn key(&mut self) -> Result<KeyPath, ConftreeError> {
        let mut segments = Vec::new();
        loop {
            let segment = if self.peek() == Some('"') {
                self.quoted_string()?
            } else {
                self.word()?
            };
            segments.push(segment);
            if self.peek() == Some('.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(KeyPath::from_literals(segments))
    }

    fn word(&mut self) -> Result<String, ConftreeError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') if self.peek_at(1) == Some('.') => {
                    self.pos += 2;
                    out.push('.');
                }
                Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '-' => {
                    self.pos += 1;
                    out.push(c);
                }
                _ => break,
            }
        }
        if out.is_empty() {
            return Err(self.err("expected a key segment"));
        }
        Ok(out)
    }

    fn values(&mut self) -> Result<RawValue, ConftreeError> {
        let mut scalars: Vec<String> = Vec::new();
        let mut pairs: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_ws();
            if self.at_value_end() {
                break;
            }
            match self.peek() {
                Some('[') => pairs.extend(self.bracket_list()?),
                Some('"') => scalars.push(self.quoted_string()?),
                _ => scalars.push(self.bare_value()?),
            }
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('#') | Some('\n') | Some('\r') | None => break,
                Some(c) => return Err(self.err(format!("unexpected character '{c}' after value"))),
            }
        }
        if self.peek() == Some('#') {
            self.skip_comment();
        }
        if !pairs.is_empty() && !scalars.is_empty() {
            return Err(self.err("cannot mix bracketed lists and plain values"));
        }
        if !pairs.is_empty() {
            return Ok(RawValue::Pairs(pairs));
        }
        match scalars.len() {
            0 => Err(self.err("expected a value")),
            1 => Ok(RawValue::Scalar(scalars.remove(0))),
            _ => Ok(RawValue::List(scalars)),
        }
    }

    fn bare_value(&mut self) -> Result<String, ConftreeError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') | Some(',') | Some('#') => break,
                Some(c) => {
                    self.pos += 1;
                    out.push(c);
                }
            }
        }
        let out = out.trim_end().to_string();
        if out.is_empty() {
            return Err(self.err("expected a value"));
        }
        Ok(out)
    }

    fn quoted_string(&mut self) -> Result<String, ConftreeError> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.err("unterminated quoted string"));
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some('"') => {
                            self.pos += 1;
                            out.push('"');
                        }
                        Some('\\') => {
                            self.pos += 1;
                            out.push('\\');
                        }
                        Some(c) => {
                            self.pos += 1;
                            out.push('\\');
                            out.push(c);
                        }
                        None => return Err(self.err("unterminated quoted string")),
                    }
                }
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some(c) => {
                    self.pos += 1;
                    out.push(c);
                }
            }
        }
        if let Some(c) = out.chars().find(|&c| c as u32 > 0xFF) {
            return Err(self.err(format!("'{c}' cannot be represented in Latin-1")));
        }
        Ok(out)
    }

    fn bracket_list(&mut self) -> Result<Vec<(String, String)>, ConftreeError> {
        self.pos += 1; // opening bracket
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.pos += 1;
                break;
            }
            if self.at_eol() || self.eof() {
                return Err(self.err("unterminated '[' list"));
            }
            let name = self.word()?;
            self.skip_ws();
            if self.peek() != Some('=') {
                return Err(self.err("expected '=' in bracketed list"));
            }
            self.pos += 1;
            self.skip_ws();
            let value = if self.peek() == Some('"') {
                self.quoted_string()?
            } else {
                self.bracket_bare()?
            };
            out.push((name, value));
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.err("expected ',' or ']' in bracketed list")),
            }
        }
        Ok(out)
    }

    fn bracket_bare(&mut self) -> Result<String, ConftreeError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.err("unterminated '[' list"));
                }
                Some(c) if c == ' ' || c == '\t' || c == ',' || c == ']' => break,
                Some(c) => {
                    self.pos += 1;
                    out.push(c);
                }
            }
        }
        if out.is_empty() {
            return Err(self.err("expected a value in bracketed list"));
        }
        Ok(out)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn at_eol(&self) -> bool {
        matches!(self.peek(), Some('\n') | Some('\r'))
    }

    fn at_value_end(&self) -> bool {
        matches!(self.peek(), None | Some('\n') | Some('\r') | Some('#'))
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    fn skip_comment(&mut self) {
        while !self.eof() && !self.at_eol() {
            self.pos += 1;
        }
    }

    fn consume_eol(&mut self) -> Result<(), ConftreeError> {
        if self.peek() == Some('\r') {
            self.pos += 1;
        }
        if self.peek() != Some('\n') {
            return Err(self.err("expected end of line"));
        }
        self.pos += 1;
        self.line += 1;
        Ok(())
    }

    fn err(&self, reason: impl Into<String>) -> ConftreeError {
        ConftreeError::Parse {
            line: self.line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPath;

    fn kp(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    #[test]
    fn single_setting() {
        let pairs = parse("riak.node = riak@127.0.0.1\n").unwrap();
        assert_eq!(
            pairs,
            vec![(kp("riak.node"), RawValue::Scalar("riak@127.0.0.1".into()))]
        );
    }

    #[test]
    fn preserves_input_order() {
        let pairs = parse("b = 2\na = 1\n").unwrap();
        let keys: Vec<String> = pairs.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn comma_separated_values_become_list() {
        let pairs = parse("nodes = 10.0.0.1:8098, 10.0.0.2:8098\n").unwrap();
        assert_eq!(
            pairs[0].1,
            RawValue::List(vec!["10.0.0.1:8098".into(), "10.0.0.2:8098".into()])
        );
    }

    #[test]
    fn single_value_stays_scalar() {
        let pairs = parse("port = 8098\n").unwrap();
        assert_eq!(pairs[0].1, RawValue::Scalar("8098".into()));
    }

    #[test]
    fn trailing_comma_tolerated() {
        let pairs = parse("nodes = a, b,\n").unwrap();
        assert_eq!(pairs[0].1, RawValue::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn comments_and_blank_lines_produce_nothing() {
        let input = "# a comment\n\n   \nkey = value\n";
        let pairs = parse(input).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, kp("key"));
    }

    #[test]
    fn trailing_comment_stripped() {
        let pairs = parse("key = value # trailing\n").unwrap();
        assert_eq!(pairs[0].1, RawValue::Scalar("value".into()));
    }

    #[test]
    fn escaped_dot_in_key() {
        let pairs = parse("a\\.b.c = 1\n").unwrap();
        assert_eq!(pairs[0].0, kp("a\\.b.c"));
        assert_eq!(pairs[0].0.len(), 2);
    }

    #[test]
    fn quoted_key_segment() {
        let pairs = parse("\"a.b\".c = 1\n").unwrap();
        assert_eq!(pairs[0].0.len(), 2);
        assert_eq!(pairs[0].0.to_string(), "a\\.b.c");
    }

    #[test]
    fn quoted_value_keeps_spaces_and_hash() {
        let pairs = parse("msg = \"hello # world\"\n").unwrap();
        assert_eq!(pairs[0].1, RawValue::Scalar("hello # world".into()));
    }

    #[test]
    fn quoted_value_unescapes() {
        let pairs = parse("msg = \"a \\\"b\\\" \\\\ c\"\n").unwrap();
        assert_eq!(pairs[0].1, RawValue::Scalar("a \"b\" \\ c".into()));
    }

    #[test]
    fn non_latin1_in_quoted_string_rejected() {
        let err = parse("msg = \"\u{4e16}\u{754c}\"\n").unwrap_err();
        match err {
            ConftreeError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn bracketed_list_yields_pairs() {
        let pairs = parse("opts = [mode=active, level=3]\n").unwrap();
        assert_eq!(
            pairs[0].1,
            RawValue::Pairs(vec![
                ("mode".into(), "active".into()),
                ("level".into(), "3".into())
            ])
        );
    }

    #[test]
    fn bracketed_list_with_quoted_value() {
        let pairs = parse("opts = [path=\"/var/db\"]\n").unwrap();
        assert_eq!(
            pairs[0].1,
            RawValue::Pairs(vec![("path".into(), "/var/db".into())])
        );
    }

    #[test]
    fn missing_equals_is_parse_error() {
        let err = parse("key value\n").unwrap_err();
        match err {
            ConftreeError::Parse { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("'='"));
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn error_line_number_counts_preceding_lines() {
        let err = parse("a = 1\n# fine\nbroken\n").unwrap_err();
        match err {
            ConftreeError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn empty_rhs_is_parse_error() {
        assert!(parse("key =\n").is_err());
        assert!(parse("key = # only comment\n").is_err());
    }

    #[test]
    fn crlf_line_endings() {
        let pairs = parse("a = 1\r\nb = 2\r\n").unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn missing_trailing_newline_ok() {
        let pairs = parse("a = 1").unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn values_trimmed_outside_quotes() {
        let pairs = parse("a =   spaced value   \n").unwrap();
        assert_eq!(pairs[0].1, RawValue::Scalar("spaced value".into()));
    }

    #[test]
    fn parse_is_deterministic() {
        let input = "a = 1\nb = x, y\nc = [k=v]\n";
        let first = parse(input).unwrap();
        for _ in 0..3 {
            assert_eq!(parse(input).unwrap(), first);
        }
    }
}
