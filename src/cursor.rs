//! Position-tracking view over DDS/DAS text.
//!
//! Both grammars are driven through two primitives: [`Cursor::peek`] looks at the
//! text at the current position without moving, [`Cursor::consume`] moves past the
//! match and any whitespace after it. Patterns are regular expressions, matched
//! case-insensitively and anchored at the current position.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

/// Token patterns used by the grammars.
pub mod pattern {
    pub const WORD: &str = r"[\w-]+";
    pub const DIGITS: &str = r"\d+";
    pub const OPEN_BRACE: &str = r"\{";
    pub const CLOSE_BRACE: &str = r"\}";
    pub const OPEN_BRACKET: &str = r"\[";
    pub const CLOSE_BRACKET: &str = r"\]";
    pub const SEMICOLON: &str = ";";
    pub const COLON: &str = ":";
    pub const COMMA: &str = ",";
    pub const EQUALS: &str = "=";
    /// Dataset name after the closing brace: anything up to `;`.
    pub const DATASET_NAME: &str = r"[^;]+";
    pub const ATTRIBUTE_NAME: &str = r"\b[a-zA-Z0-9_-]+\b";
    pub const CONTAINER_NAME: &str = r"[\w\-\.]+";
    /// A double-quoted literal (with `\` escapes) or a bare run without `;`/`,`.
    pub const LITERAL: &str = r#""(?:[^"\\]|\\.)*"|[^;,]+"#;

    pub const DATASET: &str = "dataset";
    pub const GRID: &str = "grid";
    pub const STRUCTURE: &str = "structure";
    pub const SEQUENCE: &str = "sequence";
    pub const ARRAY: &str = "array";
    pub const MAPS: &str = "maps";
    pub const ATTRIBUTES: &str = "attributes";
}

/// Length of the remainder quoted in syntax errors.
const SNIPPET_CHARS: usize = 10;

pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    compiled: HashMap<&'static str, Regex>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut cursor = Cursor {
            input,
            pos: 0,
            compiled: HashMap::new(),
        };
        cursor.skip_whitespace();
        cursor
    }

    /// Byte offset of the current position.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Text matched by `pattern` at the current position, or `""`. Never moves.
    pub fn peek(&mut self, pattern: &'static str) -> &'a str {
        self.find(pattern).unwrap_or("")
    }

    /// Match `pattern` at the current position and move past it and any following whitespace.
    pub fn consume(&mut self, pattern: &'static str) -> Result<&'a str> {
        match self.find(pattern) {
            Some(m) => {
                self.pos += m.len();
                self.skip_whitespace();
                Ok(m)
            }
            None => Err(self.syntax_error()),
        }
    }

    /// Syntax error pointing at the current position.
    pub fn syntax_error(&self) -> Error {
        Error::Syntax {
            position: self.pos,
            snippet: self.remaining().chars().take(SNIPPET_CHARS).collect(),
        }
    }

    fn find(&mut self, pattern: &'static str) -> Option<&'a str> {
        let rest = &self.input[self.pos..];
        let re = self.compiled.entry(pattern).or_insert_with(|| anchored(pattern));
        re.find(rest).map(|m| &rest[..m.end()])
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        self.pos += rest.len() - rest.trim_start().len();
    }
}

fn anchored(pattern: &str) -> Regex {
    RegexBuilder::new(&format!("^(?:{})", pattern))
        .case_insensitive(true)
        .build()
        .expect("grammar patterns are valid regular expressions")
}
