//! Parser for the OpenStep-style property list in `project.pbxproj`
//!
//! Grammar:
//!
//! ```text
//! document := dict
//! value    := string | dict | array
//! dict     := '{' (string '=' value ';')* '}'
//! array    := '(' (value ',')* value? ')'
//! ```
//!
//! `//` line comments and `/* */` block comments are skipped, except a block
//! comment that follows a string on the same line, which becomes that
//! string's annotation.

use crate::plist::{Dict, Value};
use std::collections::HashMap;
use xcspm_core::error::{Error, Result};

/// Result of parsing a project file
#[derive(Debug)]
pub struct Document {
    pub root: Dict,
    /// Annotations written after dictionary keys (`ID /* name */ = {...}`)
    pub key_annotations: HashMap<String, String>,
}

/// Parse the text of a `project.pbxproj` file
pub fn parse(text: &str) -> Result<Document> {
    let mut parser = Parser {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        key_annotations: HashMap::new(),
    };

    parser.skip_trivia()?;
    let root = match parser.peek() {
        Some(b'{') => parser.parse_dict()?,
        _ => return Err(parser.error("Expected '{' at start of project file")),
    };

    parser.skip_trivia()?;
    if parser.pos < parser.bytes.len() {
        return Err(parser.error("Unexpected content after closing '}'"));
    }

    Ok(Document {
        root,
        key_annotations: parser.key_annotations,
    })
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    key_annotations: HashMap<String, String>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn error(&self, message: &str) -> Error {
        let consumed = &self.text[..self.pos.min(self.text.len())];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rfind('\n')
            .map_or(consumed.chars().count(), |nl| consumed[nl + 1..].chars().count())
            + 1;
        Error::parse(line, column, message)
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        self.skip_trivia()?;
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("Expected '{}'", byte as char)))
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Consume a `/* ... */` comment and return its trimmed body
    fn block_comment(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 2;
        match self.text[self.pos..].find("*/") {
            Some(end) => {
                let body = self.text[self.pos..self.pos + end].trim().to_string();
                self.pos += end + 2;
                Ok(body)
            }
            None => {
                self.pos = start;
                Err(self.error("Unterminated comment"))
            }
        }
    }

    /// A block comment on the same line as the previous token
    fn trailing_annotation(&mut self) -> Result<Option<String>> {
        let mut lookahead = self.pos;
        while let Some(&b) = self.bytes.get(lookahead) {
            if b == b' ' || b == b'\t' {
                lookahead += 1;
            } else {
                break;
            }
        }
        if self.bytes.get(lookahead) == Some(&b'/') && self.bytes.get(lookahead + 1) == Some(&b'*')
        {
            self.pos = lookahead;
            return self.block_comment().map(Some);
        }
        Ok(None)
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'{') => Ok(Value::Dict(self.parse_dict()?)),
            Some(b'(') => self.parse_array(),
            Some(_) => {
                let s = self.parse_string()?;
                match self.trailing_annotation()? {
                    Some(annotation) => Ok(Value::Annotated(s, annotation)),
                    None => Ok(Value::String(s)),
                }
            }
            None => Err(self.error("Unexpected end of file")),
        }
    }

    fn parse_dict(&mut self) -> Result<Dict> {
        self.expect(b'{')?;
        let mut dict = Dict::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(dict);
                }
                None => return Err(self.error("Unterminated dictionary")),
                Some(_) => {
                    let key = self.parse_string()?;
                    if let Some(annotation) = self.trailing_annotation()? {
                        self.key_annotations.entry(key.clone()).or_insert(annotation);
                    }
                    self.expect(b'=')?;
                    let value = self.parse_value()?;
                    self.expect(b';')?;
                    dict.insert(key, value);
                }
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect(b'(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                None => return Err(self.error("Unterminated array")),
                Some(_) => {
                    items.push(self.parse_value()?);
                    self.skip_trivia()?;
                    match self.peek() {
                        Some(b',') => self.pos += 1,
                        Some(b')') => {}
                        _ => return Err(self.error("Expected ',' or ')' in array")),
                    }
                }
            }
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        match self.peek() {
            Some(b'"') => self.parse_quoted(),
            Some(b) if is_unquoted_byte(b) => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if !is_unquoted_byte(b) {
                        break;
                    }
                    self.pos += 1;
                }
                Ok(self.text[start..self.pos].to_string())
            }
            _ => Err(self.error("Expected a string")),
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut chunk_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    self.pos = start;
                    return Err(self.error("Unterminated string"));
                }
                Some(b'"') => {
                    out.push_str(&self.text[chunk_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    out.push_str(&self.text[chunk_start..self.pos]);
                    let escaped = match self.peek_at(1) {
                        Some(b'n') => '\n',
                        Some(b't') => '\t',
                        Some(b'r') => '\r',
                        Some(b'\\') => '\\',
                        Some(b'"') => '"',
                        Some(b'\'') => '\'',
                        _ => return Err(self.error("Invalid escape sequence")),
                    };
                    out.push(escaped);
                    self.pos += 2;
                    chunk_start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
    }
}

/// Bytes allowed in an unquoted string token
fn is_unquoted_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'{' | b'}' | b'(' | b')' | b'=' | b';' | b',' | b'"')
}
