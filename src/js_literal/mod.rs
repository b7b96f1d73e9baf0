//! Lenient parser for the JavaScript literals rustdoc writes into its static
//! index files.
//!
//! The files are *almost* JSON. Older toolchains single-quote alias records,
//! leave trailing commas inside object maps and wrap everything in an
//! assignment or a function call. Values are parsed into
//! [`serde_json::Value`] so the typed model can be filled with plain serde.

use serde_json::{Map, Number, Value};

pub mod script;

pub use script::{parse_script, Statement, StatementOp};

/// Failure while reading a literal or statement, with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("unexpected character '{found}' at {line}:{column}, expected {expected}")]
    Unexpected {
        found: char,
        expected: &'static str,
        line: usize,
        column: usize,
    },

    #[error("unexpected end of input at {line}:{column}, expected {expected}")]
    UnexpectedEnd {
        expected: &'static str,
        line: usize,
        column: usize,
    },

    #[error("invalid escape sequence at {line}:{column}")]
    InvalidEscape { line: usize, column: usize },

    #[error("invalid number literal '{text}' at {line}:{column}")]
    InvalidNumber {
        text: String,
        line: usize,
        column: usize,
    },

    #[error("bracket key at {line}:{column} must be a string or number")]
    NonStringKey { line: usize, column: usize },

    #[error("literal nested deeper than {} levels at {line}:{column}", MAX_DEPTH)]
    TooDeep { line: usize, column: usize },
}

/// Deepest array/object nesting accepted; matches serde_json's own limit.
pub const MAX_DEPTH: usize = 128;

/// Parse exactly one literal; anything but whitespace or comments after it is an error.
pub fn parse_value(src: &str) -> Result<Value, ScriptError> {
    let mut cursor = Cursor::new(src);
    let value = cursor.value()?;
    cursor.skip_trivia()?;
    match cursor.peek() {
        None => Ok(value),
        Some(c) => Err(cursor.unexpected(c, "end of input")),
    }
}

/// Character cursor shared by the literal and statement parsers.
///
/// The current line is tracked as characters are consumed, so positions
/// are only resolved to columns when an error is built.
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
    depth: usize,
}

/// A saved cursor location, resolved to line and column on demand.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        // A UTF-8 BOM is common in files touched by Windows tooling.
        let pos = if src.starts_with('\u{feff}') { 3 } else { 0 };
        Self {
            src,
            pos,
            line: 1,
            line_start: pos,
            depth: 0,
        }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// 1-based line of the current position.
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            line_start: self.line_start,
        }
    }

    /// 1-based line and column of a saved location.
    pub(crate) fn position_at(&self, mark: Mark) -> (usize, usize) {
        let column = self.src[mark.line_start..mark.pos].chars().count() + 1;
        (mark.line, column)
    }

    /// 1-based line and column of the current position.
    pub(crate) fn position(&self) -> (usize, usize) {
        self.position_at(self.mark())
    }

    pub(crate) fn unexpected(&self, found: char, expected: &'static str) -> ScriptError {
        let (line, column) = self.position();
        ScriptError::Unexpected {
            found,
            expected,
            line,
            column,
        }
    }

    pub(crate) fn end(&self, expected: &'static str) -> ScriptError {
        let (line, column) = self.position();
        ScriptError::UnexpectedEnd {
            expected,
            line,
            column,
        }
    }

    /// Skip whitespace, `// ...` and `/* ... */`.
    pub(crate) fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        loop {
            match (self.peek(), self.peek_nth(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => return Err(self.end("end of block comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Consume `expected` after trivia or fail.
    pub(crate) fn expect(&mut self, expected: char, what: &'static str) -> Result<(), ScriptError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.unexpected(c, what)),
            None => Err(self.end(what)),
        }
    }

    /// Consume `c` after trivia if it is next.
    pub(crate) fn eat(&mut self, c: char) -> Result<bool, ScriptError> {
        self.skip_trivia()?;
        if self.peek() == Some(c) {
            self.bump();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn identifier(&mut self) -> Result<String, ScriptError> {
        self.skip_trivia()?;
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                self.bump();
            }
            Some(c) => return Err(self.unexpected(c, "identifier")),
            None => return Err(self.end("identifier")),
        }
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
    }

    pub(crate) fn value(&mut self) -> Result<Value, ScriptError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.nested(Self::object),
            Some('[') => self.nested(Self::array),
            Some(q @ ('"' | '\'')) => self.string(q).map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if is_ident_start(c) => {
                let ident = self.identifier()?;
                match ident.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" => Ok(Value::Null),
                    _ => Err(self.unexpected(c, "literal value")),
                }
            }
            Some(c) => Err(self.unexpected(c, "literal value")),
            None => Err(self.end("literal value")),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, ScriptError>,
    ) -> Result<Value, ScriptError> {
        if self.depth >= MAX_DEPTH {
            let (line, column) = self.position();
            return Err(ScriptError::TooDeep { line, column });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn object(&mut self) -> Result<Value, ScriptError> {
        self.expect('{', "'{'")?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}')? {
                return Ok(Value::Object(map));
            }
            let key = match self.peek() {
                Some(q @ ('"' | '\'')) => self.string(q)?,
                Some(c) if c.is_ascii_digit() => self.number()?.to_string(),
                Some(c) if is_ident_start(c) => self.identifier()?,
                Some(c) => return Err(self.unexpected(c, "object key")),
                None => return Err(self.end("object key")),
            };
            self.expect(':', "':'")?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some(c) => return Err(self.unexpected(c, "',' or '}'")),
                None => return Err(self.end("',' or '}'")),
            }
        }
    }

    fn array(&mut self) -> Result<Value, ScriptError> {
        self.expect('[', "'['")?;
        let mut items = Vec::new();
        loop {
            if self.eat(']')? {
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                Some(c) => return Err(self.unexpected(c, "',' or ']'")),
                None => return Err(self.end("',' or ']'")),
            }
        }
    }

    pub(crate) fn string(&mut self, quote: char) -> Result<String, ScriptError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.end("closing quote")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some('\n') => return Err(self.unexpected('\n', "closing quote")),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ScriptError> {
        let Some(c) = self.bump() else {
            return Err(self.end("escape sequence"));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !matches!(self.peek(), Some(d) if d.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(char::from_u32(code).ok_or_else(|| self.invalid_escape())?);
            }
            'u' => {
                let ch = self.unicode_escape()?;
                out.push(ch);
            }
            // Line continuation.
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            c if c.is_ascii_digit() => return Err(self.invalid_escape()),
            // `\'`, `\"`, `\\`, `\/` and any other identity escape.
            other => out.push(other),
        }
        Ok(())
    }

    fn unicode_escape(&mut self) -> Result<char, ScriptError> {
        if self.peek() == Some('{') {
            self.bump();
            let start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[start..self.pos];
            if digits.is_empty() || self.bump() != Some('}') {
                return Err(self.invalid_escape());
            }
            let code = u32::from_str_radix(digits, 16).map_err(|_| self.invalid_escape())?;
            return char::from_u32(code).ok_or_else(|| self.invalid_escape());
        }

        let high = self.hex_digits(4)?;
        if (0xD800..0xDC00).contains(&high) {
            // Surrogate pair: a low half must follow as another `\uXXXX`.
            if self.peek() == Some('\\') && self.peek_nth(1) == Some('u') {
                self.bump();
                self.bump();
                let low = self.hex_digits(4)?;
                if (0xDC00..0xE000).contains(&low) {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(code).ok_or_else(|| self.invalid_escape());
                }
            }
            return Err(self.invalid_escape());
        }
        char::from_u32(high).ok_or_else(|| self.invalid_escape())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, ScriptError> {
        let start = self.pos;
        for _ in 0..count {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.bump();
                }
                _ => return Err(self.invalid_escape()),
            }
        }
        u32::from_str_radix(&self.src[start..self.pos], 16).map_err(|_| self.invalid_escape())
    }

    fn invalid_escape(&self) -> ScriptError {
        let (line, column) = self.position();
        ScriptError::InvalidEscape { line, column }
    }

    fn number(&mut self) -> Result<Value, ScriptError> {
        let start = self.mark();
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '.' || c == '_')
            || (matches!(self.peek(), Some('-' | '+'))
                && matches!(self.src[..self.pos].chars().last(), Some('e' | 'E')))
        {
            self.bump();
        }
        let text = &self.src[start.pos..self.pos];
        let invalid = || {
            let (line, column) = self.position_at(start);
            ScriptError::InvalidNumber {
                text: text.to_string(),
                line,
                column,
            }
        };
        let digits = text.strip_prefix('+').unwrap_or(text);

        if let Ok(n) = digits.parse::<i64>() {
            return Ok(Value::Number(n.into()));
        }
        if let Ok(n) = digits.parse::<u64>() {
            return Ok(Value::Number(n.into()));
        }
        let float: f64 = digits.parse().map_err(|_| invalid())?;
        Number::from_f64(float).map(Value::Number).ok_or_else(invalid)
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}
