//! Top-level statements of a generated index script.
//!
//! Only the handful of shapes rustdoc emits are understood:
//!
//! ```text
//! var ALIASES = {};
//! ALIASES["nom"] = {"+":[{...}],};
//! ALIASES["nom"]["+"].push({...});
//! initSidebarItems({"fn":[["name","desc"]]});
//! window.SIDEBAR_ITEMS = {"fn":["name"]};
//! ```
//!
//! Interpreting the statements is left to the loader.

use serde_json::Value;

use super::{Cursor, ScriptError};

/// One parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Dotted target, e.g. `ALIASES`, `window.SIDEBAR_ITEMS`, `initSidebarItems`.
    pub target: String,
    /// Bracket keys following the target, outermost first.
    pub keys: Vec<String>,
    pub op: StatementOp,
    /// 1-based line the statement starts on.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementOp {
    Assign(Value),
    Call {
        /// `push` in `ALIASES["a"]["b"].push(..)`; `None` for a plain call.
        method: Option<String>,
        args: Vec<Value>,
    },
}

impl Statement {
    /// Target with a leading `window.` / `self.` / `globalThis.` removed.
    pub fn bare_target(&self) -> &str {
        ["window.", "self.", "globalThis."]
            .iter()
            .find_map(|prefix| self.target.strip_prefix(*prefix))
            .unwrap_or(&self.target)
    }
}

/// Parse a whole script into statements.
pub fn parse_script(src: &str) -> Result<Vec<Statement>, ScriptError> {
    let mut cursor = Cursor::new(src);
    let mut statements = Vec::new();
    loop {
        cursor.skip_trivia()?;
        if cursor.at_end() {
            return Ok(statements);
        }
        if cursor.eat(';')? {
            continue;
        }
        statements.push(statement(&mut cursor)?);
    }
}

fn statement(cursor: &mut Cursor<'_>) -> Result<Statement, ScriptError> {
    let line = cursor.line();

    let mut head = cursor.identifier()?;
    if matches!(head.as_str(), "var" | "let" | "const") {
        head = cursor.identifier()?;
    }
    let mut target = head;
    while cursor.peek() == Some('.') {
        cursor.bump();
        target.push('.');
        target.push_str(&cursor.identifier()?);
    }

    let mut keys = Vec::new();
    while cursor.eat('[')? {
        let start = cursor.mark();
        let key = match cursor.value()? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => {
                let (line, column) = cursor.position_at(start);
                return Err(ScriptError::NonStringKey { line, column });
            }
        };
        cursor.expect(']', "']'")?;
        keys.push(key);
    }

    let op = if cursor.eat('=')? {
        StatementOp::Assign(cursor.value()?)
    } else if cursor.eat('.')? {
        let method = cursor.identifier()?;
        cursor.expect('(', "'('")?;
        StatementOp::Call {
            method: Some(method),
            args: arguments(cursor)?,
        }
    } else if cursor.eat('(')? {
        StatementOp::Call {
            method: None,
            args: arguments(cursor)?,
        }
    } else {
        return Err(match cursor.peek() {
            Some(c) => cursor.unexpected(c, "'=', '.' or '('"),
            None => cursor.end("'=', '.' or '('"),
        });
    };
    cursor.eat(';')?;

    Ok(Statement {
        target,
        keys,
        op,
        line,
    })
}

/// Arguments after an opening `(`, through the closing `)`.
fn arguments(cursor: &mut Cursor<'_>) -> Result<Vec<Value>, ScriptError> {
    let mut args = Vec::new();
    if cursor.eat(')')? {
        return Ok(args);
    }
    loop {
        args.push(cursor.value()?);
        cursor.skip_trivia()?;
        match cursor.bump() {
            Some(',') => {
                if cursor.eat(')')? {
                    return Ok(args);
                }
            }
            Some(')') => return Ok(args),
            Some(c) => return Err(cursor.unexpected(c, "',' or ')'")),
            None => return Err(cursor.end("',' or ')'")),
        }
    }
}
