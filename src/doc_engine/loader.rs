//! Turns parsed index scripts into the typed model.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::js_literal::{parse_script, ScriptError, Statement, StatementOp};
use crate::shared_types::{AliasEntry, AliasTable, SidebarIndex};

/// Errors produced while loading an alias or sidebar script.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("line {line}: {target} is undefined")]
    UndefinedTarget { target: String, line: usize },

    #[error("line {line}: malformed {what}: {source}")]
    Shape {
        what: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: unsupported statement on {target}")]
    Unsupported { target: String, line: usize },

    #[error("no sidebar statement found")]
    NoSidebar,
}

/// Evaluate the `ALIASES` statements of an `aliases.js` script.
pub fn aliases_from_script(src: &str) -> Result<AliasTable, LoadError> {
    let mut table = AliasTable::new();
    for stmt in parse_script(src)? {
        if stmt.bare_target() != "ALIASES" {
            debug!(line = stmt.line, target = %stmt.target, "skipping statement");
            continue;
        }
        apply_alias_statement(&mut table, stmt)?;
    }
    Ok(table)
}

fn apply_alias_statement(table: &mut AliasTable, stmt: Statement) -> Result<(), LoadError> {
    let Statement { keys, op, line, .. } = stmt;
    match (keys.as_slice(), op) {
        ([], StatementOp::Assign(value)) => {
            *table = from_shape(value, "ALIASES".to_string(), line)?;
        }
        ([library], StatementOp::Assign(value)) => {
            let map = from_shape(value, alias_location(&keys), line)?;
            table.insert_library(library.clone(), map);
        }
        ([library, token], StatementOp::Assign(value)) => {
            let entries: Vec<AliasEntry> = from_shape(value, alias_location(&keys), line)?;
            table
                .library_mut(library)
                .ok_or_else(|| LoadError::UndefinedTarget {
                    target: alias_location(&keys[..1]),
                    line,
                })?
                .insert(token.clone(), entries);
        }
        ([library, token], StatementOp::Call { method: Some(method), args }) if method == "push" => {
            let list = table
                .library_mut(library)
                .and_then(|map| map.get_mut(token))
                .ok_or_else(|| LoadError::UndefinedTarget {
                    target: alias_location(&keys),
                    line,
                })?;
            for arg in args {
                list.push(from_shape(arg, alias_location(&keys), line)?);
            }
        }
        _ => {
            return Err(LoadError::Unsupported {
                target: alias_location(&keys),
                line,
            })
        }
    }
    Ok(())
}

/// Read the item table of a `sidebar-items.js` script.
///
/// Both `initSidebarItems({...})` and `window.SIDEBAR_ITEMS = {...}` are
/// accepted; when a script has several, the last one wins.
pub fn sidebar_from_script(src: &str) -> Result<SidebarIndex, LoadError> {
    let mut found = None;
    for stmt in parse_script(src)? {
        let target = stmt.bare_target().to_string();
        let line = stmt.line;
        let value = match (target.as_str(), stmt.keys.is_empty(), stmt.op) {
            ("initSidebarItems", true, StatementOp::Call { method: None, args }) => {
                match args.into_iter().next() {
                    Some(value) => value,
                    None => return Err(LoadError::Unsupported { target, line }),
                }
            }
            ("SIDEBAR_ITEMS", true, StatementOp::Assign(value)) => value,
            _ => {
                debug!(line, target = %target, "skipping statement");
                continue;
            }
        };
        found = Some(from_shape(
            normalize_sidebar(value),
            "sidebar items".to_string(),
            line,
        )?);
    }
    found.ok_or(LoadError::NoSidebar)
}

/// Newer toolchains list bare names; widen them to `[name, ""]` pairs.
fn normalize_sidebar(mut value: Value) -> Value {
    if let Value::Object(categories) = &mut value {
        for entries in categories.values_mut() {
            if let Value::Array(items) = entries {
                for item in items.iter_mut() {
                    if let Value::String(name) = item {
                        *item = Value::Array(vec![
                            Value::String(std::mem::take(name)),
                            Value::String(String::new()),
                        ]);
                    }
                }
            }
        }
    }
    value
}

fn from_shape<T: DeserializeOwned>(value: Value, what: String, line: usize) -> Result<T, LoadError> {
    serde_json::from_value(value).map_err(|source| LoadError::Shape { what, line, source })
}

fn alias_location(keys: &[String]) -> String {
    let mut out = String::from("ALIASES");
    for key in keys {
        out.push_str(&format!("[{key:?}]"));
    }
    out
}
