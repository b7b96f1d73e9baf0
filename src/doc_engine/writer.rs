//! Writes catalogs back out in rustdoc's script layout, or as JSON.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::info;

use super::catalog::DocCatalog;
use super::finder::module_dir;
use super::types::ExportFormat;
use crate::shared_types::{AliasEntry, AliasTable, SidebarIndex};

/// `aliases.js` as the generator lays it out: an empty declaration, then one
/// sorted assignment line per library.
pub fn write_aliases_js(table: &AliasTable) -> String {
    let mut lines: Vec<String> = table
        .iter()
        .map(|(library, map)| {
            let mut body = String::new();
            for (token, entries) in map.iter() {
                body.push_str(&js_string(token, '"'));
                body.push_str(":[");
                let records: Vec<String> = entries.iter().map(alias_record).collect();
                body.push_str(&records.join(","));
                body.push_str("],");
            }
            format!("ALIASES[{}] = {{{}}};", js_string(library, '"'), body)
        })
        .collect();
    lines.sort();

    let mut out = String::from("var ALIASES = {};\n");
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// `sidebar-items.js` in the `initSidebarItems` form.
pub fn write_sidebar_js(index: &SidebarIndex) -> serde_json::Result<String> {
    Ok(format!("initSidebarItems({});", serde_json::to_string(index)?))
}

fn alias_record(entry: &AliasEntry) -> String {
    format!(
        "{{'crate':{},'ty':{},'name':{},'desc':{},'p':{}}}",
        js_string(&entry.krate, '\''),
        entry.ty,
        js_string(&entry.name, '\''),
        js_string(&entry.desc, '\''),
        js_string(&entry.path, '\''),
    )
}

/// Quote `s` as a JS string literal using `quote`.
fn js_string(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Write `catalog` under `out_dir`.
///
/// `Js` recreates `aliases.js` and one `sidebar-items.js` per module
/// directory; `Json` writes a single `catalog.json`.
pub async fn write_catalog(catalog: &DocCatalog, out_dir: &Path, format: ExportFormat) -> Result<()> {
    fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create '{}'", out_dir.display()))?;

    match format {
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(catalog).context("Failed to encode catalog")?;
            fs::write(out_dir.join("catalog.json"), json).await?;
        }
        ExportFormat::Js => {
            fs::write(out_dir.join("aliases.js"), write_aliases_js(&catalog.aliases)).await?;
            for (module, index) in &catalog.sidebars {
                let dir = out_dir.join(module_dir(module));
                fs::create_dir_all(&dir).await?;
                let script = write_sidebar_js(index)
                    .with_context(|| format!("Failed to encode sidebar for {module}"))?;
                fs::write(dir.join("sidebar-items.js"), script).await?;
            }
        }
    }

    info!(
        "Exported {} module sidebar(s) to {} as {:?}",
        catalog.sidebars.len(),
        out_dir.display(),
        format
    );
    Ok(())
}
