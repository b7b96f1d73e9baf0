//! Immutable snapshot of one documentation root.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::shared_types::{AliasHit, AliasTable, CatalogSummary, SidebarEntry, SidebarIndex};

/// Alias table plus every module sidebar found under a root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocCatalog {
    root: PathBuf,
    pub aliases: AliasTable,
    /// Module path (`vulkano::framebuffer`) → sidebar, in discovery order.
    pub sidebars: IndexMap<String, SidebarIndex>,
    pub loaded_at: DateTime<Utc>,
}

impl DocCatalog {
    pub fn new(
        root: impl Into<PathBuf>,
        aliases: AliasTable,
        sidebars: IndexMap<String, SidebarIndex>,
    ) -> Self {
        Self {
            root: root.into(),
            aliases,
            sidebars,
            loaded_at: Utc::now(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a module by full path, or by a unique trailing path.
    ///
    /// `framebuffer` finds `vulkano::framebuffer` as long as no other module
    /// also ends in `::framebuffer`.
    pub fn resolve_module(&self, module: &str) -> Option<&str> {
        let module = module.trim_matches(':');
        if let Some((key, _)) = self.sidebars.get_key_value(module) {
            return Some(key.as_str());
        }
        let suffix = format!("::{module}");
        let mut matches = self.sidebars.keys().filter(|k| k.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn sidebar(&self, module: &str) -> Option<&SidebarIndex> {
        self.resolve_module(module)
            .and_then(|key| self.sidebars.get(key))
    }

    /// Entries of one category in a module's sidebar; empty when either is absent.
    pub fn sidebar_category(&self, module: &str, category: &str) -> &[SidebarEntry] {
        self.sidebar(module)
            .map(|s| s.category(category))
            .unwrap_or(&[])
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.sidebars.keys().map(String::as_str)
    }

    /// Alias libraries and top-level module roots, sorted and deduplicated.
    pub fn libraries(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = self.aliases.libraries().collect();
        names.extend(
            self.sidebars
                .keys()
                .map(|m| m.split("::").next().unwrap_or(m)),
        );
        names.into_iter().map(str::to_string).collect()
    }

    /// Alias records for `symbol`, in one library or across all of them.
    pub fn lookup_alias(&self, library: Option<&str>, symbol: &str) -> Vec<AliasHit> {
        let hit = |lib: &str, entry: &crate::shared_types::AliasEntry| AliasHit {
            library: lib.to_string(),
            symbol: symbol.to_string(),
            entry: entry.clone(),
        };
        match library {
            Some(lib) => self
                .aliases
                .lookup(lib, symbol)
                .iter()
                .map(|e| hit(lib, e))
                .collect(),
            None => self
                .aliases
                .lookup_all(symbol)
                .into_iter()
                .map(|(lib, e)| hit(lib, e))
                .collect(),
        }
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            root: self.root.display().to_string(),
            libraries: self.libraries().len(),
            alias_tokens: self.aliases.iter().map(|(_, m)| m.len()).sum(),
            alias_entries: self.aliases.entry_count(),
            modules: self.sidebars.len(),
            sidebar_entries: self.sidebars.values().map(SidebarIndex::entry_count).sum(),
        }
    }
}
