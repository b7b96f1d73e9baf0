//! Index Core - symbol search over loaded alias tables and sidebars
//!
//! Flattens a [`DocCatalog`] into one record per alias entry and per sidebar
//! entry, then answers case-insensitive substring queries over it.

use std::collections::HashSet;

pub mod search;

use crate::doc_engine::DocCatalog;
use crate::shared_types::{HitOrigin, ItemKind, SymbolSearchResult};
use search::{kind_matches, score};

/// In-memory symbol index (O(N) scan per query, N = records).
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    items: Vec<SymbolRecord>,
}

/// Internal lightweight record used for searching.
#[derive(Debug, Clone)]
pub(crate) struct SymbolRecord {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) kind: Option<ItemKind>,
    pub(crate) doc: Option<String>,
    pub(crate) module_path: String,
    pub(crate) origin: HitOrigin,
    pub(crate) symbol: Option<String>,
}

impl SymbolIndex {
    /// Build the index from every alias record and sidebar entry of `catalog`.
    pub fn from_catalog(catalog: &DocCatalog) -> Self {
        let mut items = Vec::new();

        for (_, map) in catalog.aliases.iter() {
            for (token, entries) in map.iter() {
                items.extend(entries.iter().map(|e| SymbolRecord {
                    name: e.name.clone(),
                    path: e.qualified_path(),
                    kind: e.kind(),
                    doc: Some(e.desc.clone()).filter(|s| !s.is_empty()),
                    module_path: e.path.clone(),
                    origin: HitOrigin::Alias,
                    symbol: Some(token.to_string()),
                }));
            }
        }

        for (module, index) in &catalog.sidebars {
            for (category, entries) in index.iter() {
                let kind = ItemKind::from_category(category);
                items.extend(entries.iter().map(|e| SymbolRecord {
                    name: e.name.clone(),
                    path: format!("{module}::{}", e.name),
                    kind,
                    doc: Some(e.desc.clone()).filter(|s| !s.is_empty()),
                    module_path: module.clone(),
                    origin: HitOrigin::Sidebar,
                    symbol: None,
                }));
            }
        }

        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Search by name, path or alias token.
    ///
    /// `kinds` filters by sidebar category (`fn`) or kind name (`function`).
    /// Results are ordered by score, then path; the same path/kind/origin is
    /// reported once.
    pub fn search(
        &self,
        query: &str,
        kinds: Option<&[String]>,
        limit: usize,
    ) -> Vec<SymbolSearchResult> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let q = query.to_lowercase();

        let mut scored: Vec<(f32, &SymbolRecord)> = self
            .items
            .iter()
            .filter(|rec| kinds.map(|ks| kind_matches(rec.kind, ks)).unwrap_or(true))
            .filter_map(|rec| {
                let s = score(rec, query, &q);
                (s > 0.0).then_some((s, rec))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.path.cmp(&b.1.path))
        });

        let mut seen = HashSet::new();
        scored
            .into_iter()
            .filter(|(_, rec)| seen.insert((rec.path.as_str(), rec.kind, rec.origin)))
            .take(limit)
            .map(|(score, rec)| SymbolSearchResult {
                name: rec.name.clone(),
                path: rec.path.clone(),
                kind: rec.kind,
                score,
                doc_summary: rec.doc.clone(),
                module_path: rec.module_path.clone(),
                origin: rec.origin,
                symbol: rec.symbol.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared_types::{AliasEntry, AliasTable, OperatorAliasMap, SidebarEntry, SidebarIndex};
    use indexmap::IndexMap;

    fn index() -> SymbolIndex {
        let add = |name: &str, path: &str| AliasEntry {
            krate: "nom".into(),
            ty: 8,
            name: name.into(),
            desc: format!("The {name} trait."),
            path: path.into(),
        };
        let mut nom = OperatorAliasMap::new();
        nom.insert(
            "==",
            vec![
                add("PartialEq", "nom::lib::std::cmp"),
                add("PartialEq", "nom::lib::std::cmp"),
                add("PartialEq", "nom::lib::std::prelude::v1"),
            ],
        );
        nom.insert("+", vec![add("Add", "nom::lib::std::ops")]);
        let mut aliases = AliasTable::new();
        aliases.insert_library("nom", nom);

        let mut fb = SidebarIndex::new();
        fb.insert("struct", vec![SidebarEntry::new("Framebuffer", "")]);
        fb.insert(
            "fn",
            vec![SidebarEntry::new("ensure_image_view_compatible", "Checks.")],
        );
        let mut sidebars = IndexMap::new();
        sidebars.insert("vulkano::framebuffer".to_string(), fb);

        SymbolIndex::from_catalog(&DocCatalog::new("/doc", aliases, sidebars))
    }

    #[test]
    fn test_index_size() {
        assert_eq!(index().len(), 6);
    }

    #[test]
    fn test_exact_name_ranks_first() {
        let results = index().search("framebuffer", None, 10);
        assert_eq!(results[0].name, "Framebuffer");
        assert_eq!(results[0].score, 1.0);
        assert_eq!(results[0].origin, HitOrigin::Sidebar);
        // The function only matches through its module path.
        assert!(results
            .iter()
            .any(|r| r.name == "ensure_image_view_compatible" && r.score == 0.5));
    }

    #[test]
    fn test_alias_token_search_collapses_duplicates() {
        let results = index().search("==", None, 10);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.symbol.as_deref() == Some("==")));
        assert_eq!(results[0].path, "nom::lib::std::cmp::PartialEq");
        assert_eq!(results[1].path, "nom::lib::std::prelude::v1::PartialEq");
    }

    #[test]
    fn test_kind_filter() {
        let idx = index();
        let only_fns = idx.search("e", Some(&["fn".to_string()]), 10);
        assert!(only_fns.iter().all(|r| r.kind == Some(ItemKind::Function)));
        assert!(!only_fns.is_empty());
        let traits = idx.search("add", Some(&["trait".to_string()]), 10);
        assert_eq!(traits.len(), 1);
    }

    #[test]
    fn test_empty_query_and_limit() {
        let idx = index();
        assert!(idx.search("", None, 10).is_empty());
        assert!(idx.search("   ", None, 10).is_empty());
        assert!(idx.search("Framebuffer", None, 0).is_empty());
        assert_eq!(idx.search("e", None, 1).len(), 1);
    }
}
