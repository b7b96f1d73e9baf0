//! Shared canonical type definitions for docstatic.
//!
//! rustdoc writes two static index shapes next to the rendered pages:
//! - `aliases.js`: per library, a map from a search token (usually an
//!   operator such as `+=` or `[]`) to the items that carry that alias.
//! - `sidebar-items.js`: per module, the documented items grouped by kind.
//!
//! The types here are the single source of truth for both shapes. Field and
//! key names follow what the generator emits so JSON stays interchangeable
//! with the original files. Map and list order is always the generator's.
//!
//! SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Category of a documented item, in rustdoc's numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Module,
    ExternCrate,
    Import,
    Struct,
    Enum,
    Function,
    Typedef,
    Static,
    Trait,
    Impl,
    TyMethod,
    Method,
    StructField,
    Variant,
    Macro,
    Primitive,
    AssocType,
    Constant,
    AssocConst,
    Union,
    ForeignType,
    Keyword,
    OpaqueTy,
    ProcAttribute,
    ProcDerive,
    TraitAlias,
}

impl ItemKind {
    /// Every kind, indexed by its numeric code.
    pub const ALL: [ItemKind; 26] = [
        ItemKind::Module,
        ItemKind::ExternCrate,
        ItemKind::Import,
        ItemKind::Struct,
        ItemKind::Enum,
        ItemKind::Function,
        ItemKind::Typedef,
        ItemKind::Static,
        ItemKind::Trait,
        ItemKind::Impl,
        ItemKind::TyMethod,
        ItemKind::Method,
        ItemKind::StructField,
        ItemKind::Variant,
        ItemKind::Macro,
        ItemKind::Primitive,
        ItemKind::AssocType,
        ItemKind::Constant,
        ItemKind::AssocConst,
        ItemKind::Union,
        ItemKind::ForeignType,
        ItemKind::Keyword,
        ItemKind::OpaqueTy,
        ItemKind::ProcAttribute,
        ItemKind::ProcDerive,
        ItemKind::TraitAlias,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Sidebar category key used by rustdoc for this kind (`fn`, `struct`, ...).
    pub fn category(self) -> &'static str {
        match self {
            ItemKind::Module => "mod",
            ItemKind::ExternCrate => "externcrate",
            ItemKind::Import => "import",
            ItemKind::Struct => "struct",
            ItemKind::Enum => "enum",
            ItemKind::Function => "fn",
            ItemKind::Typedef => "type",
            ItemKind::Static => "static",
            ItemKind::Trait => "trait",
            ItemKind::Impl => "impl",
            ItemKind::TyMethod => "tymethod",
            ItemKind::Method => "method",
            ItemKind::StructField => "structfield",
            ItemKind::Variant => "variant",
            ItemKind::Macro => "macro",
            ItemKind::Primitive => "primitive",
            ItemKind::AssocType => "associatedtype",
            ItemKind::Constant => "constant",
            ItemKind::AssocConst => "associatedconstant",
            ItemKind::Union => "union",
            ItemKind::ForeignType => "foreigntype",
            ItemKind::Keyword => "keyword",
            ItemKind::OpaqueTy => "opaque",
            ItemKind::ProcAttribute => "attr",
            ItemKind::ProcDerive => "derive",
            ItemKind::TraitAlias => "traitalias",
        }
    }

    pub fn from_category(category: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.category() == category)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

/// One cross-reference record of an alias table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AliasEntry {
    #[serde(rename = "crate")]
    pub krate: String,
    /// Raw item-kind code. Any integer loads, so unknown or out-of-range
    /// codes survive a round trip and are left to validation.
    pub ty: i64,
    pub name: String,
    pub desc: String,
    #[serde(rename = "p")]
    pub path: String,
}

impl AliasEntry {
    pub fn kind(&self) -> Option<ItemKind> {
        u8::try_from(self.ty).ok().and_then(ItemKind::from_code)
    }

    /// `path::name`, or just the name when the path is empty.
    pub fn qualified_path(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.path, self.name)
        }
    }
}

/// Token → alias records for one library.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(transparent)]
pub struct OperatorAliasMap {
    tokens: IndexMap<String, Vec<AliasEntry>>,
}

impl OperatorAliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &str) -> Option<&[AliasEntry]> {
        self.tokens.get(token).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, token: &str) -> Option<&mut Vec<AliasEntry>> {
        self.tokens.get_mut(token)
    }

    pub fn insert(&mut self, token: impl Into<String>, entries: Vec<AliasEntry>) {
        self.tokens.insert(token.into(), entries);
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AliasEntry])> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Total number of records across all tokens.
    pub fn entry_count(&self) -> usize {
        self.tokens.values().map(Vec::len).sum()
    }
}

/// Library name → its token map. The in-memory form of `ALIASES`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(transparent)]
pub struct AliasTable {
    libraries: IndexMap<String, OperatorAliasMap>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn library(&self, name: &str) -> Option<&OperatorAliasMap> {
        self.libraries.get(name)
    }

    pub fn library_mut(&mut self, name: &str) -> Option<&mut OperatorAliasMap> {
        self.libraries.get_mut(name)
    }

    pub fn insert_library(&mut self, name: impl Into<String>, map: OperatorAliasMap) {
        self.libraries.insert(name.into(), map);
    }

    /// Records for `token` in `library`; empty when either is absent.
    pub fn lookup(&self, library: &str, token: &str) -> &[AliasEntry] {
        self.libraries
            .get(library)
            .and_then(|m| m.get(token))
            .unwrap_or(&[])
    }

    /// Records for `token` across every library, in table order.
    pub fn lookup_all(&self, token: &str) -> Vec<(&str, &AliasEntry)> {
        self.libraries
            .iter()
            .filter_map(|(lib, map)| map.get(token).map(|entries| (lib.as_str(), entries)))
            .flat_map(|(lib, entries)| entries.iter().map(move |e| (lib, e)))
            .collect()
    }

    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OperatorAliasMap)> {
        self.libraries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` into `self`; a library present in both takes `other`'s map.
    pub fn merge(&mut self, other: AliasTable) {
        for (name, map) in other.libraries {
            self.libraries.insert(name, map);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn entry_count(&self) -> usize {
        self.libraries.values().map(OperatorAliasMap::entry_count).sum()
    }
}

/// A `[name, description]` pair in a sidebar index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct SidebarEntry {
    pub name: String,
    pub desc: String,
}

impl SidebarEntry {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
        }
    }
}

impl From<(String, String)> for SidebarEntry {
    fn from((name, desc): (String, String)) -> Self {
        Self { name, desc }
    }
}

impl From<SidebarEntry> for (String, String) {
    fn from(entry: SidebarEntry) -> Self {
        (entry.name, entry.desc)
    }
}

/// Category → items for one module's navigation sidebar.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SidebarIndex {
    categories: IndexMap<String, Vec<SidebarEntry>>,
}

impl SidebarIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: impl Into<String>, entries: Vec<SidebarEntry>) {
        self.categories.insert(category.into(), entries);
    }

    /// Entries under `category`; empty when the category is absent.
    pub fn category(&self, category: &str) -> &[SidebarEntry] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SidebarEntry])> {
        self.categories
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every `(category, entry)` whose entry is named `name`.
    pub fn find(&self, name: &str) -> Vec<(&str, &SidebarEntry)> {
        self.iter()
            .flat_map(|(cat, entries)| entries.iter().map(move |e| (cat, e)))
            .filter(|(_, e)| e.name == name)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

/// Where a search hit came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HitOrigin {
    Alias,
    Sidebar,
}

/// Alias lookup hit, tagged with the library table it was found in.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AliasHit {
    pub library: String,
    pub symbol: String,
    pub entry: AliasEntry,
}

/// Symbol search result (post-query scoring).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SymbolSearchResult {
    pub name: String,
    pub path: String,
    pub kind: Option<ItemKind>,
    pub score: f32,
    pub doc_summary: Option<String>,
    pub module_path: String,
    pub origin: HitOrigin,
    /// Alias token that produced the hit, for alias-origin results.
    pub symbol: Option<String>,
}

/// Counts describing a loaded catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CatalogSummary {
    pub root: String,
    pub libraries: usize,
    pub alias_tokens: usize,
    pub alias_entries: usize,
    pub modules: usize,
    pub sidebar_entries: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One finding of a shape check.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// e.g. `ALIASES["nom"]["+"][1]` or `vulkano::framebuffer["fn"][0]`.
    pub location: String,
    pub message: String,
}

/// Result of checking a whole catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationReport {
    pub alias_entries_checked: usize,
    pub sidebar_entries_checked: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }
}
