//! docstatic library
//!
//! Reads, validates, searches and rewrites the static index files rustdoc
//! emits (`aliases.js` and per-module `sidebar-items.js`), and serves them
//! over MCP.

pub use crate::server::{
    CacheStatsParams, DocStaticMcpServer, GetSidebarParams, ListLibrariesParams,
    LookupAliasParams, SearchSymbolsParams, ValidateIndexParams,
};

// Re-export commonly used dependencies for tests
pub use rmcp;
pub use serde_json;

pub mod doc_engine;
pub mod index_core;
pub mod js_literal;
pub mod server;
pub mod shared_types;
