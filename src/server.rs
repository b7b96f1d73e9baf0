//! rustdoc static index MCP server
//!
//! A Model Context Protocol server that answers questions about a rustdoc
//! output tree: operator aliases, per-module sidebars, and symbol search.

use crate::doc_engine::DocEngine;
use anyhow::Result;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ErrorData, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DocStaticMcpServer {
    engine: Arc<DocEngine>,
    doc_root: Arc<PathBuf>,
    tool_router: ToolRouter<Self>,
}

impl DocStaticMcpServer {
    pub async fn new(
        cache_dir: impl AsRef<Path>,
        doc_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let engine = Arc::new(DocEngine::new(cache_dir).await?);
        Ok(Self::from_engine(engine, doc_root))
    }

    /// Share one engine (and its caches) between several server instances.
    pub fn from_engine(engine: Arc<DocEngine>, doc_root: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            doc_root: Arc::new(doc_root.into()),
            tool_router: Self::tool_router(),
        }
    }

    pub fn doc_root(&self) -> &Path {
        &self.doc_root
    }
}

// Parameter structures for each tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListLibrariesParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LookupAliasParams {
    /// Alias token, usually an operator such as `+=` or `[]`.
    pub symbol: String,
    /// Restrict the lookup to one library's table.
    pub library: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetSidebarParams {
    /// Module path such as `vulkano::framebuffer`, or a unique suffix of one.
    pub module_path: String,
    /// Sidebar category key (`fn`, `struct`, `enum`, ...).
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchSymbolsParams {
    pub query: String,
    pub kinds: Option<Vec<String>>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidateIndexParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsParams {}

/// Utility to validate library (crate) names
fn validate_library_name(name: &str) -> Result<(), ErrorData> {
    if name.is_empty() {
        return Err(ErrorData::invalid_params(
            "Library name cannot be empty",
            None,
        ));
    }

    if name.len() > 64 {
        return Err(ErrorData::invalid_params(
            "Library name too long (max 64 characters)",
            None,
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ErrorData::invalid_params(
            "Library name contains invalid characters",
            None,
        ));
    }

    Ok(())
}

/// Utility to validate module paths
fn validate_module_path(path: &str) -> Result<(), ErrorData> {
    if path.is_empty() {
        return Err(ErrorData::invalid_params("Module path cannot be empty", None));
    }

    if path.len() > 512 {
        return Err(ErrorData::invalid_params(
            "Module path too long (max 512 characters)",
            None,
        ));
    }

    for part in path.split("::") {
        if part.is_empty() {
            return Err(ErrorData::invalid_params(
                "Module path contains empty segments",
                None,
            ));
        }
        if !part.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(ErrorData::invalid_params(
                format!("Invalid identifier in path: {part}"),
                None,
            ));
        }
    }

    Ok(())
}

/// Alias tokens are free-form but short and single-line.
fn validate_symbol(symbol: &str) -> Result<(), ErrorData> {
    if symbol.trim().is_empty() {
        return Err(ErrorData::invalid_params("Symbol cannot be empty", None));
    }
    if symbol.len() > 64 {
        return Err(ErrorData::invalid_params(
            "Symbol too long (max 64 characters)",
            None,
        ));
    }
    if symbol.chars().any(char::is_control) {
        return Err(ErrorData::invalid_params(
            "Symbol contains control characters",
            None,
        ));
    }
    Ok(())
}

fn json_result(value: &impl Serialize) -> Result<CallToolResult, ErrorData> {
    let json_content = serde_json::to_string(value)
        .map_err(|e| ErrorData::internal_error(format!("Serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json_content)]))
}

async fn with_timeout<T>(
    what: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T, ErrorData> {
    tokio::time::timeout(LOAD_TIMEOUT, fut)
        .await
        .map_err(|_| {
            tracing::warn!("Timeout in {}", what);
            ErrorData::internal_error(format!("Timeout in {what}"), None)
        })?
        .map_err(|e| {
            tracing::error!("Error in {}: {:#}", what, e);
            ErrorData::internal_error(format!("Failed to {what}: {e:#}"), None)
        })
}

#[tool_router]
impl DocStaticMcpServer {
    /// List the libraries that have alias tables or sidebars
    #[tool(description = "List documented libraries with catalog counts")]
    pub async fn list_libraries(
        &self,
        _params: Parameters<ListLibrariesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let docs = with_timeout("load documentation", self.engine.load(&self.doc_root)).await?;

        json_result(&serde_json::json!({
            "libraries": docs.catalog.libraries(),
            "summary": docs.catalog.summary(),
        }))
    }

    /// Look up the items carrying an alias
    #[tool(
        description = "Look up the items carrying a search alias (e.g. an operator like '+=' or '[]'), optionally in one library"
    )]
    pub async fn lookup_alias(
        &self,
        params: Parameters<LookupAliasParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let LookupAliasParams { symbol, library } = params.0;

        validate_symbol(&symbol)?;
        if let Some(lib) = &library {
            validate_library_name(lib)?;
        }

        tracing::info!("MCP lookup_alias: symbol={:?}, library={:?}", symbol, library);

        let hits = with_timeout(
            "look up alias",
            self.engine
                .lookup_alias(&self.doc_root, library.as_deref(), &symbol),
        )
        .await?;

        json_result(&hits)
    }

    /// Get the sidebar index of a module
    #[tool(description = "Get the items of a module grouped by kind, optionally one category only")]
    pub async fn get_sidebar(
        &self,
        params: Parameters<GetSidebarParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let GetSidebarParams {
            module_path,
            category,
        } = params.0;

        validate_module_path(&module_path)?;
        if let Some(cat) = &category {
            if cat.is_empty() || !cat.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(ErrorData::invalid_params(
                    format!("Invalid sidebar category: {cat:?}"),
                    None,
                ));
            }
        }

        let found = with_timeout(
            "get sidebar",
            self.engine
                .sidebar(&self.doc_root, &module_path, category.as_deref()),
        )
        .await?;

        let Some((module, index)) = found else {
            return Err(ErrorData::invalid_params(
                format!("No sidebar found for module {module_path}"),
                None,
            ));
        };

        json_result(&serde_json::json!({
            "module": module,
            "items": index,
        }))
    }

    /// Search symbols across alias tables and sidebars
    #[tool(description = "Search item names, paths and alias tokens across the documentation tree")]
    pub async fn search_symbols(
        &self,
        params: Parameters<SearchSymbolsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let SearchSymbolsParams {
            query,
            kinds,
            limit,
        } = params.0;

        if query.trim().is_empty() {
            return Err(ErrorData::invalid_params(
                "Search query cannot be empty",
                None,
            ));
        }

        if query.len() > 256 {
            return Err(ErrorData::invalid_params(
                "Search query too long (max 256 characters)",
                None,
            ));
        }

        let search_limit = limit.unwrap_or(20);
        if search_limit > 100 {
            return Err(ErrorData::invalid_params(
                "Search limit too large (max 100)",
                None,
            ));
        }

        let results = with_timeout(
            "search symbols",
            self.engine.search_symbols(
                &self.doc_root,
                &query,
                kinds.as_deref(),
                search_limit as usize,
            ),
        )
        .await?;

        json_result(&results)
    }

    /// Check the loaded indexes for malformed records
    #[tool(description = "Validate alias tables and sidebars and report malformed records")]
    pub async fn validate_index(
        &self,
        _params: Parameters<ValidateIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let report = with_timeout("validate index", self.engine.validate(&self.doc_root)).await?;
        json_result(&report)
    }

    /// Get cache statistics
    #[tool(description = "Get cache statistics and performance metrics")]
    pub async fn cache_stats(
        &self,
        _params: Parameters<CacheStatsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let stats = with_timeout("get cache stats", self.engine.get_cache_stats()).await?;
        json_result(&stats)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for DocStaticMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "docstatic".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "rustdoc static index server - Query the alias tables and module sidebars of a generated documentation tree. Use list_libraries for an overview, lookup_alias to find the items behind an operator or search alias, get_sidebar for a module's items by kind, search_symbols for name search, validate_index to check the tree, and cache_stats for cache statistics."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_library_name() {
        assert!(validate_library_name("nom").is_ok());
        assert!(validate_library_name("adler32").is_ok());
        assert!(validate_library_name("serde-json").is_ok());
        assert!(validate_library_name("").is_err());
        assert!(validate_library_name("no m").is_err());
        assert!(validate_library_name(&"a".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_module_path() {
        assert!(validate_module_path("vulkano::framebuffer").is_ok());
        assert!(validate_module_path("nom").is_ok());
        assert!(validate_module_path("").is_err());
        assert!(validate_module_path("vulkano::").is_err());
        assert!(validate_module_path("a::::b").is_err());
        assert!(validate_module_path("a/b").is_err());
        assert!(validate_module_path(&"a".repeat(1000)).is_err());
    }

    #[test]
    fn test_validate_symbol() {
        assert!(validate_symbol("+=").is_ok());
        assert!(validate_symbol("[]").is_ok());
        assert!(validate_symbol("==").is_ok());
        assert!(validate_symbol("  ").is_err());
        assert!(validate_symbol("a\nb").is_err());
        assert!(validate_symbol(&"+".repeat(65)).is_err());
    }
}
