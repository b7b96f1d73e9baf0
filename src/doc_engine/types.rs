//! Type definitions for the documentation engine

use serde::{Deserialize, Serialize};

/// Configuration options for the documentation engine.
#[derive(Debug, Clone)]
pub struct DocEngineOptions {
    /// Read and write parsed catalogs under the cache directory.
    pub use_disk_cache: bool,
    pub cache: CacheConfig,
}

impl Default for DocEngineOptions {
    fn default() -> Self {
        Self {
            use_disk_cache: true,
            cache: CacheConfig::default(),
        }
    }
}

/// Cache configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Parsed catalogs kept in memory.
    pub max_memory_entries: usize,
    pub entry_ttl_hours: u64,
    pub enable_compression: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_memory_entries: 16,
            entry_ttl_hours: 168, // 1 week
            enable_compression: true,
        }
    }
}

/// Cache statistics and metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CacheStatistics {
    pub memory_entries: usize,
    pub disk_entries: usize,
    pub disk_size_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub oldest_entry_age_hours: f64,
}

/// Cache management operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CacheOperation {
    Clear,
    Cleanup,
}

/// Cache management result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheOperationResult {
    pub operation: CacheOperation,
    pub success: bool,
    pub message: String,
    pub items_affected: usize,
    pub size_freed_bytes: u64,
}

/// Output layout for exported catalogs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `aliases.js` plus a `sidebar-items.js` tree.
    #[default]
    Js,
    /// One `catalog.json`.
    Json,
}
