use std::path::Path;

use docstatic::doc_engine::cache::Cache;
use docstatic::doc_engine::types::{CacheConfig, CacheOperation};
use docstatic::doc_engine::{DocCatalog, DocEngine};
use docstatic::shared_types::{AliasTable, SidebarEntry, SidebarIndex};
use indexmap::IndexMap;
use tempfile::tempdir;

fn fixture_root() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/doc")
}

/// Helper to build a one-module catalog for tests
fn sample_catalog() -> DocCatalog {
    let mut sidebar = SidebarIndex::new();
    sidebar.insert(
        "fn",
        vec![SidebarEntry::new(
            "ensure_image_view_compatible",
            "Checks whether the given image view is allowed.",
        )],
    );
    let mut sidebars = IndexMap::new();
    sidebars.insert("vulkano::framebuffer".to_string(), sidebar);
    DocCatalog::new("/doc", AliasTable::new(), sidebars)
}

#[test]
fn test_cache_creation() {
    let temp_dir = tempdir().unwrap();
    let cache = Cache::new(temp_dir.path());
    assert!(cache.is_ok());
    assert!(temp_dir.path().join("catalogs").is_dir());
}

#[test]
fn test_cache_with_config() {
    let temp_dir = tempdir().unwrap();
    let config = CacheConfig {
        max_memory_entries: 500,
        enable_compression: false,
        ..Default::default()
    };
    let cache = Cache::with_config(temp_dir.path(), config);
    assert!(cache.is_ok());
}

#[test]
fn test_catalog_cache_roundtrip() {
    let temp_dir = tempdir().unwrap();
    let cache = Cache::new(temp_dir.path()).unwrap();
    let catalog = sample_catalog();

    cache.store("fingerprint", &catalog).unwrap();
    let retrieved = cache.get("fingerprint").unwrap().expect("cached");
    assert_eq!(retrieved, catalog);
    assert_eq!(
        retrieved.sidebar_category("vulkano::framebuffer", "fn")[0].name,
        "ensure_image_view_compatible"
    );
}

#[test]
fn test_cache_miss_behavior() {
    let temp_dir = tempdir().unwrap();
    let cache = Cache::new(temp_dir.path()).unwrap();

    assert!(cache.get("nonexistent").unwrap().is_none());
    let stats = cache.get_stats().unwrap();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate, 0.0);
}

#[test]
fn test_clear_all() {
    let temp_dir = tempdir().unwrap();
    let cache = Cache::new(temp_dir.path()).unwrap();
    cache.store("a", &sample_catalog()).unwrap();

    let result = cache.clear_all().unwrap();
    assert_eq!(result.operation, CacheOperation::Clear);
    assert!(result.success);
    assert_eq!(result.items_affected, 1);
    assert!(result.size_freed_bytes > 0);
    assert!(cache.get("a").unwrap().is_none());
}

#[test]
fn test_cleanup_expired_entries_keeps_fresh_entries() {
    let temp_dir = tempdir().unwrap();
    let config = CacheConfig {
        entry_ttl_hours: 1,
        ..Default::default()
    };
    let cache = Cache::with_config(temp_dir.path(), config).unwrap();
    cache.store("fresh", &sample_catalog()).unwrap();

    let result = cache.cleanup_expired_entries().unwrap();
    assert_eq!(result.operation, CacheOperation::Cleanup);
    assert_eq!(result.items_affected, 0);
    assert_eq!(cache.get_stats().unwrap().disk_entries, 1);
    assert!(cache.get("fresh").unwrap().is_some());
}

#[tokio::test]
async fn test_engine_reuses_disk_cache() {
    let temp_dir = tempdir().unwrap();

    let first = DocEngine::new(temp_dir.path()).await.unwrap();
    let loaded = first.load(&fixture_root()).await.unwrap();
    assert_eq!(first.get_cache_stats().await.unwrap().disk_entries, 1);

    let second = DocEngine::new(temp_dir.path()).await.unwrap();
    let reloaded = second.load(&fixture_root()).await.unwrap();
    let stats = second.get_cache_stats().await.unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 0);
    assert_eq!(reloaded.catalog, loaded.catalog);
}

#[tokio::test]
async fn test_engine_clear_and_cleanup() {
    let temp_dir = tempdir().unwrap();
    let engine = DocEngine::new(temp_dir.path()).await.unwrap();
    engine.load(&fixture_root()).await.unwrap();

    let cleanup = engine.cleanup_expired_cache().await.unwrap();
    assert_eq!(cleanup.operation, CacheOperation::Cleanup);
    assert_eq!(cleanup.items_affected, 0);

    let cleared = engine.clear_all_cache().await.unwrap();
    assert_eq!(cleared.items_affected, 1);
    let stats = engine.get_cache_stats().await.unwrap();
    assert_eq!(stats.memory_entries, 0);
    assert_eq!(stats.disk_entries, 0);
}
