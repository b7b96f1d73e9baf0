//! End-to-end tests for loading a rustdoc output tree.
//!
//! The fixture under `tests/fixtures/doc` is a trimmed copy of a real
//! generated tree: one `aliases.js`, two legacy `initSidebarItems` sidebars,
//! one `window.SIDEBAR_ITEMS` sidebar, and a `src/` directory that must be
//! ignored.

use std::path::{Path, PathBuf};

use docstatic::doc_engine::{DocCatalog, DocEngine, DocEngineOptions, ExportFormat};
use docstatic::shared_types::{HitOrigin, ItemKind};
use tempfile::TempDir;

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/doc")
}

async fn engine() -> (DocEngine, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let engine = DocEngine::new(temp_dir.path()).await.unwrap();
    (engine, temp_dir)
}

#[tokio::test]
async fn test_nom_plus_has_two_trait_entries() {
    let (engine, _tmp) = engine().await;
    let table = engine.aliases(&fixture_root()).await.unwrap();

    let plus = table.lookup("nom", "+");
    assert_eq!(plus.len(), 2);
    assert!(plus.iter().all(|e| e.krate == "nom" && e.ty == 8));
    let names: Vec<_> = plus.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["AddAssign", "Add"]);
    assert_eq!(plus[1].qualified_path(), "nom::lib::std::ops::Add");
}

#[tokio::test]
async fn test_adler32_alias_table_is_empty() {
    let (engine, _tmp) = engine().await;
    let table = engine.aliases(&fixture_root()).await.unwrap();

    let adler = table.library("adler32").expect("adler32 is declared");
    assert!(adler.is_empty());
    assert!(table.lookup("adler32", "+").is_empty());
    assert!(table.lookup("not_a_library", "+").is_empty());
}

#[tokio::test]
async fn test_framebuffer_fn_category() {
    let (engine, _tmp) = engine().await;
    let (module, index) = engine
        .sidebar(&fixture_root(), "framebuffer", None)
        .await
        .unwrap()
        .expect("framebuffer sidebar");

    assert_eq!(module, "vulkano::framebuffer");
    let fns = index.category("fn");
    assert_eq!(fns.len(), 1);
    assert_eq!(fns[0].name, "ensure_image_view_compatible");
    assert_eq!(
        index.categories().collect::<Vec<_>>(),
        ["enum", "fn", "struct", "trait"]
    );
    assert_eq!(index.category("struct")[2].name, "Framebuffer");
}

#[tokio::test]
async fn test_sidebar_category_filter() {
    let (engine, _tmp) = engine().await;
    let (_, index) = engine
        .sidebar(&fixture_root(), "vulkano::framebuffer", Some("trait"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(index.categories().collect::<Vec<_>>(), ["trait"]);
    assert_eq!(index.category("trait").len(), 7);

    let missing = engine
        .sidebar(&fixture_root(), "vulkano::nope", None)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_modern_sidebar_names_only() {
    let (engine, _tmp) = engine().await;
    let (_, index) = engine
        .sidebar(&fixture_root(), "adler32", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(index.category("struct")[0].name, "RollingAdler32");
    assert_eq!(index.category("struct")[0].desc, "");
}

#[tokio::test]
async fn test_source_directories_are_skipped() {
    let (engine, _tmp) = engine().await;
    let docs = engine.load(&fixture_root()).await.unwrap();
    let modules: Vec<_> = docs.catalog.modules().collect();
    assert!(!modules.iter().any(|m| m.starts_with("src")));
    assert_eq!(modules.len(), 3);
}

#[tokio::test]
async fn test_summary_and_libraries() {
    let (engine, _tmp) = engine().await;
    let summary = engine.summary(&fixture_root()).await.unwrap();
    assert_eq!(summary.libraries, 4);
    assert_eq!(summary.alias_tokens, 5);
    assert_eq!(summary.alias_entries, 11);
    assert_eq!(summary.modules, 3);
    assert_eq!(summary.sidebar_entries, 43);

    let docs = engine.load(&fixture_root()).await.unwrap();
    assert_eq!(
        docs.catalog.libraries(),
        ["adler32", "approx", "nom", "vulkano"]
    );
}

#[tokio::test]
async fn test_duplicate_alias_records_are_kept() {
    let (engine, _tmp) = engine().await;
    let hits = engine
        .lookup_alias(&fixture_root(), None, "==")
        .await
        .unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.iter().all(|h| h.library == "nom" && h.symbol == "=="));
    assert_eq!(hits[0].entry.path, "nom::lib::std::cmp");
    assert_eq!(hits[2].entry.path, "nom::lib::std::prelude::v1::v1");
    assert_eq!(hits[0].entry.name, hits[2].entry.name);
}

#[tokio::test]
async fn test_fixture_validates_cleanly() {
    let (engine, _tmp) = engine().await;
    let report = engine.validate(&fixture_root()).await.unwrap();
    assert!(report.is_ok(), "{:?}", report.issues);
    assert!(report.issues.is_empty());
    assert_eq!(report.alias_entries_checked, 11);
    assert_eq!(report.sidebar_entries_checked, 43);
}

#[tokio::test]
async fn test_search_across_sources() {
    let (engine, _tmp) = engine().await;
    let root = fixture_root();

    let results = engine
        .search_symbols(&root, "framebuffer", None, 50)
        .await
        .unwrap();
    assert_eq!(results[0].path, "vulkano::framebuffer::Framebuffer");
    assert_eq!(results[0].kind, Some(ItemKind::Struct));

    let ranges = engine
        .search_symbols(&root, "..=", None, 10)
        .await
        .unwrap();
    assert_eq!(ranges.len(), 2);
    assert!(ranges.iter().all(|r| r.origin == HitOrigin::Alias));
    assert!(ranges.iter().all(|r| r.kind == Some(ItemKind::Struct)));

    let kinds = vec!["fn".to_string()];
    let fns = engine
        .search_symbols(&root, "a", Some(&kinds), 50)
        .await
        .unwrap();
    let names: Vec<_> = fns.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["adler32", "ensure_image_view_compatible"]);
}

#[tokio::test]
async fn test_js_export_round_trip() {
    let (engine, _tmp) = engine().await;
    let out = TempDir::new().unwrap();
    engine
        .export(&fixture_root(), out.path(), ExportFormat::Js)
        .await
        .unwrap();

    assert!(out.path().join("aliases.js").is_file());
    assert!(out
        .path()
        .join("vulkano/command_buffer/sys/sidebar-items.js")
        .is_file());

    let original = engine.load(&fixture_root()).await.unwrap();
    let reloaded = engine.load(out.path()).await.unwrap();
    assert_eq!(reloaded.catalog.aliases, original.catalog.aliases);
    assert_eq!(reloaded.catalog.sidebars, original.catalog.sidebars);
}

#[tokio::test]
async fn test_json_export_round_trip() {
    let (engine, _tmp) = engine().await;
    let out = TempDir::new().unwrap();
    engine
        .export(&fixture_root(), out.path(), ExportFormat::Json)
        .await
        .unwrap();

    let json = std::fs::read_to_string(out.path().join("catalog.json")).unwrap();
    let decoded: DocCatalog = serde_json::from_str(&json).unwrap();
    let original = engine.load(&fixture_root()).await.unwrap();
    assert_eq!(decoded.aliases, original.catalog.aliases);
    assert_eq!(decoded.sidebars, original.catalog.sidebars);
}

#[tokio::test]
async fn test_missing_root_is_an_error() {
    let (engine, tmp) = engine().await;
    let err = engine
        .load(&tmp.path().join("does-not-exist"))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("not a directory"));
}

#[tokio::test]
async fn test_without_disk_cache() {
    let temp_dir = TempDir::new().unwrap();
    let options = DocEngineOptions {
        use_disk_cache: false,
        ..Default::default()
    };
    let engine = DocEngine::new_with_options(temp_dir.path(), options)
        .await
        .unwrap();
    engine.load(&fixture_root()).await.unwrap();

    let stats = engine.get_cache_stats().await.unwrap();
    assert_eq!(stats.disk_entries, 0);
    assert_eq!(stats.memory_entries, 1);
}
