//! Documentation engine: discovers, loads, caches and queries the static
//! index files of rustdoc output directories.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use indexmap::IndexMap;
use lru::LruCache;
use rayon::prelude::*;
use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

pub mod cache;
pub mod catalog;
pub mod finder;
pub mod loader;
pub mod types;
pub mod validate;
pub mod writer;

pub use catalog::DocCatalog;
pub use types::*;

use crate::index_core::SymbolIndex;
use crate::shared_types::{
    AliasHit, AliasTable, CatalogSummary, SidebarIndex, SymbolSearchResult, ValidationReport,
};
use finder::DocLayout;

/// A loaded catalog together with its search index.
#[derive(Debug)]
pub struct LoadedDocs {
    pub catalog: DocCatalog,
    pub symbols: SymbolIndex,
}

impl LoadedDocs {
    fn new(catalog: DocCatalog) -> Self {
        let symbols = SymbolIndex::from_catalog(&catalog);
        Self { catalog, symbols }
    }
}

/// Main engine that coordinates discovery, parsing and caching
#[derive(Debug, Clone)]
pub struct DocEngine {
    cache: Arc<cache::Cache>,
    memory_cache: Arc<Mutex<LruCache<String, Arc<LoadedDocs>>>>,
    use_disk_cache: bool,
}

impl DocEngine {
    /// Create a new documentation engine
    pub async fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        Self::new_with_options(cache_dir, DocEngineOptions::default()).await
    }

    /// Create a new documentation engine with explicit options.
    pub async fn new_with_options(
        cache_dir: impl AsRef<Path>,
        options: DocEngineOptions,
    ) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        fs::create_dir_all(cache_dir)
            .await
            .context("Failed to create cache directory")?;

        let capacity = NonZeroUsize::new(options.cache.max_memory_entries.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        let cache = Arc::new(cache::Cache::with_config(cache_dir, options.cache)?);

        Ok(Self {
            cache,
            memory_cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            use_disk_cache: options.use_disk_cache,
        })
    }

    /// Load (or reuse) the documentation under `root`.
    ///
    /// The tree is rescanned on every call; a changed file changes the
    /// fingerprint and forces a fresh parse.
    pub async fn load(&self, root: &Path) -> Result<Arc<LoadedDocs>> {
        let root_owned = root.to_path_buf();
        let layout = tokio::task::spawn_blocking(move || finder::discover(&root_owned))
            .await
            .context("Discovery task failed")??;
        let key = layout.fingerprint().to_string();

        {
            let mut mem = self.memory_cache.lock().await;
            if let Some(docs) = mem.get(&key) {
                debug!("Memory cache hit for {}", layout.root.display());
                return Ok(Arc::clone(docs));
            }
        }

        let catalog = match self.cached_catalog(&key).await? {
            Some(catalog) => catalog,
            None => {
                let catalog = parse_layout(layout).await?;
                if self.use_disk_cache {
                    let cache = Arc::clone(&self.cache);
                    let (key, to_store) = (key.clone(), catalog.clone());
                    let stored =
                        tokio::task::spawn_blocking(move || cache.store(&key, &to_store)).await;
                    match stored {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!("Failed to cache catalog: {:#}", e),
                        Err(e) => warn!("Cache task failed: {}", e),
                    }
                }
                catalog
            }
        };

        let docs = Arc::new(LoadedDocs::new(catalog));
        {
            let mut mem = self.memory_cache.lock().await;
            mem.put(key, Arc::clone(&docs));
        }
        Ok(docs)
    }

    async fn cached_catalog(&self, key: &str) -> Result<Option<DocCatalog>> {
        if !self.use_disk_cache {
            return Ok(None);
        }
        let cache = Arc::clone(&self.cache);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || cache.get(&key))
            .await
            .context("Cache task failed")?
    }

    /// Alias records for `symbol`, in `library` or in every library.
    pub async fn lookup_alias(
        &self,
        root: &Path,
        library: Option<&str>,
        symbol: &str,
    ) -> Result<Vec<AliasHit>> {
        let docs = self.load(root).await?;
        Ok(docs.catalog.lookup_alias(library, symbol))
    }

    /// The whole alias table.
    pub async fn aliases(&self, root: &Path) -> Result<AliasTable> {
        Ok(self.load(root).await?.catalog.aliases.clone())
    }

    /// Sidebar of `module`, optionally narrowed to one category.
    ///
    /// Returns the resolved module path with the sidebar.
    pub async fn sidebar(
        &self,
        root: &Path,
        module: &str,
        category: Option<&str>,
    ) -> Result<Option<(String, SidebarIndex)>> {
        let docs = self.load(root).await?;
        let catalog = &docs.catalog;
        let Some(resolved) = catalog.resolve_module(module) else {
            return Ok(None);
        };
        let Some(full) = catalog.sidebars.get(resolved) else {
            return Ok(None);
        };
        let index = match category {
            Some(cat) => {
                let mut narrowed = SidebarIndex::new();
                narrowed.insert(cat, full.category(cat).to_vec());
                narrowed
            }
            None => full.clone(),
        };
        Ok(Some((resolved.to_string(), index)))
    }

    pub async fn search_symbols(
        &self,
        root: &Path,
        query: &str,
        kinds: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<SymbolSearchResult>> {
        let docs = self.load(root).await?;
        Ok(docs.symbols.search(query, kinds, limit))
    }

    pub async fn validate(&self, root: &Path) -> Result<ValidationReport> {
        let docs = self.load(root).await?;
        Ok(validate::validate(&docs.catalog))
    }

    pub async fn summary(&self, root: &Path) -> Result<CatalogSummary> {
        Ok(self.load(root).await?.catalog.summary())
    }

    pub async fn export(&self, root: &Path, out_dir: &Path, format: ExportFormat) -> Result<()> {
        let docs = self.load(root).await?;
        writer::write_catalog(&docs.catalog, out_dir, format).await
    }

    /// Clear all cache entries
    pub async fn clear_all_cache(&self) -> Result<CacheOperationResult> {
        {
            let mut mem = self.memory_cache.lock().await;
            mem.clear();
        }
        self.cache.clear_all()
    }

    /// Get cache statistics
    pub async fn get_cache_stats(&self) -> Result<CacheStatistics> {
        let mut stats = self.cache.get_stats()?;
        stats.memory_entries = self.memory_cache.lock().await.len();
        Ok(stats)
    }

    /// Cleanup expired cache entries
    pub async fn cleanup_expired_cache(&self) -> Result<CacheOperationResult> {
        self.cache.cleanup_expired_entries()
    }
}

/// Read every file of `layout` and parse them into a catalog.
async fn parse_layout(layout: DocLayout) -> Result<DocCatalog> {
    let started = Instant::now();

    let alias_sources = try_join_all(layout.alias_files.iter().map(|path| read_source(path))).await?;
    let sidebar_sources = try_join_all(
        layout
            .sidebar_files
            .iter()
            .map(|(module, path)| async move {
                read_source(path)
                    .await
                    .map(|(path, src)| (module.clone(), path, src))
            }),
    )
    .await?;

    let root = layout.root.clone();
    let (aliases, sidebars) = tokio::task::spawn_blocking(move || {
        parse_sources(alias_sources, sidebar_sources)
    })
    .await
    .context("Parse task failed")??;

    info!(
        "Loaded {} alias table(s) and {} sidebar(s) from {} in {:?}",
        aliases.len(),
        sidebars.len(),
        root.display(),
        started.elapsed()
    );
    Ok(DocCatalog::new(root, aliases, sidebars))
}

async fn read_source(path: &Path) -> Result<(PathBuf, String)> {
    let src = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    Ok((path.to_path_buf(), src))
}

fn parse_sources(
    alias_sources: Vec<(PathBuf, String)>,
    sidebar_sources: Vec<(String, PathBuf, String)>,
) -> Result<(AliasTable, IndexMap<String, SidebarIndex>)> {
    let mut aliases = AliasTable::new();
    for (path, src) in alias_sources {
        let table = loader::aliases_from_script(&src)
            .with_context(|| format!("Failed to load aliases from '{}'", path.display()))?;
        if !aliases.is_empty() {
            debug!("Merging additional alias file {}", path.display());
        }
        aliases.merge(table);
    }

    let sidebars = sidebar_sources
        .par_iter()
        .map(|(module, path, src)| {
            loader::sidebar_from_script(src)
                .with_context(|| format!("Failed to load sidebar '{}'", path.display()))
                .map(|index| (module.clone(), index))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((aliases, sidebars.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        stdfs::create_dir_all(path.parent().unwrap()).unwrap();
        stdfs::write(path, contents).unwrap();
    }

    fn doc_tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "aliases.js",
            "var ALIASES = {};\nALIASES[\"adler32\"] = {};\n",
        );
        write(
            dir.path(),
            "adler32/sidebar-items.js",
            r#"initSidebarItems({"fn":[["adler32","Consume a Read object and returns the Adler32 hash."]],"struct":[["RollingAdler32","A rolling version of the Adler32 hash."]]});"#,
        );
        dir
    }

    #[tokio::test]
    async fn test_doc_engine_creation() {
        let cache_dir = tempdir().unwrap();
        assert!(DocEngine::new(cache_dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_and_reuse() {
        let cache_dir = tempdir().unwrap();
        let docs = doc_tree();
        let engine = DocEngine::new(cache_dir.path()).await.unwrap();

        let first = engine.load(docs.path()).await.unwrap();
        let second = engine.load(docs.path()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.catalog.sidebar_category("adler32", "fn").len(), 1);

        let stats = engine.get_cache_stats().await.unwrap();
        assert_eq!(stats.memory_entries, 1);
        assert_eq!(stats.disk_entries, 1);
    }

    #[tokio::test]
    async fn test_disk_cache_survives_new_engine() {
        let cache_dir = tempdir().unwrap();
        let docs = doc_tree();
        let engine = DocEngine::new(cache_dir.path()).await.unwrap();
        let first = engine.load(docs.path()).await.unwrap();

        let engine = DocEngine::new(cache_dir.path()).await.unwrap();
        let again = engine.load(docs.path()).await.unwrap();
        assert_eq!(again.catalog, first.catalog);
        assert_eq!(engine.get_cache_stats().await.unwrap().hits, 1);
    }

    #[tokio::test]
    async fn test_changes_are_picked_up() {
        let cache_dir = tempdir().unwrap();
        let docs = doc_tree();
        let engine = DocEngine::new(cache_dir.path()).await.unwrap();
        assert!(engine
            .lookup_alias(docs.path(), Some("adler32"), "+")
            .await
            .unwrap()
            .is_empty());

        write(
            docs.path(),
            "aliases.js",
            "var ALIASES = {};\nALIASES[\"adler32\"] = {\"+\":[{'crate':'adler32','ty':3,'name':'RollingAdler32','desc':'','p':'adler32'}],};\n",
        );
        let hits = engine
            .lookup_alias(docs.path(), Some("adler32"), "+")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry.name, "RollingAdler32");
    }

    #[tokio::test]
    async fn test_without_disk_cache() {
        let cache_dir = tempdir().unwrap();
        let docs = doc_tree();
        let options = DocEngineOptions {
            use_disk_cache: false,
            ..Default::default()
        };
        let engine = DocEngine::new_with_options(cache_dir.path(), options)
            .await
            .unwrap();
        engine.load(docs.path()).await.unwrap();
        assert_eq!(engine.get_cache_stats().await.unwrap().disk_entries, 0);
    }

    #[tokio::test]
    async fn test_broken_sidebar_names_the_file() {
        let cache_dir = tempdir().unwrap();
        let docs = doc_tree();
        write(docs.path(), "broken/sidebar-items.js", "initSidebarItems({\"fn\":[[}");
        let engine = DocEngine::new(cache_dir.path()).await.unwrap();
        let err = engine.load(docs.path()).await.unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }

    #[tokio::test]
    async fn test_sidebar_category_filter() {
        let cache_dir = tempdir().unwrap();
        let docs = doc_tree();
        let engine = DocEngine::new(cache_dir.path()).await.unwrap();
        let (module, index) = engine
            .sidebar(docs.path(), "adler32", Some("struct"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(module, "adler32");
        assert_eq!(index.categories().collect::<Vec<_>>(), ["struct"]);
        assert!(engine
            .sidebar(docs.path(), "nope", None)
            .await
            .unwrap()
            .is_none());
    }
}
