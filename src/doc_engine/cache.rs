//! On-disk cache of parsed catalogs, keyed by layout fingerprint

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::io::{Read, Write};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info, warn};

use super::catalog::DocCatalog;
use super::types::{CacheConfig, CacheOperation, CacheOperationResult, CacheStatistics};

const ENTRY_EXTENSION: &str = "catalog";

/// Disk cache for parsed catalogs
#[derive(Debug)]
pub struct Cache {
    cache_dir: PathBuf,
    config: CacheConfig,
    stats: Mutex<InternalCacheStats>,
}

/// Internal cache statistics
#[derive(Debug, Default)]
struct InternalCacheStats {
    hits: u64,
    misses: u64,
}

/// Serializable cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    created_at: u64,
    compressed: bool,
    checksum: String,
    data: Vec<u8>,
}

impl Cache {
    /// Create a new cache instance with default configuration
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(cache_dir, CacheConfig::default())
    }

    /// Create a new cache instance with custom configuration
    pub fn with_config(cache_dir: impl AsRef<Path>, config: CacheConfig) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().join("catalogs");
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir '{}'", cache_dir.display()))?;

        Ok(Self {
            cache_dir,
            config,
            stats: Mutex::new(InternalCacheStats::default()),
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{ENTRY_EXTENSION}", sanitize_filename(key)))
    }

    /// Store a parsed catalog under `key`
    pub fn store(&self, key: &str, catalog: &DocCatalog) -> Result<()> {
        let serialized = bincode::serialize(catalog).context("Failed to serialize catalog")?;
        let checksum = hex::encode(sha2::Sha256::digest(&serialized));
        let data = if self.config.enable_compression {
            compress(&serialized)?
        } else {
            serialized
        };

        let entry = CacheEntry {
            created_at: unix_now(),
            compressed: self.config.enable_compression,
            checksum,
            data,
        };
        let bytes = bincode::serialize(&entry).context("Failed to serialize cache entry")?;
        fs::write(self.entry_path(key), bytes)?;

        debug!("Stored catalog for: {}", key);
        Ok(())
    }

    /// Retrieve a parsed catalog; unreadable or corrupt entries count as misses
    pub fn get(&self, key: &str) -> Result<Option<DocCatalog>> {
        let path = self.entry_path(key);
        if !path.exists() {
            debug!("Cache miss for: {}", key);
            self.record(false);
            return Ok(None);
        }

        match Self::read_entry(&path) {
            Ok(catalog) => {
                debug!("Cache hit (disk) for: {}", key);
                self.record(true);
                Ok(Some(catalog))
            }
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {:#}", path.display(), e);
                fs::remove_file(&path).ok();
                self.record(false);
                Ok(None)
            }
        }
    }

    fn read_entry(path: &Path) -> Result<DocCatalog> {
        let bytes = fs::read(path)?;
        let entry: CacheEntry =
            bincode::deserialize(&bytes).context("Failed to deserialize cache entry")?;
        let serialized = if entry.compressed {
            decompress(&entry.data)?
        } else {
            entry.data
        };
        let checksum = hex::encode(sha2::Sha256::digest(&serialized));
        if checksum != entry.checksum {
            anyhow::bail!("checksum mismatch");
        }
        bincode::deserialize(&serialized).context("Failed to deserialize cached catalog")
    }

    /// Clear all cache entries
    pub fn clear_all(&self) -> Result<CacheOperationResult> {
        let (items_affected, size_freed) = self.remove_where(|_| true)?;
        info!(
            "Cleared catalog cache: {} entries, {} bytes freed",
            items_affected, size_freed
        );
        Ok(CacheOperationResult {
            operation: CacheOperation::Clear,
            success: true,
            message: format!("Cleared {items_affected} entries, {size_freed} bytes freed"),
            items_affected,
            size_freed_bytes: size_freed,
        })
    }

    /// Remove entries older than the configured TTL
    pub fn cleanup_expired_entries(&self) -> Result<CacheOperationResult> {
        let ttl = Duration::from_secs(self.config.entry_ttl_hours * 3600);
        let (items_affected, size_freed) =
            self.remove_where(|age| age.map(|a| a > ttl).unwrap_or(false))?;
        info!(
            "Removed {} expired catalog(s), {} bytes freed",
            items_affected, size_freed
        );
        Ok(CacheOperationResult {
            operation: CacheOperation::Cleanup,
            success: true,
            message: format!("Removed {items_affected} expired entries"),
            items_affected,
            size_freed_bytes: size_freed,
        })
    }

    fn remove_where(&self, pred: impl Fn(Option<Duration>) -> bool) -> Result<(usize, u64)> {
        let mut removed = 0;
        let mut freed = 0u64;
        for (path, metadata) in self.entries()? {
            let age = metadata
                .modified()
                .ok()
                .and_then(|m| SystemTime::now().duration_since(m).ok());
            if pred(age) {
                fs::remove_file(&path)?;
                removed += 1;
                freed += metadata.len();
            }
        }
        Ok((removed, freed))
    }

    fn entries(&self) -> Result<Vec<(PathBuf, fs::Metadata)>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION) {
                out.push((path, entry.metadata()?));
            }
        }
        Ok(out)
    }

    /// Disk usage and hit/miss counters
    pub fn get_stats(&self) -> Result<CacheStatistics> {
        let entries = self.entries()?;
        let disk_size_bytes = entries.iter().map(|(_, m)| m.len()).sum();
        let oldest_entry_age_hours = entries
            .iter()
            .filter_map(|(_, m)| m.modified().ok())
            .filter_map(|m| SystemTime::now().duration_since(m).ok())
            .max()
            .map(|d| d.as_secs_f64() / 3600.0)
            .unwrap_or(0.0);

        let stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let total = stats.hits + stats.misses;
        Ok(CacheStatistics {
            memory_entries: 0,
            disk_entries: entries.len(),
            disk_size_bytes,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: if total > 0 {
                stats.hits as f64 / total as f64
            } else {
                0.0
            },
            oldest_entry_age_hours,
        })
    }

    fn record(&self, hit: bool) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        if hit {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
