//! Locates the static index files inside a rustdoc output directory.

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directories rustdoc fills with sources, shared assets or impl lists.
/// None of them hold a module sidebar.
/// The unsuffixed sidebar name wins when a module directory holds several.
const SIDEBAR_FILE: &str = "sidebar-items.js";

const SKIPPED_DIRS: [&str; 6] = [
    "src",
    "static.files",
    "implementors",
    "trait.impl",
    "type.impl",
    "search.desc",
];

/// Index files found under one documentation root.
#[derive(Debug, Clone)]
pub struct DocLayout {
    pub root: PathBuf,
    /// `aliases*.js` at the root, sorted by file name.
    pub alias_files: Vec<PathBuf>,
    /// `(module path, file)` for every sidebar, in walk order. Each module
    /// appears once.
    pub sidebar_files: Vec<(String, PathBuf)>,
    fingerprint: String,
}

impl DocLayout {
    /// Hex SHA-256 over the root and each file's relative path, size and mtime.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn is_empty(&self) -> bool {
        self.alias_files.is_empty() && self.sidebar_files.is_empty()
    }
}

/// Walk `root` and collect its alias and sidebar files.
pub fn discover(root: &Path) -> Result<DocLayout> {
    if !root.is_dir() {
        return Err(anyhow!(
            "Documentation root '{}' is not a directory",
            root.display()
        ));
    }
    let root = std::fs::canonicalize(root)
        .with_context(|| format!("Failed to resolve '{}'", root.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());

    let mut alias_files = Vec::new();
    let mut sidebar_files: Vec<(String, PathBuf)> = Vec::new();
    let mut sidebar_slots: HashMap<String, usize> = HashMap::new();

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk '{}'", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let is_alias = entry.depth() == 1 && name.starts_with("aliases") && name.ends_with(".js");
        let is_sidebar = name.starts_with("sidebar-items") && name.ends_with(".js");
        if !is_alias && !is_sidebar {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&root)
            .context("Walked outside the documentation root")?;
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat '{}'", entry.path().display()))?;
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update(metadata.len().to_le_bytes());
        if let Ok(modified) = metadata.modified() {
            if let Ok(since_epoch) = modified.duration_since(UNIX_EPOCH) {
                hasher.update(since_epoch.as_nanos().to_le_bytes());
            }
        }

        if is_alias {
            alias_files.push(entry.path().to_path_buf());
        } else {
            let Some(module) = module_path(relative) else {
                debug!("Ignoring sidebar outside any module: {}", relative.display());
                continue;
            };
            let path = entry.path().to_path_buf();
            match sidebar_slots.get(&module).copied() {
                Some(slot) => {
                    let kept = &mut sidebar_files[slot].1;
                    if name == SIDEBAR_FILE {
                        warn!(
                            "Module {} has several sidebars; using {} over {}",
                            module,
                            path.display(),
                            kept.display()
                        );
                        *kept = path;
                    } else {
                        warn!(
                            "Module {} has several sidebars; ignoring {} in favour of {}",
                            module,
                            path.display(),
                            kept.display()
                        );
                    }
                }
                None => {
                    sidebar_slots.insert(module.clone(), sidebar_files.len());
                    sidebar_files.push((module, path));
                }
            }
        }
    }

    debug!(
        "Discovered {} alias file(s) and {} sidebar(s) under {}",
        alias_files.len(),
        sidebar_files.len(),
        root.display()
    );

    Ok(DocLayout {
        root,
        alias_files,
        sidebar_files,
        fingerprint: hex::encode(hasher.finalize()),
    })
}

/// `vulkano/framebuffer/sidebar-items.js` → `vulkano::framebuffer`.
pub fn module_path(relative_file: &Path) -> Option<String> {
    let segments: Vec<_> = relative_file
        .parent()?
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("::"))
    }
}

/// Directory a module's sidebar lives in, relative to the root.
pub fn module_dir(module: &str) -> PathBuf {
    module.split("::").collect()
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() >= 1
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}
