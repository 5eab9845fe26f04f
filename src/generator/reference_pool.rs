use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "assets/pools/"]
struct PoolAssets;

pub const DEFAULT_POOL: &str = "cet4";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub word: String,
    pub meaning: String,
}

/// Reference {word, meaning} pairs that distractor meanings are drawn from.
#[derive(Clone, Debug, Default)]
pub struct ReferencePool {
    entries: Vec<PoolEntry>,
}

impl ReferencePool {
    pub fn new(entries: Vec<PoolEntry>) -> Self {
        Self { entries }
    }

    /// Resolve a pool by name: `<user_dir>/<name>.json` shadows the
    /// bundled pool of the same name.
    pub fn load(name: &str, user_dir: &Path) -> Option<Self> {
        let user_path = user_dir.join(format!("{name}.json"));
        if user_path.exists() {
            match Self::from_file(&user_path) {
                Ok(pool) => return Some(pool),
                Err(e) => log::warn!("ignoring user pool {}: {e:#}", user_path.display()),
            }
        }
        Self::bundled(name)
    }

    pub fn bundled(name: &str) -> Option<Self> {
        let file = PoolAssets::get(&format!("{name}.json"))?;
        let entries: Vec<PoolEntry> = serde_json::from_slice(file.data.as_ref()).ok()?;
        Some(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pool {}", path.display()))?;
        let entries: Vec<PoolEntry> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }

    /// Names of the pools bundled into the binary.
    pub fn bundled_names() -> Vec<String> {
        let mut names: Vec<String> = PoolAssets::iter()
            .filter_map(|f| f.strip_suffix(".json").map(|s| s.to_string()))
            .collect();
        names.sort();
        names
    }

    /// Bundled pool names plus every `*.json` file in `user_dir`.
    pub fn available_names(user_dir: &Path) -> Vec<String> {
        let mut names = Self::bundled_names();
        if let Ok(dir) = fs::read_dir(user_dir) {
            for path in dir.filter_map(|e| e.ok()).map(|e| e.path()) {
                if path.extension().and_then(|x| x.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }

    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
