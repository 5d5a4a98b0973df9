//! Persistent on-disk caching for scraped item lists with TTL tracking.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::RawItemEntry;

const CACHE_DIRNAME: &str = "operator-cost-scanner";
const CACHE_FILENAME: &str = "item_cache.json";

/// Cache TTL: 7 days. Operator material lists only change with game patches.
pub const ITEM_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// One operator's scraped list and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPage {
    /// Unix timestamp (seconds) when this page was fetched.
    pub cached_at: u64,
    pub entries: Vec<RawItemEntry>,
}

impl CachedPage {
    /// Create a new entry with current timestamp.
    pub fn new(entries: Vec<RawItemEntry>) -> Self {
        Self {
            cached_at: unix_now(),
            entries,
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    pub fn age(&self) -> Duration {
        Duration::from_secs(unix_now().saturating_sub(self.cached_at))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let secs = self.age().as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemListCache {
    pages: BTreeMap<String, CachedPage>,
}

impl ItemListCache {
    /// Entry younger than `ttl`, if any.
    pub fn get_fresh(&self, entity: &str, ttl: Duration) -> Option<&CachedPage> {
        self.pages.get(entity).filter(|page| !page.is_expired(ttl))
    }

    /// Entry regardless of age, used as a fallback when a live fetch fails.
    pub fn get_stale(&self, entity: &str) -> Option<&CachedPage> {
        self.pages.get(entity)
    }

    pub fn insert(&mut self, entity: impl Into<String>, entries: Vec<RawItemEntry>) {
        self.pages.insert(entity.into(), CachedPage::new(entries));
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Default cache file in the local app data directory.
pub fn default_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIRNAME)
        .join(CACHE_FILENAME)
}

/// Load the item cache from disk, if it exists and parses.
pub fn load_item_cache(path: &Path) -> Option<ItemListCache> {
    if !path.exists() {
        debug!("[cache] No item cache found at {}", path.display());
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<ItemListCache>(&content) {
            Ok(cache) => {
                debug!(
                    "[cache] Loaded {} cached pages from {}",
                    cache.len(),
                    path.display()
                );
                Some(cache)
            }
            Err(e) => {
                warn!("[cache] Failed to parse item cache: {e}");
                None
            }
        },
        Err(e) => {
            warn!("[cache] Failed to read item cache: {e}");
            None
        }
    }
}

/// Save the item cache to disk.
pub fn save_item_cache(path: &Path, cache: &ItemListCache) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(cache)?;
    fs::write(path, content)?;
    debug!(
        "[cache] Saved {} cached pages to {}",
        cache.len(),
        path.display()
    );
    Ok(())
}
