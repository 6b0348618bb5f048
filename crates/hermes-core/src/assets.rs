//! Asset catalog resolution.
//!
//! Maps a logical asset id to a servable URL: the CDN URL when present,
//! else the local path under `/`. An unknown id logs one warning per id
//! and resolves to an empty string — callers must tolerate an empty src
//! and fall back to a placeholder.

use std::collections::HashSet;
use std::sync::Mutex;

/// Broad grouping used for catalog audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Logo,
    Hero,
    Team,
    Icon,
    Illustration,
}

/// One catalog entry.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Logical id referenced by pages and components.
    pub id: String,
    pub category: AssetCategory,
    /// Path relative to the site root, without a leading slash.
    pub local_path: String,
    /// Absolute HTTPS URL on the CDN host, preferred when set.
    pub cdn_url: Option<String>,
    /// Intrinsic dimensions, when known.
    pub dimensions: Option<(u32, u32)>,
    pub alt_text: String,
}

/// The asset lookup table. Warn-once bookkeeping for unknown ids lives
/// here rather than in ambient globals, so its lifecycle is tied to the
/// catalog value built at application start.
#[derive(Debug)]
pub struct AssetCatalog {
    entries: Vec<AssetConfig>,
    warned: Mutex<HashSet<String>>,
}

impl AssetCatalog {
    #[must_use]
    pub fn new(entries: Vec<AssetConfig>) -> Self {
        Self {
            entries,
            warned: Mutex::new(HashSet::new()),
        }
    }

    /// Resolve a logical id to a servable URL.
    ///
    /// CDN URL wins over the local path. An unknown id returns an empty
    /// string after warning once for that id.
    #[must_use]
    pub fn resolve(&self, id: &str) -> String {
        match self.entries.iter().find(|e| e.id == id) {
            Some(entry) => entry
                .cdn_url
                .clone()
                .unwrap_or_else(|| format!("/{}", entry.local_path)),
            None => {
                let first = self
                    .warned
                    .lock()
                    .map(|mut seen| seen.insert(id.to_owned()))
                    .unwrap_or(true);
                if first {
                    tracing::warn!(asset_id = %id, "unknown asset id, resolving to empty src");
                }
                String::new()
            }
        }
    }

    /// Look up the full entry for an id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AssetConfig> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Ids whose resolved URL would be empty (no CDN URL and an empty
    /// local path). A well-formed catalog returns none.
    #[must_use]
    pub fn unresolvable_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.cdn_url.as_deref().is_none_or(str::is_empty) && e.local_path.is_empty())
            .map(|e| e.id.as_str())
            .collect()
    }
}
