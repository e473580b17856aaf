//! App shortcut registry (name → URL)
//!
//! The whole mapping is persisted as one JSON object under [`SHORTCUTS_KEY`].
//! Insertion order is kept so settings list apps the way they were added.

use super::backend::KeyValueStore;
use crate::{ParleyError, Result};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Key the mapping is stored under
pub const SHORTCUTS_KEY: &str = "customApps";

/// Shortcuts available before the user adds any
pub const DEFAULT_SHORTCUTS: &[(&str, &str)] = &[
    ("calculator", "https://www.google.com/search?q=calculator"),
    ("youtube", "https://www.youtube.com"),
    ("docs", "https://docs.google.com"),
    ("maps", "https://maps.google.com"),
    ("notion", "https://www.notion.so"),
    ("spotify", "https://open.spotify.com"),
    ("gmail", "https://mail.google.com"),
    ("twitter", "https://twitter.com"),
];

pub struct ShortcutStore {
    apps: IndexMap<String, String>,
    backend: Box<dyn KeyValueStore>,
}

impl ShortcutStore {
    /// Load the persisted mapping, or seed the defaults when none exists
    ///
    /// Unreadable or corrupt data also falls back to the defaults; nothing is
    /// written until the first mutation.
    pub fn load(backend: Box<dyn KeyValueStore>) -> Self {
        let apps = match backend.get(SHORTCUTS_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<IndexMap<String, String>>(&bytes) {
                Ok(apps) => {
                    debug!("Loaded {} app shortcuts", apps.len());
                    apps
                }
                Err(e) => {
                    warn!("Stored app shortcuts are corrupt, using defaults: {}", e);
                    default_shortcuts()
                }
            },
            Ok(None) => {
                debug!("No stored app shortcuts, seeding defaults");
                default_shortcuts()
            }
            Err(e) => {
                warn!("Failed to read app shortcuts, using defaults: {}", e);
                default_shortcuts()
            }
        };

        Self { apps, backend }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.apps.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// All shortcuts in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.apps.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert or replace a shortcut, then persist
    ///
    /// The in-memory mapping is updated even when persisting fails.
    pub fn upsert(&mut self, name: impl Into<String>, url: impl Into<String>) -> Result<()> {
        let name = name.into();
        let url = url.into();
        info!("Saving app shortcut {} -> {}", name, url);
        self.apps.insert(name, url);
        self.persist()
    }

    /// Remove a shortcut, then persist
    ///
    /// Returns `Ok(false)` without writing when the name is unknown.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        if self.apps.shift_remove(name).is_none() {
            return Ok(false);
        }
        info!("Removed app shortcut {}", name);
        self.persist()?;
        Ok(true)
    }

    /// Merge edited settings into the mapping, then persist
    ///
    /// Entries whose URL is blank are skipped rather than cleared.
    pub fn apply_settings<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        for (name, url) in entries {
            let url = url.as_ref().trim();
            if url.is_empty() {
                continue;
            }
            self.apps.insert(name.into(), url.to_string());
        }
        self.persist()
    }

    /// Write the whole mapping under [`SHORTCUTS_KEY`]
    pub fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.apps)
            .map_err(|e| ParleyError::SerializationError(e.to_string()))?;
        self.backend.set(SHORTCUTS_KEY, &bytes)
    }
}

impl std::fmt::Debug for ShortcutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortcutStore").field("apps", &self.apps).finish()
    }
}

fn default_shortcuts() -> IndexMap<String, String> {
    DEFAULT_SHORTCUTS
        .iter()
        .map(|(name, url)| (name.to_string(), url.to_string()))
        .collect()
}
