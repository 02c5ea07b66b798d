//! Named filter presets kept in a local key/value store.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use super::criteria::FilterSpec;
use crate::error::{CrmError, Result, ResultExt};
use crate::events::{CrmEvent, EventBus};

/// Storage key presets are kept under.
pub const PRESETS_KEY: &str = "dealFilterPresets";

/// Durable string storage addressed by key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One file per key: `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).context(format!("Reading {}", path.display()))?;
        Ok(Some(text))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context(format!("Creating {}", self.dir.display()))?;
        let path = self.path(key);
        std::fs::write(&path, value).context(format!("Writing {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path).context(format!("Removing {}", path.display()))?;
        }
        Ok(())
    }
}

/// Process-local store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// A named, saved [`FilterSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub name: String,
    pub filters: FilterSpec,
}

/// The preset list, loaded once and written back on every change.
pub struct FilterPresets<S: KeyValueStore> {
    store: S,
    presets: Vec<FilterPreset>,
    events: Option<Arc<EventBus>>,
}

impl<S: KeyValueStore> FilterPresets<S> {
    /// Read presets from `store`. Unreadable JSON is logged and treated as empty.
    pub fn load(store: S) -> Result<Self> {
        let presets = match store.get(PRESETS_KEY)? {
            Some(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring unreadable filter presets: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };
        debug!(count = presets.len(), "Loaded filter presets");
        Ok(Self {
            store,
            presets,
            events: None,
        })
    }

    /// Emit `PresetsChanged` on `bus` after every save or delete.
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn list(&self) -> &[FilterPreset] {
        &self.presets
    }

    pub fn get(&self, name: &str) -> Option<&FilterPreset> {
        self.presets.iter().find(|preset| preset.name == name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Save `filters` under `name`, replacing a preset of the same name in place.
    ///
    /// The name is trimmed; a blank name is rejected.
    pub fn save(&mut self, name: &str, filters: FilterSpec) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CrmError::EmptyPresetName);
        }

        let preset = FilterPreset {
            name: name.to_string(),
            filters,
        };
        match self.presets.iter_mut().find(|existing| existing.name == name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
        self.persist()
    }

    /// Remove the preset called `name`. Returns `false` if there was none.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let before = self.presets.len();
        self.presets.retain(|preset| preset.name != name);
        if self.presets.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.presets)?;
        self.store.set(PRESETS_KEY, &json)?;
        debug!(count = self.presets.len(), "Saved filter presets");
        if let Some(bus) = &self.events {
            bus.emit(CrmEvent::PresetsChanged {
                count: self.presets.len(),
            });
        }
        Ok(())
    }
}
