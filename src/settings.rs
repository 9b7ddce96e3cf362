//! Settings Persistence
//!
//! [`CompanionSettings`] is the single persisted state object: the active
//! persona, the per-persona progress map, the global player level/XP pair
//! and the mode flags the XP context is synthesized from. The engine owns a
//! live copy in memory and writes it back through a [`SettingsStore`] after
//! every mutation.

use crate::error::{Error, Result};
use crate::modifier::MAX_PINK_FILTER_OPACITY;
use crate::persona::PersonaId;
use crate::progress::PersonaProgress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default settings file path, relative to the home directory
const DEFAULT_SETTINGS_FILE: &str = ".lumi/settings.json";

/// Persisted companion state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionSettings {
    /// Currently active persona
    #[serde(default)]
    pub active_persona: PersonaId,
    /// Per-persona progress records, created lazily on first access
    #[serde(default)]
    pub progress: HashMap<PersonaId, PersonaProgress>,
    /// Global player level
    #[serde(default = "default_player_level")]
    pub player_level: u32,
    /// Global player XP pool (the one the drain feeds on)
    #[serde(default)]
    pub player_xp: f64,
    /// Strict mode is locked on
    #[serde(default)]
    pub strict_mode: bool,
    /// Panic key disabled (no-escape mode)
    #[serde(default)]
    pub no_escape_mode: bool,
    /// Attention checks enabled
    #[serde(default)]
    pub attention_checks_enabled: bool,
    /// Pink filter overlay enabled
    #[serde(default)]
    pub pink_filter_enabled: bool,
    /// Pink filter opacity, `[0, 50]`
    #[serde(default)]
    pub pink_filter_opacity: f64,
    /// Skip unlock-level checks when switching personas
    #[serde(default)]
    pub unlock_bypass: bool,
}

fn default_player_level() -> u32 {
    1
}

impl CompanionSettings {
    /// Get the progress record for a persona, creating it on first access.
    pub fn progress_mut(&mut self, id: PersonaId) -> &mut PersonaProgress {
        self.progress.entry(id).or_default()
    }

    /// Effective pink filter opacity: 0 while the filter is disabled.
    #[must_use]
    pub fn effective_pink_opacity(&self) -> f64 {
        if self.pink_filter_enabled {
            self.pink_filter_opacity.clamp(0.0, MAX_PINK_FILTER_OPACITY)
        } else {
            0.0
        }
    }
}

impl Default for CompanionSettings {
    fn default() -> Self {
        Self {
            active_persona: PersonaId::default(),
            progress: HashMap::new(),
            player_level: default_player_level(),
            player_xp: 0.0,
            strict_mode: false,
            no_escape_mode: false,
            attention_checks_enabled: false,
            pink_filter_enabled: false,
            pink_filter_opacity: 0.0,
            unlock_bypass: false,
        }
    }
}

/// Synchronous settings persistence.
///
/// `load` returns `Ok(None)` when no save exists yet; `save` overwrites the
/// whole settings object (persist-after-mutation, no partial writes).
#[cfg_attr(test, mockall::automock)]
pub trait SettingsStore: Send + Sync {
    /// Load the persisted settings, if any
    fn load(&self) -> Result<Option<CompanionSettings>>;
    /// Persist the settings
    fn save(&self, settings: &CompanionSettings) -> Result<()>;
}

/// JSON file-backed settings store
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Create with the default path (`~/.lumi/settings.json`)
    #[must_use]
    pub fn new() -> Self {
        let path = dirs::home_dir()
            .map(|h| h.join(DEFAULT_SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));

        Self { path }
    }

    /// Create with a custom path
    #[must_use]
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Return the backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Option<CompanionSettings>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Store(format!("failed to read {:?}: {}", self.path, e)))?;

        let settings = serde_json::from_str(&content)?;
        Ok(Some(settings))
    }

    fn save(&self, settings: &CompanionSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Store(format!("failed to create directory {:?}: {}", parent, e))
            })?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)
            .map_err(|e| Error::Store(format!("failed to write {:?}: {}", self.path, e)))
    }
}

/// In-memory settings store for tests and headless runs
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: Mutex<Option<CompanionSettings>>,
}

impl MemorySettingsStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with settings
    #[must_use]
    pub fn with_settings(settings: CompanionSettings) -> Self {
        Self {
            inner: Mutex::new(Some(settings)),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<CompanionSettings>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| Error::Store("settings store poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, settings: &CompanionSettings) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| Error::Store("settings store poisoned".to_string()))?;
        *guard = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_progress_mut_creates_lazily() {
        let mut settings = CompanionSettings::default();
        assert!(settings.progress.is_empty());

        settings.progress_mut(PersonaId::Nyx).current_xp = 5.0;
        assert_eq!(settings.progress.len(), 1);
        assert_eq!(settings.progress[&PersonaId::Nyx].current_xp, 5.0);

        // Second access reuses the same record
        settings.progress_mut(PersonaId::Nyx).current_xp += 1.0;
        assert_eq!(settings.progress.len(), 1);
        assert_eq!(settings.progress[&PersonaId::Nyx].current_xp, 6.0);
    }

    #[test]
    fn test_effective_pink_opacity() {
        let mut settings = CompanionSettings::default();
        settings.pink_filter_opacity = 40.0;
        assert_eq!(settings.effective_pink_opacity(), 0.0);

        settings.pink_filter_enabled = true;
        assert_eq!(settings.effective_pink_opacity(), 40.0);

        settings.pink_filter_opacity = 90.0;
        assert_eq!(settings.effective_pink_opacity(), 50.0);
    }

    #[test]
    fn test_json_store_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonSettingsStore::with_path(dir.path().join("settings.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonSettingsStore::with_path(dir.path().join("nested/settings.json"));

        let mut settings = CompanionSettings::default();
        settings.active_persona = PersonaId::Vesta;
        settings.player_level = 17;
        settings.progress_mut(PersonaId::Vesta).level = 3;

        store.save(&settings).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_json_store_progress_keys_survive_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonSettingsStore::with_path(dir.path().join("settings.json"));

        let mut settings = CompanionSettings::default();
        settings.progress_mut(PersonaId::Umbra).total_active_secs = 120;
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.progress[&PersonaId::Umbra].total_active_secs, 120);
    }

    #[test]
    fn test_partial_save_file_loads_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"player_level": 9}"#).unwrap();

        let store = JsonSettingsStore::with_path(&path);
        let settings = store.load().unwrap().unwrap();
        assert_eq!(settings.player_level, 9);
        assert_eq!(settings.active_persona, PersonaId::Lumi);
        assert!(settings.progress.is_empty());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySettingsStore::new();
        assert!(store.load().unwrap().is_none());

        let mut settings = CompanionSettings::default();
        settings.player_xp = 33.0;
        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap().unwrap().player_xp, 33.0);
    }
}
