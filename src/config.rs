use crate::models::filters::{Category, FilterState, SortKey};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

const APP_NAME: &str = "mod_helm";

/// Window geometry remembered for the shell. The engine stores it verbatim
/// and never interprets it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// Persisted filter selection. Search text is deliberately not remembered.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedFilters {
    pub category: Category,
    pub sort_by: SortKey,
}

impl SavedFilters {
    pub fn from_state(filters: &FilterState) -> Self {
        Self {
            category: filters.category,
            sort_by: filters.sort_by.unwrap_or(SortKey::LastUpdated),
        }
    }

    pub fn to_state(self) -> FilterState {
        FilterState {
            category: self.category,
            sort_by: Some(self.sort_by),
            search: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub version: u8,
    #[serde(default)]
    pub normal_size: Option<WindowSize>,
    #[serde(default)]
    pub expanded_size: Option<WindowSize>,
    #[serde(default)]
    pub filters: Option<SavedFilters>,
    #[serde(default)]
    pub favorite_mods: BTreeSet<String>,
    #[serde(default)]
    pub selected_install: Option<Utf8PathBuf>,
    /// Last selected profile per install location.
    #[serde(default)]
    pub selected_profiles: BTreeMap<Utf8PathBuf, String>,
    #[serde(default)]
    pub expand_mod_info_on_start: bool,
}

/// Storage seam for AppSettings. The engine only ever loads and stores the
/// whole struct; where it lands is the implementation's business.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> AppSettings;
    fn save(&self, settings: &AppSettings);
}

/// Production store backed by confy in the platform config directory.
/// Settings are never load-bearing: unreadable files fall back to defaults
/// and failed writes are logged and dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfySettings;

impl SettingsStore for ConfySettings {
    fn load(&self) -> AppSettings {
        confy::load(APP_NAME, None).unwrap_or_else(|e| {
            warn!("failed to load settings, using defaults: {e}");
            AppSettings::default()
        })
    }

    fn save(&self, settings: &AppSettings) {
        if let Err(e) = confy::store(APP_NAME, None, settings) {
            warn!("failed to save settings: {e}");
        }
    }
}

/// Read-modify-write helper for single-field updates.
pub fn update_settings(store: &dyn SettingsStore, apply: impl FnOnce(&mut AppSettings)) {
    let mut settings = store.load();
    apply(&mut settings);
    store.save(&settings);
}
