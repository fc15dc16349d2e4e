use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::imagegen::ImageModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub width: u32,
    pub height: u32,
    pub model: ImageModel,
    pub seed: Option<u64>,
    pub style_suffix: Option<String>,
}

impl UserSettings {
    pub fn with_size(width: u32, height: u32) -> Self {
        UserSettings {
            width,
            height,
            model: ImageModel::default(),
            seed: None,
            style_suffix: None,
        }
    }

    pub fn size_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings::with_size(512, 512)
    }
}

/// Partial update. Outer `None` leaves a field untouched; for the optional
/// fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub model: Option<ImageModel>,
    pub seed: Option<Option<u64>>,
    pub style_suffix: Option<Option<String>>,
}

impl SettingsPatch {
    pub fn size(width: u32, height: u32) -> Self {
        SettingsPatch {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn model(model: ImageModel) -> Self {
        SettingsPatch {
            model: Some(model),
            ..Default::default()
        }
    }

    pub fn seed(seed: Option<u64>) -> Self {
        SettingsPatch {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn style_suffix(suffix: Option<String>) -> Self {
        SettingsPatch {
            style_suffix: Some(suffix),
            ..Default::default()
        }
    }

    fn apply(self, settings: &mut UserSettings) {
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(style_suffix) = self.style_suffix {
            settings.style_suffix = style_suffix.filter(|value| !value.trim().is_empty());
        }
    }
}

/// Per-user generation settings for the lifetime of the process.
///
/// Reads hand out owned snapshots, so a generation keeps the settings it
/// started with even if the user changes them mid-flight.
#[derive(Clone)]
pub struct SettingsStore {
    defaults: UserSettings,
    entries: Arc<Mutex<HashMap<i64, UserSettings>>>,
}

impl SettingsStore {
    pub fn new(defaults: UserSettings) -> Self {
        SettingsStore {
            defaults,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn defaults(&self) -> &UserSettings {
        &self.defaults
    }

    pub fn get(&self, user_id: i64) -> UserSettings {
        self.entries
            .lock()
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }

    /// Merges `patch` into the user's record and returns the updated snapshot.
    pub fn set(&self, user_id: i64, patch: SettingsPatch) -> UserSettings {
        let mut entries = self.entries.lock();
        let entry = entries
            .entry(user_id)
            .or_insert_with(|| self.defaults.clone());
        patch.apply(entry);
        entry.clone()
    }

    pub fn reset(&self, user_id: i64) -> UserSettings {
        self.entries.lock().insert(user_id, self.defaults.clone());
        self.defaults.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SettingsStore {
        SettingsStore::new(UserSettings::with_size(512, 512))
    }

    #[test]
    fn unknown_user_gets_defaults() {
        let settings = store().get(42);
        assert_eq!(settings.width, 512);
        assert_eq!(settings.height, 512);
        assert_eq!(settings.model, ImageModel::Flux);
        assert_eq!(settings.seed, None);
        assert_eq!(settings.style_suffix, None);
    }

    #[test]
    fn reading_does_not_create_entries() {
        let store = store();
        let _ = store.get(1);
        assert!(store.entries.lock().is_empty());
    }

    #[test]
    fn set_merges_only_given_fields() {
        let store = store();
        store.set(7, SettingsPatch::model(ImageModel::FluxAnime));
        store.set(7, SettingsPatch::size(768, 512));

        let settings = store.get(7);
        assert_eq!(settings.model, ImageModel::FluxAnime);
        assert_eq!((settings.width, settings.height), (768, 512));
        assert_eq!(settings.style_suffix, None);
    }

    #[test]
    fn updates_are_isolated_per_user() {
        let store = store();
        store.set(1, SettingsPatch::size(1024, 1024));
        assert_eq!(store.get(2), *store.defaults());
    }

    #[test]
    fn reset_restores_defaults_and_clears_style() {
        let store = store();
        store.set(
            3,
            SettingsPatch {
                width: Some(1024),
                height: Some(768),
                model: Some(ImageModel::Turbo),
                seed: Some(Some(99)),
                style_suffix: Some(Some("vintage style".to_string())),
            },
        );

        let reset = store.reset(3);
        assert_eq!(reset, *store.defaults());
        assert_eq!(store.get(3), *store.defaults());
        assert_eq!(store.get(3).style_suffix, None);
    }

    #[test]
    fn clearing_optional_fields() {
        let store = store();
        store.set(5, SettingsPatch::seed(Some(12)));
        store.set(5, SettingsPatch::style_suffix(Some("anime".to_string())));
        store.set(5, SettingsPatch::seed(None));
        store.set(5, SettingsPatch::style_suffix(Some("  ".to_string())));

        let settings = store.get(5);
        assert_eq!(settings.seed, None);
        assert_eq!(settings.style_suffix, None);
    }
}
