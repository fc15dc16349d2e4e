pub mod presets;
pub mod store;

pub use presets::StylePreset;
pub use store::{SettingsPatch, SettingsStore, UserSettings};
