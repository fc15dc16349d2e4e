use std::sync::Arc;

use crate::config::Config;
use crate::imagegen::{GeneratedImage, GenerationError, GenerationRequest, ImageGenerator};
use crate::settings::{SettingsStore, UserSettings};

#[derive(Clone)]
pub struct AppState {
    pub settings: SettingsStore,
    pub generator: Arc<ImageGenerator>,
    pub wake_word: Arc<str>,
}

impl AppState {
    pub fn new(settings: SettingsStore, generator: ImageGenerator, wake_word: &str) -> Self {
        AppState {
            settings,
            generator: Arc::new(generator),
            wake_word: Arc::from(wake_word),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        AppState::new(
            SettingsStore::new(UserSettings::with_size(
                config.default_width,
                config.default_height,
            )),
            ImageGenerator::from_config(config),
            &config.wake_word,
        )
    }

    /// Snapshot the user's settings and run the provider fallback chain.
    pub async fn generate(
        &self,
        user_id: i64,
        prompt: &str,
    ) -> (GenerationRequest, Result<GeneratedImage, GenerationError>) {
        let request = GenerationRequest::new(prompt, self.settings.get(user_id));
        let result = self.generator.generate(&request).await;
        (request, result)
    }
}
