use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::warn;

pub const BOT_TOKEN_PLACEHOLDER: &str = "YOUR_TELEGRAM_BOT_TOKEN_HERE";
pub const HF_TOKEN_PLACEHOLDER: &str = "YOUR_HF_TOKEN_HERE";

#[derive(Debug, Clone)]
pub struct PollinationsConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_token: String,
    pub base_url: String,
    pub timeout: Duration,
    pub model_loading_retry_delay: Duration,
    pub guidance_scale: f32,
    pub inference_steps: u32,
}

impl HuggingFaceConfig {
    pub fn has_token(&self) -> bool {
        is_configured_secret(&self.api_token, HF_TOKEN_PLACEHOLDER)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    pub pollinations: PollinationsConfig,
    pub huggingface: HuggingFaceConfig,
    pub default_width: u32,
    pub default_height: u32,
    pub wake_word: String,
    pub updates_channel_url: String,
    pub support_group_url: String,
    pub start_photos: Vec<String>,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

/// A secret counts as configured when it is non-empty and not the shipped placeholder.
pub fn is_configured_secret(value: &str, placeholder: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != placeholder
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_csv(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn normalize_wake_word(value: String) -> String {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        warn!(
            "Invalid WAKE_WORD value '{}'; defaulting to 'mikasa'.",
            value
        );
        return "mikasa".to_string();
    }
    trimmed
}

fn trim_base_url(value: String) -> String {
    value.trim().trim_end_matches('/').to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let default_width = env_u32("DEFAULT_IMAGE_WIDTH", 512);
        let default_height = env_u32("DEFAULT_IMAGE_HEIGHT", 512);
        if default_width == 0 || default_height == 0 {
            return Err(anyhow!(
                "DEFAULT_IMAGE_WIDTH and DEFAULT_IMAGE_HEIGHT must be positive"
            ));
        }

        Ok(Config {
            bot_token: env_string("BOT_TOKEN", BOT_TOKEN_PLACEHOLDER),
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            pollinations: PollinationsConfig {
                enabled: env_bool("ENABLE_POLLINATIONS", true),
                base_url: trim_base_url(env_string(
                    "POLLINATIONS_BASE_URL",
                    "https://image.pollinations.ai",
                )),
                timeout: Duration::from_secs(env_u64("POLLINATIONS_TIMEOUT_SECONDS", 60)),
            },
            huggingface: HuggingFaceConfig {
                api_token: env_string("HF_API_TOKEN", HF_TOKEN_PLACEHOLDER),
                base_url: trim_base_url(env_string(
                    "HF_API_BASE_URL",
                    "https://api-inference.huggingface.co/models",
                )),
                timeout: Duration::from_secs(env_u64("HF_TIMEOUT_SECONDS", 120)),
                model_loading_retry_delay: Duration::from_secs(env_u64(
                    "HF_MODEL_LOADING_RETRY_SECONDS",
                    30,
                )),
                guidance_scale: env_f32("HF_GUIDANCE_SCALE", 7.5),
                inference_steps: env_u32("HF_INFERENCE_STEPS", 30),
            },
            default_width,
            default_height,
            wake_word: normalize_wake_word(env_string("WAKE_WORD", "mikasa")),
            updates_channel_url: env_string("UPDATES_CHANNEL_URL", "https://t.me/WorkGlows"),
            support_group_url: env_string("SUPPORT_GROUP_URL", "https://t.me/SoulMeetsHQ"),
            start_photos: env_csv("START_PHOTOS"),
        })
    }

    pub fn has_bot_token(&self) -> bool {
        is_configured_secret(&self.bot_token, BOT_TOKEN_PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_secrets_are_not_configured() {
        assert!(!is_configured_secret(HF_TOKEN_PLACEHOLDER, HF_TOKEN_PLACEHOLDER));
        assert!(!is_configured_secret("   ", HF_TOKEN_PLACEHOLDER));
        assert!(is_configured_secret("hf_abc123", HF_TOKEN_PLACEHOLDER));
    }

    #[test]
    fn wake_word_is_lowercased_and_validated() {
        assert_eq!(normalize_wake_word("  Mikasa ".to_string()), "mikasa");
        assert_eq!(normalize_wake_word("two words".to_string()), "mikasa");
        assert_eq!(normalize_wake_word(String::new()), "mikasa");
    }

    #[test]
    fn base_urls_lose_trailing_slashes() {
        assert_eq!(
            trim_base_url("https://image.pollinations.ai/".to_string()),
            "https://image.pollinations.ai"
        );
    }
}
