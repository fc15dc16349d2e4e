use rand::Rng;

use crate::imagegen::models::{ImageModel, ProviderKind};
use crate::settings::UserSettings;

pub const SEED_RANGE_MAX: u64 = 1_000_000;

/// One generation, built at dispatch time and dropped when it completes.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub settings: UserSettings,
    pub provider: ProviderKind,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, settings: UserSettings) -> Self {
        let provider = settings.model.provider();
        GenerationRequest {
            prompt: prompt.into(),
            settings,
            provider,
        }
    }

    /// The user's prompt with their style suffix appended.
    pub fn styled_prompt(&self) -> String {
        match self.settings.style_suffix.as_deref() {
            Some(suffix) if !suffix.trim().is_empty() => format!("{}, {}", self.prompt, suffix),
            _ => self.prompt.clone(),
        }
    }

    /// Pinned seed, or a fresh one for every call.
    pub fn resolve_seed(&self) -> u64 {
        self.settings.seed.unwrap_or_else(random_seed)
    }
}

pub fn random_seed() -> u64 {
    rand::thread_rng().gen_range(1..=SEED_RANGE_MAX)
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub provider: ProviderKind,
    pub model: ImageModel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderFailure {
    #[error("{provider} returned HTTP {status}")]
    Status { provider: ProviderKind, status: u16 },
    #[error("{provider} rejected the API token")]
    Unauthorized { provider: ProviderKind },
    #[error("{provider} requires payment for this request")]
    PaymentRequired { provider: ProviderKind },
    #[error("{provider} rate limit reached")]
    RateLimited { provider: ProviderKind },
    #[error("{provider} is still loading the model")]
    ModelLoading { provider: ProviderKind },
    #[error("{provider} request timed out")]
    Timeout { provider: ProviderKind },
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: ProviderKind,
        message: String,
    },
    #[error("{provider} returned a response that is not an image")]
    EmptyResponse { provider: ProviderKind },
}

impl ProviderFailure {
    pub fn provider(&self) -> ProviderKind {
        match self {
            ProviderFailure::Status { provider, .. }
            | ProviderFailure::Unauthorized { provider }
            | ProviderFailure::PaymentRequired { provider }
            | ProviderFailure::RateLimited { provider }
            | ProviderFailure::ModelLoading { provider }
            | ProviderFailure::Timeout { provider }
            | ProviderFailure::Transport { provider, .. }
            | ProviderFailure::EmptyResponse { provider } => *provider,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no image provider is configured")]
    NoProviderConfigured,
    #[error("all image providers failed ({} attempt(s))", .0.len())]
    AllProvidersFailed(Vec<ProviderFailure>),
}

impl GenerationError {
    pub fn last_failure(&self) -> Option<&ProviderFailure> {
        match self {
            GenerationError::NoProviderConfigured => None,
            GenerationError::AllProvidersFailed(failures) => failures.last(),
        }
    }
}
