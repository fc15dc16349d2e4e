use tracing::{info, warn};

use crate::config::Config;
use crate::imagegen::huggingface::HuggingFaceClient;
use crate::imagegen::models::ProviderKind;
use crate::imagegen::pollinations::PollinationsClient;
use crate::imagegen::provider::ImageProvider;
use crate::imagegen::types::{GeneratedImage, GenerationError, GenerationRequest};

/// Tries the user's provider first, then every other configured provider once.
#[derive(Debug, Clone)]
pub struct ImageGenerator {
    providers: Vec<ImageProvider>,
}

impl ImageGenerator {
    pub fn new(mut providers: Vec<ImageProvider>) -> Self {
        providers.sort_by_key(|provider| {
            ProviderKind::FALLBACK_ORDER
                .iter()
                .position(|kind| *kind == provider.kind())
                .unwrap_or(usize::MAX)
        });
        ImageGenerator { providers }
    }

    pub fn from_config(config: &Config) -> Self {
        ImageGenerator::new(vec![
            ImageProvider::Pollinations(PollinationsClient::new(config.pollinations.clone())),
            ImageProvider::HuggingFace(HuggingFaceClient::new(config.huggingface.clone())),
        ])
    }

    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        self.providers
            .iter()
            .filter(|provider| provider.is_configured())
            .map(ImageProvider::kind)
            .collect()
    }

    /// Preferred provider first (when configured), then the rest in static order.
    pub fn attempt_order(&self, preferred: ProviderKind) -> Vec<&ImageProvider> {
        let configured = self.providers.iter().filter(|provider| provider.is_configured());
        let (mut first, rest): (Vec<_>, Vec<_>) =
            configured.partition(|provider| provider.kind() == preferred);
        first.extend(rest);
        first
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let order = self.attempt_order(request.provider);
        if order.is_empty() {
            warn!("No image provider is configured; skipping generation");
            return Err(GenerationError::NoProviderConfigured);
        }

        let mut failures = Vec::with_capacity(order.len());
        for provider in order {
            let kind = provider.kind();
            let model = request.settings.model.for_provider(kind);
            match provider.fetch(request, model).await {
                Ok(bytes) => {
                    info!(
                        provider = kind.log_name(),
                        model = model.key(),
                        bytes = bytes.len(),
                        fallbacks = failures.len(),
                        "Image generated"
                    );
                    return Ok(GeneratedImage {
                        bytes,
                        provider: kind,
                        model,
                    });
                }
                Err(failure) => {
                    warn!(provider = kind.log_name(), model = model.key(), "{failure}");
                    failures.push(failure);
                }
            }
        }

        Err(GenerationError::AllProvidersFailed(failures))
    }
}
