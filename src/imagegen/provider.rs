use reqwest::Response;
use tracing::warn;

use crate::imagegen::huggingface::HuggingFaceClient;
use crate::imagegen::models::{ImageModel, ProviderKind};
use crate::imagegen::pollinations::PollinationsClient;
use crate::imagegen::types::{GenerationRequest, ProviderFailure};
use crate::utils::timing::log_provider_timing;

#[derive(Debug, Clone)]
pub enum ImageProvider {
    Pollinations(PollinationsClient),
    HuggingFace(HuggingFaceClient),
}

impl ImageProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ImageProvider::Pollinations(_) => ProviderKind::Pollinations,
            ImageProvider::HuggingFace(_) => ProviderKind::HuggingFace,
        }
    }

    pub fn is_configured(&self) -> bool {
        match self {
            ImageProvider::Pollinations(client) => client.is_configured(),
            ImageProvider::HuggingFace(client) => client.is_configured(),
        }
    }

    pub async fn fetch(
        &self,
        request: &GenerationRequest,
        model: ImageModel,
    ) -> Result<Vec<u8>, ProviderFailure> {
        log_provider_timing(self.kind().log_name(), model.key(), || async {
            match self {
                ImageProvider::Pollinations(client) => client.fetch(request, model).await,
                ImageProvider::HuggingFace(client) => client.fetch(request, model).await,
            }
        })
        .await
    }
}

pub(crate) fn transport_failure(provider: ProviderKind, err: reqwest::Error) -> ProviderFailure {
    warn!(
        "{} request failed: {} (timeout={}, connect={})",
        provider,
        err,
        err.is_timeout(),
        err.is_connect()
    );
    if err.is_timeout() {
        ProviderFailure::Timeout { provider }
    } else {
        ProviderFailure::Transport {
            provider,
            message: err.without_url().to_string(),
        }
    }
}

/// Reads a success body and checks that it really is an image.
pub(crate) async fn read_image_body(
    provider: ProviderKind,
    response: Response,
) -> Result<Vec<u8>, ProviderFailure> {
    let bytes = response
        .bytes()
        .await
        .map_err(|err| transport_failure(provider, err))?;
    if bytes.is_empty() || !infer::is_image(&bytes) {
        warn!(
            "{} returned {} byte(s) that are not a recognizable image",
            provider,
            bytes.len()
        );
        return Err(ProviderFailure::EmptyResponse { provider });
    }
    Ok(bytes.to_vec())
}
