use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::config::PollinationsConfig;
use crate::imagegen::models::{ImageModel, ProviderKind};
use crate::imagegen::provider::{read_image_body, transport_failure};
use crate::imagegen::types::{GenerationRequest, ProviderFailure};
use crate::utils::http::get_http_client;

const PROVIDER: ProviderKind = ProviderKind::Pollinations;
pub const QUALITY_SUFFIX: &str = "detailed, high quality, 8k";

#[derive(Debug, Clone)]
pub struct PollinationsClient {
    config: PollinationsConfig,
}

/// Prompt actually sent to Pollinations: styled prompt plus the quality tags.
pub fn enhance_prompt(styled_prompt: &str) -> String {
    format!("{styled_prompt}, {QUALITY_SUFFIX}")
}

impl PollinationsClient {
    pub fn new(config: PollinationsConfig) -> Self {
        PollinationsClient { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.enabled && !self.config.base_url.trim().is_empty()
    }

    /// `{base}/prompt/{prompt}?width=&height=&seed=&model=`, with the prompt
    /// escaped as one path segment.
    pub fn build_url(
        &self,
        request: &GenerationRequest,
        model: ImageModel,
        seed: u64,
    ) -> Result<Url, ProviderFailure> {
        let invalid_base = |detail: String| ProviderFailure::Transport {
            provider: PROVIDER,
            message: format!("invalid base url {}: {detail}", self.config.base_url),
        };

        let mut url = Url::parse(&self.config.base_url).map_err(|err| invalid_base(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid_base("cannot be a base".to_string()))?
            .pop_if_empty()
            .push("prompt")
            .push(&enhance_prompt(&request.styled_prompt()));
        url.query_pairs_mut()
            .append_pair("width", &request.settings.width.to_string())
            .append_pair("height", &request.settings.height.to_string())
            .append_pair("seed", &seed.to_string())
            .append_pair("model", model.provider_param());
        Ok(url)
    }

    pub async fn fetch(
        &self,
        request: &GenerationRequest,
        model: ImageModel,
    ) -> Result<Vec<u8>, ProviderFailure> {
        let seed = request.resolve_seed();
        let url = self.build_url(request, model, seed)?;
        debug!(target: "imagegen.pollinations", model = model.key(), seed, url = %url);

        let response = get_http_client()
            .get(url)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|err| transport_failure(PROVIDER, err))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Pollinations API error: status={}", status);
            return Err(ProviderFailure::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        read_image_body(PROVIDER, response).await
    }
}
