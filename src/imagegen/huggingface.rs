use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::HuggingFaceConfig;
use crate::imagegen::models::{ImageModel, ProviderKind};
use crate::imagegen::provider::{read_image_body, transport_failure};
use crate::imagegen::types::{GenerationRequest, ProviderFailure};
use crate::utils::http::get_http_client;

const PROVIDER: ProviderKind = ProviderKind::HuggingFace;
const MAX_MODEL_LOADING_ATTEMPTS: usize = 2;

#[derive(Debug, Serialize)]
struct InferencePayload<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    width: u32,
    height: u32,
    guidance_scale: f32,
    num_inference_steps: u32,
    seed: u64,
}

#[derive(Debug, Default, Deserialize)]
struct InferenceErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    estimated_time: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    config: HuggingFaceConfig,
}

fn failure_for_status(status: StatusCode) -> ProviderFailure {
    match status {
        StatusCode::UNAUTHORIZED => ProviderFailure::Unauthorized { provider: PROVIDER },
        StatusCode::PAYMENT_REQUIRED => ProviderFailure::PaymentRequired { provider: PROVIDER },
        StatusCode::TOO_MANY_REQUESTS => ProviderFailure::RateLimited { provider: PROVIDER },
        StatusCode::SERVICE_UNAVAILABLE => ProviderFailure::ModelLoading { provider: PROVIDER },
        other => ProviderFailure::Status {
            provider: PROVIDER,
            status: other.as_u16(),
        },
    }
}

impl HuggingFaceClient {
    pub fn new(config: HuggingFaceConfig) -> Self {
        HuggingFaceClient { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.has_token() && !self.config.base_url.trim().is_empty()
    }

    fn endpoint(&self, model: ImageModel) -> String {
        format!("{}/{}", self.config.base_url, model.provider_param())
    }

    pub async fn fetch(
        &self,
        request: &GenerationRequest,
        model: ImageModel,
    ) -> Result<Vec<u8>, ProviderFailure> {
        if !self.is_configured() {
            return Err(ProviderFailure::Unauthorized { provider: PROVIDER });
        }

        let prompt = request.styled_prompt();
        let payload = InferencePayload {
            inputs: &prompt,
            parameters: InferenceParameters {
                width: request.settings.width,
                height: request.settings.height,
                guidance_scale: self.config.guidance_scale,
                num_inference_steps: self.config.inference_steps,
                seed: request.resolve_seed(),
            },
        };
        let url = self.endpoint(model);

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = get_http_client()
                .post(&url)
                .bearer_auth(self.config.api_token.trim())
                .timeout(self.config.timeout)
                .json(&payload)
                .send()
                .await
                .map_err(|err| transport_failure(PROVIDER, err))?;

            let status = response.status();
            if status == StatusCode::OK {
                return read_image_body(PROVIDER, response).await;
            }

            let body = response.text().await.unwrap_or_default();
            let parsed: InferenceErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let should_retry = status == StatusCode::SERVICE_UNAVAILABLE
                && attempt < MAX_MODEL_LOADING_ATTEMPTS;
            warn!(
                "Hugging Face API error: status={}, error={:?}, estimated_time={:?}, retrying={}",
                status, parsed.error, parsed.estimated_time, should_retry
            );
            if should_retry {
                info!(
                    "Model {} is loading; retrying in {:?}",
                    model.provider_param(),
                    self.config.model_loading_retry_delay
                );
                tokio::time::sleep(self.config.model_loading_retry_delay).await;
                continue;
            }
            return Err(failure_for_status(status));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::config::HF_TOKEN_PLACEHOLDER;
    use crate::settings::UserSettings;

    const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00";
    const MODEL_PATH: &str = "/stabilityai/stable-diffusion-xl-base-1.0";

    fn client(base_url: &str, token: &str) -> HuggingFaceClient {
        HuggingFaceClient::new(HuggingFaceConfig {
            api_token: token.to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
            model_loading_retry_delay: Duration::ZERO,
            guidance_scale: 7.5,
            inference_steps: 30,
        })
    }

    fn request() -> GenerationRequest {
        let mut settings = UserSettings::with_size(768, 512);
        settings.seed = Some(77);
        settings.model = ImageModel::StableDiffusionXl;
        GenerationRequest::new("lighthouse at dusk", settings)
    }

    #[test]
    fn placeholder_token_is_unconfigured() {
        assert!(!client("https://api-inference.huggingface.co/models", HF_TOKEN_PLACEHOLDER)
            .is_configured());
        assert!(!client("https://api-inference.huggingface.co/models", "").is_configured());
        assert!(client("https://api-inference.huggingface.co/models", "hf_x").is_configured());
    }

    #[tokio::test]
    async fn posts_payload_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", MODEL_PATH)
            .match_header("authorization", "Bearer hf_test")
            .match_body(Matcher::PartialJson(json!({
                "inputs": "lighthouse at dusk",
                "parameters": {
                    "width": 768,
                    "height": 512,
                    "num_inference_steps": 30,
                    "seed": 77
                }
            })))
            .with_status(200)
            .with_body(JPEG_BYTES)
            .create_async()
            .await;

        let bytes = client(&server.url(), "hf_test")
            .fetch(&request(), ImageModel::StableDiffusionXl)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, JPEG_BYTES);
    }

    #[tokio::test]
    async fn model_loading_is_retried_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", MODEL_PATH)
            .with_status(503)
            .with_body(r#"{"error": "Model is currently loading", "estimated_time": 20.0}"#)
            .expect(2)
            .create_async()
            .await;

        let err = client(&server.url(), "hf_test")
            .fetch(&request(), ImageModel::StableDiffusionXl)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(
            err,
            ProviderFailure::ModelLoading {
                provider: ProviderKind::HuggingFace
            }
        );
    }

    #[tokio::test]
    async fn quota_statuses_map_to_distinct_failures() {
        let cases = [
            (401, ProviderFailure::Unauthorized { provider: PROVIDER }),
            (402, ProviderFailure::PaymentRequired { provider: PROVIDER }),
            (429, ProviderFailure::RateLimited { provider: PROVIDER }),
            (
                500,
                ProviderFailure::Status {
                    provider: PROVIDER,
                    status: 500,
                },
            ),
        ];

        for (status, expected) in cases {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("POST", MODEL_PATH)
                .with_status(status)
                .expect(1)
                .create_async()
                .await;

            let err = client(&server.url(), "hf_test")
                .fetch(&request(), ImageModel::StableDiffusionXl)
                .await
                .unwrap_err();

            mock.assert_async().await;
            assert_eq!(err, expected, "status {status}");
        }
    }
}
