pub mod fallback;
pub mod huggingface;
pub mod models;
pub mod pollinations;
pub mod provider;
pub mod types;

pub use fallback::ImageGenerator;
pub use models::ImageModel;
pub use types::{GeneratedImage, GenerationError, GenerationRequest, ProviderFailure};
