use std::fmt;
use std::str::FromStr;

/// Image-generation services the bot can talk to, in static fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Pollinations,
    HuggingFace,
}

impl ProviderKind {
    pub const FALLBACK_ORDER: [ProviderKind; 2] =
        [ProviderKind::Pollinations, ProviderKind::HuggingFace];

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Pollinations => "🌸 Pollinations AI",
            ProviderKind::HuggingFace => "🤗 Hugging Face",
        }
    }

    pub fn log_name(self) -> &'static str {
        match self {
            ProviderKind::Pollinations => "pollinations",
            ProviderKind::HuggingFace => "huggingface",
        }
    }

    pub fn default_model(self) -> ImageModel {
        match self {
            ProviderKind::Pollinations => ImageModel::Flux,
            ProviderKind::HuggingFace => ImageModel::StableDiffusionXl,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.log_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageModel {
    #[default]
    Flux,
    Turbo,
    FluxRealism,
    FluxAnime,
    StableDiffusionXl,
}

impl ImageModel {
    pub const ALL: [ImageModel; 5] = [
        ImageModel::Flux,
        ImageModel::Turbo,
        ImageModel::FluxRealism,
        ImageModel::FluxAnime,
        ImageModel::StableDiffusionXl,
    ];

    /// Identifier used in callback payloads and logs.
    pub fn key(self) -> &'static str {
        match self {
            ImageModel::Flux => "flux",
            ImageModel::Turbo => "turbo",
            ImageModel::FluxRealism => "flux-realism",
            ImageModel::FluxAnime => "flux-anime",
            ImageModel::StableDiffusionXl => "sdxl",
        }
    }

    pub fn provider(self) -> ProviderKind {
        match self {
            ImageModel::StableDiffusionXl => ProviderKind::HuggingFace,
            _ => ProviderKind::Pollinations,
        }
    }

    /// Value sent to the provider: the Pollinations `model` query parameter or
    /// the Hugging Face model repository.
    pub fn provider_param(self) -> &'static str {
        match self {
            ImageModel::Flux => "flux",
            ImageModel::Turbo => "turbo",
            ImageModel::FluxRealism => "flux-realism",
            ImageModel::FluxAnime => "flux-anime",
            ImageModel::StableDiffusionXl => "stabilityai/stable-diffusion-xl-base-1.0",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ImageModel::Flux => "FLUX (Recommended)",
            ImageModel::Turbo => "Turbo (Fast)",
            ImageModel::FluxRealism => "FLUX Realism",
            ImageModel::FluxAnime => "FLUX Anime",
            ImageModel::StableDiffusionXl => "Stable Diffusion XL",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ImageModel::Flux => "High quality, best results",
            ImageModel::Turbo => "Quick generation",
            ImageModel::FluxRealism => "Realistic photos",
            ImageModel::FluxAnime => "Anime and manga style",
            ImageModel::StableDiffusionXl => "Hugging Face inference, needs an API token",
        }
    }

    /// The model a provider should use for a user whose selection may belong
    /// to another provider.
    pub fn for_provider(self, provider: ProviderKind) -> ImageModel {
        if self.provider() == provider {
            self
        } else {
            provider.default_model()
        }
    }
}

impl FromStr for ImageModel {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_lowercase();
        ImageModel::ALL
            .into_iter()
            .find(|model| model.key() == lowered)
            .ok_or(())
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_model_key() {
        for model in ImageModel::ALL {
            assert_eq!(model.key().parse::<ImageModel>(), Ok(model));
        }
        assert_eq!("FLUX-Anime".parse::<ImageModel>(), Ok(ImageModel::FluxAnime));
        assert!("dall-e".parse::<ImageModel>().is_err());
    }

    #[test]
    fn foreign_models_map_to_provider_default() {
        assert_eq!(
            ImageModel::FluxAnime.for_provider(ProviderKind::HuggingFace),
            ImageModel::StableDiffusionXl
        );
        assert_eq!(
            ImageModel::StableDiffusionXl.for_provider(ProviderKind::Pollinations),
            ImageModel::Flux
        );
        assert_eq!(
            ImageModel::Turbo.for_provider(ProviderKind::Pollinations),
            ImageModel::Turbo
        );
    }
}
