use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreset {
    Anime,
    Realistic,
    Fantasy,
    Cyberpunk,
    Cartoon,
    OilPainting,
    Watercolor,
    DigitalArt,
    Vintage,
    Minimalist,
}

impl StylePreset {
    pub const ALL: [StylePreset; 10] = [
        StylePreset::Anime,
        StylePreset::Realistic,
        StylePreset::Fantasy,
        StylePreset::Cyberpunk,
        StylePreset::Cartoon,
        StylePreset::OilPainting,
        StylePreset::Watercolor,
        StylePreset::DigitalArt,
        StylePreset::Vintage,
        StylePreset::Minimalist,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StylePreset::Anime => "anime",
            StylePreset::Realistic => "realistic",
            StylePreset::Fantasy => "fantasy",
            StylePreset::Cyberpunk => "cyberpunk",
            StylePreset::Cartoon => "cartoon",
            StylePreset::OilPainting => "oil_painting",
            StylePreset::Watercolor => "watercolor",
            StylePreset::DigitalArt => "digital_art",
            StylePreset::Vintage => "vintage",
            StylePreset::Minimalist => "minimalist",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            StylePreset::Anime => "anime style, detailed anime art, vibrant colors",
            StylePreset::Realistic => "photorealistic, high detail, professional photography",
            StylePreset::Fantasy => "fantasy art, magical, ethereal, mystical",
            StylePreset::Cyberpunk => "cyberpunk style, neon lights, futuristic, dark atmosphere",
            StylePreset::Cartoon => "cartoon style, colorful, playful, animated",
            StylePreset::OilPainting => "oil painting style, classical art, brush strokes",
            StylePreset::Watercolor => "watercolor painting, soft colors, artistic",
            StylePreset::DigitalArt => "digital art, concept art, detailed illustration",
            StylePreset::Vintage => "vintage style, retro, classic, nostalgic",
            StylePreset::Minimalist => "minimalist style, clean, simple, modern",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StylePreset::Anime => "🎌 Anime",
            StylePreset::Realistic => "📸 Realistic",
            StylePreset::Fantasy => "🧙 Fantasy",
            StylePreset::Cyberpunk => "🌆 Cyberpunk",
            StylePreset::Cartoon => "🎨 Cartoon",
            StylePreset::OilPainting => "🖼️ Oil Painting",
            StylePreset::Watercolor => "🌊 Watercolor",
            StylePreset::DigitalArt => "💻 Digital Art",
            StylePreset::Vintage => "📼 Vintage",
            StylePreset::Minimalist => "🔵 Minimalist",
        }
    }

    /// Human title, e.g. `oil_painting` -> `Oil Painting`.
    pub fn title(self) -> String {
        self.key()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for StylePreset {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        StylePreset::ALL
            .into_iter()
            .find(|preset| preset.key() == value)
            .ok_or(())
    }
}
