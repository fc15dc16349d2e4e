//! HTML message templates and inline keyboards.

use rand::seq::SliceRandom;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, User};

use crate::handlers::callbacks::CallbackAction;
use crate::imagegen::{GeneratedImage, GenerationError, ImageModel, ProviderFailure};
use crate::settings::{StylePreset, UserSettings};

/// Telegram's caption limit, counted in UTF-16 units after entity parsing.
const CAPTION_LIMIT_UTF16: usize = 1024;

const STATUS_EMOJIS: [&str; 18] = [
    "⛅", "🌤️", "❣️", "💖", "🌸", "💝", "💘", "💗", "💓", "💞", "❤️‍🔥", "🌹", "🌺", "🌼", "🌷", "💐",
    "🕊️", "💌",
];

const RANDOM_PROMPTS: [&str; 20] = [
    "futuristic cyberpunk cityscape at night with neon lights",
    "magical forest with glowing mushrooms and fairy lights",
    "steampunk airship floating above clouds",
    "cute anime cat girl with colorful hair",
    "epic dragon flying over medieval castle",
    "abstract cosmic nebula with stars and galaxies",
    "vintage car in rain-soaked city street",
    "peaceful mountain lake at sunset",
    "beautiful anime girl with long flowing hair",
    "cyberpunk samurai in neon-lit alley",
    "fantasy castle on floating island",
    "cute robot companion with glowing eyes",
    "magical portal in enchanted forest",
    "space warrior with energy sword",
    "crystal cave with rainbow reflections",
    "steampunk laboratory with brass machinery",
    "anime schoolgirl in cherry blossom garden",
    "futuristic city with flying cars",
    "mystical phoenix rising from flames",
    "underwater palace with mermaids",
];

/// Square and rectangular presets offered in the size menus.
pub const SIZE_PRESETS: [(u32, u32, &str); 6] = [
    (512, 512, "Square"),
    (768, 768, "Square"),
    (1024, 1024, "Square"),
    (1024, 768, "Wide"),
    (512, 768, "Portrait"),
    (768, 512, "Landscape"),
];

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Length of `html` as Telegram counts it: tags dropped, each entity one unit.
fn visible_utf16_len(html: &str) -> usize {
    let mut len = 0;
    let mut in_tag = false;
    let mut in_entity = false;
    for ch in html.chars() {
        match ch {
            '<' if !in_entity => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '&' => {
                in_entity = true;
                len += 1;
            }
            ';' if in_entity => in_entity = false,
            _ if in_entity => {}
            _ => len += ch.len_utf16(),
        }
    }
    len
}

fn truncate_utf16(text: &str, budget: usize) -> String {
    if text.encode_utf16().count() <= budget {
        return text.to_string();
    }
    let Some(room) = budget.checked_sub(1) else {
        return String::new();
    };
    let mut used = 0;
    let mut truncated = String::new();
    for ch in text.chars() {
        if used + ch.len_utf16() > room {
            break;
        }
        used += ch.len_utf16();
        truncated.push(ch);
    }
    truncated.push('…');
    truncated
}

pub fn full_name(user: &User) -> String {
    let first = user.first_name.trim();
    let last = user.last_name.as_deref().unwrap_or("").trim();
    let name = match (first.is_empty(), last.is_empty()) {
        (false, false) => format!("{first} {last}"),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (true, true) => user
            .username
            .clone()
            .unwrap_or_else(|| "Unknown User".to_string()),
    };
    escape_html(&name)
}

/// Clickable `tg://user` link with the escaped full name.
pub fn mention(user: Option<&User>) -> String {
    match user {
        Some(user) => format!(
            r#"<a href="tg://user?id={}">{}</a>"#,
            user.id.0,
            full_name(user)
        ),
        None => "Unknown User".to_string(),
    }
}

pub fn random_status_emoji() -> &'static str {
    STATUS_EMOJIS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("🌸")
}

pub fn random_prompt() -> &'static str {
    RANDOM_PROMPTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(RANDOM_PROMPTS[0])
}

pub fn welcome(user_name: &str, private_chat: bool, wake_word: &str) -> String {
    if private_chat {
        format!(
            "🌺 <b>Hey there {user_name}, welcome!</b>\n\n\
             🥀 I'm your lovely artist, here just for you!\n\n\
             <blockquote>Tell me your fantasy, and I'll bring it to life softly, beautifully 🌹</blockquote>\n\n\
             💘 Take your time, I'm listening!"
        )
    } else {
        format!(
            "🌺 <b>Hello {user_name}!</b>\n\n\
             🥀 I'm your lovely artist, here for all of you!\n\n\
             <blockquote><code>{} cute anime girl with black hair</code></blockquote>\n\n\
             💘 Just tell me what you want!",
            capitalized(wake_word)
        )
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn help_basic(user_name: &str, wake_word: &str) -> String {
    format!(
        "🌺 <b>Guide for you {user_name}!</b>\n\n\
         🥀 Here's how to get started:\n\n\
         • Private: Type any prompt\n\
         • Groups: <code>{} [prompt]</code>\n\
         • Commands: /generate [prompt]\n\n\
         <blockquote>Example: <code>Cute anime girl with black hair</code></blockquote>\n\n\
         💘 I'm here to listen whenever you're ready.",
        capitalized(wake_word)
    )
}

pub fn help_expanded(user_name: &str, wake_word: &str) -> String {
    let wake = capitalized(wake_word);
    format!(
        "🌺 <b>AI Image Generator Bot - Complete Guide for {user_name}</b>\n\n\
         <b>🥀 Basic Usage:</b>\n\
         • Type any prompt directly (private chat only)\n\
         • Use /generate [prompt] anywhere\n\
         • Click buttons for quick actions\n\n\
         <b>🌷 Group Usage:</b>\n\
         • Type <code>{wake} [your prompt]</code> in groups\n\
         • The bot replies to your message with the generated image\n\n\
         <b>🥀 Available Commands:</b>\n\
         • <code>/start</code> - Main menu and bot info\n\
         • <code>/generate</code> - Full generation interface\n\
         • <code>/settings</code> - Size and reset options\n\
         • <code>/model</code> - Choose the AI model\n\
         • <code>/seed [number]</code> - Pin or clear the seed\n\
         • <code>/help</code> - This help guide\n\n\
         <b>💐️ Features:</b>\n\
         • {} AI models\n\
         • Multiple image sizes (512x512 to 1024x1024)\n\
         • Style presets for easy enhancement\n\
         • Random prompt generator",
        ImageModel::ALL.len()
    )
}

pub fn generate_menu(user_name: &str) -> String {
    format!(
        "🌺 <b>Welcome to my little studio {user_name}!</b>\n\n\
         🥀 You can tell me anything you imagine.\n\n\
         <blockquote> Example: <code>/generate anime girl with blue hair</code></blockquote>\n\n\
         💘 I'll be right here, ready to bring it to life."
    )
}

pub fn model_selection(user_name: &str, current: ImageModel) -> String {
    format!(
        "🤖 <b>AI Model Selection for {user_name}</b>\n\n\
         <b>Current Service:</b> {}\n\
         <b>Current Model:</b> {}\n\n\
         Choose your preferred AI model:",
        current.provider().display_name(),
        current.display_name()
    )
}

pub fn settings_menu(user_name: &str, settings: &UserSettings) -> String {
    let seed = settings
        .seed
        .map(|seed| seed.to_string())
        .unwrap_or_else(|| "Random".to_string());
    format!(
        "⚙️ <b>Settings Menu for {user_name}</b>\n\n\
         <b>Service:</b> {}\n\
         <b>Model:</b> {}\n\
         <b>Size:</b> {}\n\
         <b>Seed:</b> {seed}\n\n\
         Customize your generation settings:",
        settings.model.provider().display_name(),
        settings.model.display_name(),
        settings.size_label()
    )
}

pub fn style_presets(user_name: &str, settings: &UserSettings) -> String {
    let style = settings
        .style_suffix
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "None".to_string());
    format!(
        "🌟 <b>Style Presets for {user_name}</b>\n\n\
         <b>Current Style:</b> {style}\n\n\
         Choose a style to automatically enhance your prompts:"
    )
}

pub fn size_options(user_name: &str, settings: &UserSettings) -> String {
    format!(
        "📊 <b>Image Size Options for {user_name}</b>\n\n\
         <b>Current Size:</b> {}\n\n\
         Choose your preferred image dimensions:",
        settings.size_label()
    )
}

pub fn help_menu(user_name: &str) -> String {
    format!(
        "❓ <b>Help &amp; Guide for {user_name}</b>\n\n\
         <b>🎨 How to Generate:</b>\n\
         • Type any text description\n\
         • Use /generate [prompt]\n\
         • Click 'Generate Sample'\n\n\
         <b>💡 Prompt Tips:</b>\n\
         • Be descriptive: 'anime girl with blue hair'\n\
         • Add style: 'realistic', 'cartoon', 'oil painting'\n\
         • Specify details: colors, lighting, mood\n\n\
         <b>🌟 Example Prompts:</b>\n\
         • 'cyberpunk city at night, neon lights'\n\
         • 'cute cat in a garden, watercolor style'\n\
         • 'fantasy dragon, detailed digital art'"
    )
}

pub fn model_selected(user_name: &str, model: ImageModel) -> String {
    format!(
        "✅ <b>Model Selected for {user_name}</b>\n\n\
         <b>Service:</b> {}\n\
         <b>Model:</b> {}\n\
         <b>Description:</b> {}\n\n\
         You can now generate images with this model!",
        model.provider().display_name(),
        model.display_name(),
        model.description()
    )
}

pub fn size_updated(user_name: &str, width: u32, height: u32) -> String {
    format!(
        "✅ <b>Size updated to {width}x{height} for {user_name}</b>\n\n\
         You can now generate images with the new size!"
    )
}

pub fn style_applied(user_name: &str, style: StylePreset) -> String {
    format!(
        "🎨 <b>Style Applied for {user_name}: {}</b>\n\n\
         <b>Style modifier:</b> {}\n\n\
         This will be added to your prompts automatically!",
        style.title(),
        style.suffix()
    )
}

pub fn settings_reset(user_name: &str, defaults: &UserSettings) -> String {
    format!(
        "🔄 <b>Settings Reset for {user_name}</b>\n\n\
         All settings restored to default values:\n\
         • Service: {}\n\
         • Model: {}\n\
         • Size: {}\n\
         • Style: None\n\n\
         Ready to generate!",
        defaults.model.provider().display_name(),
        defaults.model.display_name(),
        defaults.size_label()
    )
}

pub fn seed_updated(user_name: &str, seed: Option<u64>) -> String {
    match seed {
        Some(seed) => format!(
            "🎲 <b>Seed pinned to <code>{seed}</code> for {user_name}</b>\n\n\
             The same prompt and settings will now give the same image."
        ),
        None => format!(
            "🎲 <b>Seed cleared for {user_name}</b>\n\n\
             Every generation now draws a fresh random seed."
        ),
    }
}

pub fn invalid_seed(user_name: &str) -> String {
    format!(
        "🌺 <b>Hmm {user_name}, that doesn't look like a seed.</b>\n\n\
         <blockquote>Use <code>/seed 12345</code> to pin one or <code>/seed</code> to clear it.</blockquote>"
    )
}

pub fn no_prompt(user_name: &str, wake_word: &str) -> String {
    format!(
        "🌺 <b>Hey there {user_name}!</b>\n\n\
         🥀 I see you called me with my name but didn't tell me what you want.\n\n\
         <blockquote><code>{} cute girl with black hair</code></blockquote>\n\n\
         💘 I'm here just waiting for your lovely idea.",
        capitalized(wake_word)
    )
}

/// Caption for a finished image. Shows the user's own prompt, never the
/// style suffix or quality tags sent upstream.
pub fn image_caption(user_name: &str, prompt: &str, image: &GeneratedImage, reply: bool) -> String {
    let heading = if reply {
        format!("🌺 <b>Generated for {user_name}</b>")
    } else {
        format!("🌺 <b>Generated Image for {user_name}</b>")
    };
    let footer = format!(
        "<i>{} · {}</i>",
        image.model.display_name(),
        image.provider.display_name()
    );
    let frame = |preview: &str| {
        format!("{heading}\n\n<blockquote>{preview}</blockquote>\n\n{footer}")
    };
    let budget = CAPTION_LIMIT_UTF16.saturating_sub(visible_utf16_len(&frame("")));
    frame(&escape_html(&truncate_utf16(prompt, budget)))
}

fn failure_detail(failure: &ProviderFailure) -> Option<&'static str> {
    match failure {
        ProviderFailure::Unauthorized { .. } => Some("the API token was rejected."),
        ProviderFailure::PaymentRequired { .. } => Some("the free quota is used up for now."),
        ProviderFailure::RateLimited { .. } => {
            Some("too many requests right now, please wait a minute.")
        }
        ProviderFailure::ModelLoading { .. } => {
            Some("the model is still warming up, try again shortly.")
        }
        _ => None,
    }
}

pub fn generation_error(user_name: &str, error: &GenerationError) -> String {
    let Some(failure) = error.last_failure() else {
        return format!(
            "🌺 <b>Sorry {user_name}, I can't paint right now.</b>\n\n\
             <blockquote>No image service is configured. Set <code>ENABLE_POLLINATIONS=true</code> \
             or provide <code>HF_API_TOKEN</code>, then restart the bot.</blockquote>"
        );
    };

    match failure {
        ProviderFailure::Timeout { .. } => format!(
            "🌺 <b>That took a little too long {user_name}!</b>\n\n\
             <blockquote>Sometimes dreams take time to bloom, but this one wandered off 🥀.</blockquote>\n\n\
             💘 Maybe try a simpler idea!"
        ),
        ProviderFailure::Transport { .. } => format!(
            "🌺 <b>Hmm {user_name}, something's in the way.</b>\n\n\
             <blockquote>💔 The connection feels a little quiet right now.</blockquote>\n\n\
             🥀 Maybe give it a moment!"
        ),
        other => {
            let mut text = format!(
                "🌺 <b>Oh no {user_name}! something went wrong!</b>\n\n\
                 <blockquote>I'm having a little trouble making your request right now. 😔</blockquote>\n\n\
                 💘 Please try again in a little while, or maybe with a different idea."
            );
            if let Some(detail) = failure_detail(other) {
                text.push_str(&format!(
                    "\n\n<i>{}: {detail}</i>",
                    other.provider().display_name()
                ));
            }
            text
        }
    }
}

fn button(label: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label.into(), action.data())
}

fn back_button() -> InlineKeyboardButton {
    button("⬅️ Back to Generate", CallbackAction::BackToGenerate)
}

pub fn generate_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🤖 Select Model", CallbackAction::SelectModel),
            button("🎨 Generate Sample", CallbackAction::Sample),
        ],
        vec![
            button("⚙️ Settings", CallbackAction::SettingsMenu),
            button("❓ Help", CallbackAction::HelpMenu),
        ],
        vec![
            button("🌟 Style Presets", CallbackAction::StylePresets),
            button("🎲 Random Prompt", CallbackAction::RandomPrompt),
        ],
        vec![
            button("📊 Image Sizes", CallbackAction::SizeOptions),
            button("🔄 Reset Settings", CallbackAction::ResetSettings),
        ],
    ])
}

pub fn model_keyboard(current: ImageModel) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = ImageModel::ALL
        .into_iter()
        .map(|model| {
            let marker = if model == current { "✅ " } else { "" };
            vec![button(
                format!("{marker}{}", model.display_name()),
                CallbackAction::SetModel(model),
            )]
        })
        .collect();
    rows.push(vec![back_button()]);
    InlineKeyboardMarkup::new(rows)
}

pub fn settings_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("512x512", CallbackAction::SetSize { width: 512, height: 512 }),
            button("768x768", CallbackAction::SetSize { width: 768, height: 768 }),
            button("1024x1024", CallbackAction::SetSize { width: 1024, height: 1024 }),
        ],
        vec![
            button("Portrait 512x768", CallbackAction::SetSize { width: 512, height: 768 }),
            button("Landscape 768x512", CallbackAction::SetSize { width: 768, height: 512 }),
        ],
        vec![
            button("🔄 Reset", CallbackAction::ResetSettings),
            button("⬅️ Back", CallbackAction::BackToGenerate),
        ],
    ])
}

pub fn style_keyboard() -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = StylePreset::ALL
        .into_iter()
        .map(|preset| button(preset.label(), CallbackAction::SetStyle(preset)))
        .collect();
    let mut rows: Vec<Vec<InlineKeyboardButton>> =
        buttons.chunks(2).map(|chunk| chunk.to_vec()).collect();
    rows.push(vec![
        button("🔄 Clear Style", CallbackAction::ResetSettings),
        button("⬅️ Back", CallbackAction::BackToGenerate),
    ]);
    InlineKeyboardMarkup::new(rows)
}

pub fn size_keyboard() -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = SIZE_PRESETS
        .into_iter()
        .map(|(width, height, label)| {
            button(
                format!("{width}x{height} ({label})"),
                CallbackAction::SetSize { width, height },
            )
        })
        .collect();
    let mut rows: Vec<Vec<InlineKeyboardButton>> =
        buttons.chunks(2).map(|chunk| chunk.to_vec()).collect();
    rows.push(vec![back_button()]);
    InlineKeyboardMarkup::new(rows)
}

pub fn help_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🎨 Try Sample", CallbackAction::Sample),
            button("🤖 Select Model", CallbackAction::SelectModel),
        ],
        vec![back_button()],
    ])
}

/// Buttons under a confirmation view, with `more` leading back to the menu
/// the change came from.
pub fn confirmation_keyboard(more_label: &str, more: CallbackAction) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🎨 Generate Sample", CallbackAction::Sample),
            button(more_label, more),
        ],
        vec![back_button()],
    ])
}

pub fn guide_keyboard(expanded: bool) -> InlineKeyboardMarkup {
    let toggle = if expanded {
        button("📚 Minimize Guide", CallbackAction::MinimizeGuide)
    } else {
        button("📖 Expand Guide", CallbackAction::ExpandGuide)
    };
    InlineKeyboardMarkup::new(vec![vec![toggle]])
}

pub fn delete_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🗑️ Delete", CallbackAction::DeleteMessage)]])
}
