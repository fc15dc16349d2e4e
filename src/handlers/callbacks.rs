use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MaybeInaccessibleMessage, ParseMode};
use tracing::{debug, warn};

use crate::handlers::generation::{run_generation, GenerationJob};
use crate::handlers::templates;
use crate::imagegen::ImageModel;
use crate::settings::{SettingsPatch, StylePreset};
use crate::state::AppState;
use crate::utils::telegram::user_id_of;

const SIZE_PREFIX: &str = "size_";
const MODEL_PREFIX: &str = "model_";
const STYLE_PREFIX: &str = "style_";
const MAX_CALLBACK_DIMENSION: u32 = 2048;

/// Decoded inline-button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Sample,
    RandomPrompt,
    SelectModel,
    SettingsMenu,
    HelpMenu,
    StylePresets,
    SizeOptions,
    BackToGenerate,
    ResetSettings,
    ExpandGuide,
    MinimizeGuide,
    DeleteMessage,
    SetModel(ImageModel),
    SetSize { width: u32, height: u32 },
    SetStyle(StylePreset),
}

const NAMED_ACTIONS: [(&str, CallbackAction); 12] = [
    ("sample", CallbackAction::Sample),
    ("random_prompt", CallbackAction::RandomPrompt),
    ("select_model", CallbackAction::SelectModel),
    ("settings_menu", CallbackAction::SettingsMenu),
    ("help_menu", CallbackAction::HelpMenu),
    ("style_presets", CallbackAction::StylePresets),
    ("size_options", CallbackAction::SizeOptions),
    ("back_to_generate", CallbackAction::BackToGenerate),
    ("reset_settings", CallbackAction::ResetSettings),
    ("expand_guide", CallbackAction::ExpandGuide),
    ("minimize_guide", CallbackAction::MinimizeGuide),
    ("delete_message", CallbackAction::DeleteMessage),
];

fn parse_dimension(raw: &str) -> Option<u32> {
    raw.parse::<u32>()
        .ok()
        .filter(|value| (1..=MAX_CALLBACK_DIMENSION).contains(value))
}

fn parse_size(payload: &str) -> Option<CallbackAction> {
    let mut parts = payload.split('_');
    let width = parse_dimension(parts.next()?)?;
    let height = match parts.next() {
        Some(raw) => parse_dimension(raw)?,
        None => width,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(CallbackAction::SetSize { width, height })
}

impl CallbackAction {
    /// Named payloads win over prefixed ones, so `size_options` is a menu
    /// and never a malformed size.
    pub fn parse(data: &str) -> Option<Self> {
        if let Some((_, action)) = NAMED_ACTIONS.iter().find(|(name, _)| *name == data) {
            return Some(*action);
        }
        if let Some(payload) = data.strip_prefix(SIZE_PREFIX) {
            return parse_size(payload);
        }
        if let Some(key) = data.strip_prefix(MODEL_PREFIX) {
            return key.parse().ok().map(CallbackAction::SetModel);
        }
        if let Some(key) = data.strip_prefix(STYLE_PREFIX) {
            return key.parse().ok().map(CallbackAction::SetStyle);
        }
        None
    }

    pub fn data(&self) -> String {
        match self {
            CallbackAction::SetModel(model) => format!("{MODEL_PREFIX}{}", model.key()),
            CallbackAction::SetSize { width, height } => {
                format!("{SIZE_PREFIX}{width}_{height}")
            }
            CallbackAction::SetStyle(preset) => format!("{STYLE_PREFIX}{}", preset.key()),
            named => NAMED_ACTIONS
                .iter()
                .find(|(_, action)| action == named)
                .map(|(name, _)| (*name).to_string())
                .unwrap_or_default(),
        }
    }
}

async fn edit_view(
    bot: &Bot,
    message: &MaybeInaccessibleMessage,
    text: String,
    keyboard: InlineKeyboardMarkup,
) {
    let result = bot
        .edit_message_text(message.chat().id, message.id(), text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await;
    if let Err(err) = result {
        // Telegram rejects edits that leave the message unchanged.
        debug!("Callback view edit skipped: {err}");
    }
}

pub async fn callback_handler(bot: Bot, state: AppState, query: CallbackQuery) -> Result<()> {
    let Some(data) = query.data.as_deref() else {
        let _ = bot.answer_callback_query(query.id.clone()).await;
        return Ok(());
    };
    let Some(action) = CallbackAction::parse(data) else {
        debug!("Ignoring unknown callback payload: {data}");
        let _ = bot.answer_callback_query(query.id.clone()).await;
        return Ok(());
    };
    let Some(message) = query.message.as_ref() else {
        let _ = bot.answer_callback_query(query.id.clone()).await;
        return Ok(());
    };

    if action == CallbackAction::DeleteMessage {
        if let Err(err) = bot.delete_message(message.chat().id, message.id()).await {
            warn!("Failed to delete message on request: {err}");
            let _ = bot
                .answer_callback_query(query.id.clone())
                .text("Cannot delete this message.")
                .show_alert(true)
                .await;
        } else {
            let _ = bot.answer_callback_query(query.id.clone()).await;
        }
        return Ok(());
    }

    let _ = bot.answer_callback_query(query.id.clone()).await;

    let user = &query.from;
    let user_id = user_id_of(Some(user));
    let user_name = templates::mention(Some(user));

    match action {
        CallbackAction::Sample | CallbackAction::RandomPrompt => {
            let command = if action == CallbackAction::Sample {
                "sample"
            } else {
                "random_prompt"
            };
            let job = GenerationJob {
                command,
                chat_id: message.chat().id,
                reply_to: None,
                user: Some(user.clone()),
                prompt: templates::random_prompt().to_string(),
                short_caption: false,
            };
            run_generation(bot, state, job).await?;
        }
        CallbackAction::SelectModel => {
            let current = state.settings.get(user_id).model;
            edit_view(
                &bot,
                message,
                templates::model_selection(&user_name, current),
                templates::model_keyboard(current),
            )
            .await;
        }
        CallbackAction::SettingsMenu => {
            let settings = state.settings.get(user_id);
            edit_view(
                &bot,
                message,
                templates::settings_menu(&user_name, &settings),
                templates::settings_keyboard(),
            )
            .await;
        }
        CallbackAction::HelpMenu => {
            edit_view(
                &bot,
                message,
                templates::help_menu(&user_name),
                templates::help_menu_keyboard(),
            )
            .await;
        }
        CallbackAction::StylePresets => {
            let settings = state.settings.get(user_id);
            edit_view(
                &bot,
                message,
                templates::style_presets(&user_name, &settings),
                templates::style_keyboard(),
            )
            .await;
        }
        CallbackAction::SizeOptions => {
            let settings = state.settings.get(user_id);
            edit_view(
                &bot,
                message,
                templates::size_options(&user_name, &settings),
                templates::size_keyboard(),
            )
            .await;
        }
        CallbackAction::BackToGenerate => {
            edit_view(
                &bot,
                message,
                templates::generate_menu(&user_name),
                templates::generate_menu_keyboard(),
            )
            .await;
        }
        CallbackAction::ResetSettings => {
            state.settings.reset(user_id);
            edit_view(
                &bot,
                message,
                templates::settings_reset(&user_name, state.settings.defaults()),
                templates::confirmation_keyboard("⚙️ Settings", CallbackAction::SettingsMenu),
            )
            .await;
        }
        CallbackAction::ExpandGuide => {
            edit_view(
                &bot,
                message,
                templates::help_expanded(&user_name, &state.wake_word),
                templates::guide_keyboard(true),
            )
            .await;
        }
        CallbackAction::MinimizeGuide => {
            edit_view(
                &bot,
                message,
                templates::help_basic(&user_name, &state.wake_word),
                templates::guide_keyboard(false),
            )
            .await;
        }
        CallbackAction::SetModel(model) => {
            state.settings.set(user_id, SettingsPatch::model(model));
            edit_view(
                &bot,
                message,
                templates::model_selected(&user_name, model),
                templates::confirmation_keyboard("🤖 Change Model", CallbackAction::SelectModel),
            )
            .await;
        }
        CallbackAction::SetSize { width, height } => {
            state.settings.set(user_id, SettingsPatch::size(width, height));
            edit_view(
                &bot,
                message,
                templates::size_updated(&user_name, width, height),
                templates::confirmation_keyboard("📊 More Sizes", CallbackAction::SizeOptions),
            )
            .await;
        }
        CallbackAction::SetStyle(preset) => {
            state.settings.set(
                user_id,
                SettingsPatch::style_suffix(Some(preset.suffix().to_string())),
            );
            edit_view(
                &bot,
                message,
                templates::style_applied(&user_name, preset),
                templates::confirmation_keyboard("🌟 More Styles", CallbackAction::StylePresets),
            )
            .await;
        }
        CallbackAction::DeleteMessage => {}
    }

    Ok(())
}
