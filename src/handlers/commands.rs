use std::time::Instant;

use anyhow::Result;
use rand::seq::SliceRandom;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, ReplyParameters,
};
use tracing::{info, warn};

use crate::config::CONFIG;
use crate::handlers::generation::{run_generation, GenerationJob};
use crate::handlers::templates;
use crate::settings::SettingsPatch;
use crate::state::AppState;
use crate::utils::telegram::user_id_of;

#[derive(Debug, PartialEq, Eq)]
pub enum SeedArg {
    Clear,
    Pin(u64),
    Invalid,
}

pub fn parse_seed_arg(arg: &str) -> SeedArg {
    let trimmed = arg.trim();
    if trimmed.is_empty() {
        return SeedArg::Clear;
    }
    match trimmed.parse::<u64>() {
        Ok(seed) => SeedArg::Pin(seed),
        Err(_) => SeedArg::Invalid,
    }
}

fn url_button(label: &str, raw: &str) -> Option<InlineKeyboardButton> {
    match reqwest::Url::parse(raw.trim()) {
        Ok(url) => Some(InlineKeyboardButton::url(label.to_string(), url)),
        Err(err) => {
            if !raw.trim().is_empty() {
                warn!("Skipping start button {label:?}: invalid url {raw:?}: {err}");
            }
            None
        }
    }
}

/// Links under the welcome message; unset or invalid URLs are left out.
pub fn start_keyboard(
    updates_url: &str,
    support_url: &str,
    bot_username: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    let links: Vec<InlineKeyboardButton> = [
        url_button("Updates", updates_url),
        url_button("Support", support_url),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !links.is_empty() {
        rows.push(links);
    }
    if let Some(button) = bot_username.and_then(|username| {
        url_button(
            "Add Me To Your Group",
            &format!("https://t.me/{username}?startgroup=true"),
        )
    }) {
        rows.push(vec![button]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub async fn start_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let user_name = templates::mention(message.from.as_ref());
    let text = templates::welcome(&user_name, message.chat.is_private(), &state.wake_word);

    let bot_username = match bot.get_me().await {
        Ok(me) => me.user.username.clone(),
        Err(err) => {
            warn!("get_me failed while building /start keyboard: {err}");
            None
        }
    };
    let keyboard = start_keyboard(
        &CONFIG.updates_channel_url,
        &CONFIG.support_group_url,
        bot_username.as_deref(),
    );

    let photo = CONFIG
        .start_photos
        .choose(&mut rand::thread_rng())
        .and_then(|raw| reqwest::Url::parse(raw).ok());
    if let Some(photo) = photo {
        let sent = bot
            .send_photo(message.chat.id, InputFile::url(photo))
            .caption(text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await;
        match sent {
            Ok(_) => return Ok(()),
            Err(err) => warn!("Start photo failed, falling back to text: {err}"),
        }
    }

    bot.send_message(message.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

pub async fn help_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let user_name = templates::mention(message.from.as_ref());
    bot.send_message(
        message.chat.id,
        templates::help_basic(&user_name, &state.wake_word),
    )
    .reply_parameters(ReplyParameters::new(message.id))
    .parse_mode(ParseMode::Html)
    .reply_markup(templates::guide_keyboard(false))
    .await?;
    Ok(())
}

pub async fn generate_handler(
    bot: Bot,
    state: AppState,
    message: Message,
    prompt: Option<String>,
) -> Result<()> {
    let Some(prompt) = prompt else {
        let user_name = templates::mention(message.from.as_ref());
        bot.send_message(message.chat.id, templates::generate_menu(&user_name))
            .reply_parameters(ReplyParameters::new(message.id))
            .parse_mode(ParseMode::Html)
            .reply_markup(templates::generate_menu_keyboard())
            .await?;
        return Ok(());
    };

    let job = GenerationJob {
        command: "generate",
        chat_id: message.chat.id,
        reply_to: Some(message.id),
        user: message.from.clone(),
        prompt,
        short_caption: false,
    };
    run_generation(bot, state, job).await
}

pub async fn settings_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let user_name = templates::mention(message.from.as_ref());
    let settings = state.settings.get(user_id_of(message.from.as_ref()));
    bot.send_message(
        message.chat.id,
        templates::settings_menu(&user_name, &settings),
    )
    .reply_parameters(ReplyParameters::new(message.id))
    .parse_mode(ParseMode::Html)
    .reply_markup(templates::settings_keyboard())
    .await?;
    Ok(())
}

pub async fn model_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let user_name = templates::mention(message.from.as_ref());
    let current = state.settings.get(user_id_of(message.from.as_ref())).model;
    bot.send_message(
        message.chat.id,
        templates::model_selection(&user_name, current),
    )
    .reply_parameters(ReplyParameters::new(message.id))
    .parse_mode(ParseMode::Html)
    .reply_markup(templates::model_keyboard(current))
    .await?;
    Ok(())
}

pub async fn seed_handler(bot: Bot, state: AppState, message: Message, arg: String) -> Result<()> {
    let user_name = templates::mention(message.from.as_ref());
    let user_id = user_id_of(message.from.as_ref());
    let text = match parse_seed_arg(&arg) {
        SeedArg::Clear => {
            state.settings.set(user_id, SettingsPatch::seed(None));
            templates::seed_updated(&user_name, None)
        }
        SeedArg::Pin(seed) => {
            state.settings.set(user_id, SettingsPatch::seed(Some(seed)));
            templates::seed_updated(&user_name, Some(seed))
        }
        SeedArg::Invalid => templates::invalid_seed(&user_name),
    };
    bot.send_message(message.chat.id, text)
        .reply_parameters(ReplyParameters::new(message.id))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn ping_handler(bot: Bot, message: Message) -> Result<()> {
    let started = Instant::now();
    let reply = bot
        .send_message(message.chat.id, "🛰️ Pinging...")
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(chat_id = message.chat.id.0, elapsed_ms, "Ping answered");

    bot.edit_message_text(
        message.chat.id,
        reply.id,
        format!("🏓 <b>Pong!</b> {elapsed_ms:.2}ms"),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;
    use crate::imagegen::ImageGenerator;
    use crate::settings::{SettingsStore, UserSettings};

    #[test]
    fn seed_argument_parsing() {
        assert_eq!(parse_seed_arg(""), SeedArg::Clear);
        assert_eq!(parse_seed_arg("   "), SeedArg::Clear);
        assert_eq!(parse_seed_arg(" 4242 "), SeedArg::Pin(4242));
        assert_eq!(parse_seed_arg("-1"), SeedArg::Invalid);
        assert_eq!(parse_seed_arg("lucky"), SeedArg::Invalid);
    }

    #[test]
    fn start_keyboard_links() {
        let keyboard = start_keyboard(
            "https://t.me/WorkGlows",
            "https://t.me/SoulMeetsHQ",
            Some("studio_bot"),
        );
        let urls: Vec<String> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::Url(url) => Some(url.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://t.me/WorkGlows".to_string(),
                "https://t.me/SoulMeetsHQ".to_string(),
                "https://t.me/studio_bot?startgroup=true".to_string(),
            ]
        );
    }

    #[test]
    fn start_keyboard_skips_missing_links() {
        let keyboard = start_keyboard("", "not a url", None);
        assert!(keyboard.inline_keyboard.is_empty());
    }

    #[tokio::test]
    async fn help_uses_the_wake_word_from_state() {
        let mut telegram = Server::new_async().await;
        let help = telegram
            .mock("POST", Matcher::Regex(r"(?i)^/bot[^/]+/sendmessage$".to_string()))
            .match_body(Matcher::Regex("Groups: <code>Nami \\[prompt\\]</code>".to_string()))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "result": {
                        "message_id": 11,
                        "date": 1_700_000_000,
                        "chat": {"id": 42, "type": "private", "first_name": "Ada"},
                        "text": "guide"
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let message: Message = serde_json::from_value(json!({
            "message_id": 10,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private", "first_name": "Ada"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
            "text": "/help"
        }))
        .unwrap();
        let bot = Bot::new("t").set_api_url(reqwest::Url::parse(&telegram.url()).unwrap());
        let state = AppState::new(
            SettingsStore::new(UserSettings::default()),
            ImageGenerator::new(Vec::new()),
            "nami",
        );

        help_handler(bot, state, message).await.unwrap();

        help.assert_async().await;
    }
}
