use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};

use crate::handlers::generation::{run_generation, GenerationJob};
use crate::handlers::templates;
use crate::state::AppState;

/// What a plain text message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextIntent {
    Ignore,
    /// Whole text is the prompt (private chats).
    Prompt(String),
    /// Wake-word with nothing after it.
    WakeWordOnly,
    /// Wake-word followed by a prompt; the reply threads to the message.
    WakeWordPrompt(String),
}

const WAKE_WORD_TRAILING_PUNCTUATION: [char; 6] = [',', ':', ';', '!', '.', '?'];

fn strip_wake_word<'a>(text: &'a str, wake_word: &str) -> Option<&'a str> {
    let first = text.split_whitespace().next()?;
    let bare = first.trim_end_matches(WAKE_WORD_TRAILING_PUNCTUATION);
    if bare.to_lowercase() != wake_word.to_lowercase() {
        return None;
    }
    // `text` is trimmed, so the first word starts at offset zero.
    Some(text[first.len()..].trim())
}

/// The wake-word must be the whole first word, matched case-insensitively;
/// trailing punctuation such as `Mikasa,` still counts.
pub fn classify_text(text: &str, private_chat: bool, wake_word: &str) -> TextIntent {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return TextIntent::Ignore;
    }

    if !wake_word.is_empty() {
        if let Some(rest) = strip_wake_word(trimmed, wake_word) {
            return if rest.is_empty() {
                TextIntent::WakeWordOnly
            } else {
                TextIntent::WakeWordPrompt(rest.to_string())
            };
        }
    }

    if private_chat {
        TextIntent::Prompt(trimmed.to_string())
    } else {
        TextIntent::Ignore
    }
}

pub async fn text_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(text) = message.text() else {
        return Ok(());
    };

    match classify_text(text, message.chat.is_private(), &state.wake_word) {
        TextIntent::Ignore => {}
        TextIntent::WakeWordOnly => {
            let user_name = templates::mention(message.from.as_ref());
            bot.send_message(
                message.chat.id,
                templates::no_prompt(&user_name, &state.wake_word),
            )
            .reply_parameters(ReplyParameters::new(message.id))
            .parse_mode(ParseMode::Html)
            .reply_markup(templates::delete_keyboard())
            .await?;
        }
        TextIntent::Prompt(prompt) => {
            let job = GenerationJob {
                command: "text",
                chat_id: message.chat.id,
                reply_to: Some(message.id),
                user: message.from.clone(),
                prompt,
                short_caption: false,
            };
            run_generation(bot, state, job).await?;
        }
        TextIntent::WakeWordPrompt(prompt) => {
            let job = GenerationJob {
                command: "wake_word",
                chat_id: message.chat.id,
                reply_to: Some(message.id),
                user: message.from.clone(),
                prompt,
                short_caption: true,
            };
            run_generation(bot, state, job).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;
    use crate::imagegen::ImageGenerator;
    use crate::settings::{SettingsStore, UserSettings};

    #[test]
    fn private_text_is_a_prompt() {
        assert_eq!(
            classify_text("  a quiet harbor at dawn ", true, "mikasa"),
            TextIntent::Prompt("a quiet harbor at dawn".to_string())
        );
    }

    #[test]
    fn group_text_without_wake_word_is_ignored() {
        assert_eq!(
            classify_text("a quiet harbor at dawn", false, "mikasa"),
            TextIntent::Ignore
        );
    }

    #[test]
    fn commands_are_ignored_everywhere() {
        assert_eq!(classify_text("/generate cat", true, "mikasa"), TextIntent::Ignore);
        assert_eq!(classify_text("/start", false, "mikasa"), TextIntent::Ignore);
    }

    #[test]
    fn wake_word_prompt_is_case_insensitive() {
        let expected = TextIntent::WakeWordPrompt("cute anime girl with black hair".to_string());
        assert_eq!(
            classify_text("Mikasa cute anime girl with black hair", false, "mikasa"),
            expected
        );
        assert_eq!(
            classify_text("MIKASA   cute anime girl with black hair", true, "mikasa"),
            expected
        );
    }

    #[test]
    fn bare_wake_word_asks_for_a_prompt() {
        assert_eq!(classify_text("mikasa", false, "mikasa"), TextIntent::WakeWordOnly);
        assert_eq!(classify_text(" Mikasa  ", true, "mikasa"), TextIntent::WakeWordOnly);
        let reply = templates::no_prompt("Ada", "mikasa");
        assert!(reply.contains("Mikasa cute girl with black hair"));
    }

    #[test]
    fn wake_word_must_be_a_whole_word() {
        assert_eq!(
            classify_text("mikasalover draws cats", false, "mikasa"),
            TextIntent::Ignore
        );
        assert_eq!(
            classify_text("mikasalover draws cats", true, "mikasa"),
            TextIntent::Prompt("mikasalover draws cats".to_string())
        );
    }

    #[test]
    fn wake_word_followed_by_punctuation_still_triggers() {
        assert_eq!(
            classify_text("Mikasa, draw a cat", false, "mikasa"),
            TextIntent::WakeWordPrompt("draw a cat".to_string())
        );
        assert_eq!(
            classify_text("mikasa: a lighthouse at dusk", false, "mikasa"),
            TextIntent::WakeWordPrompt("a lighthouse at dusk".to_string())
        );
        assert_eq!(classify_text("Mikasa!", false, "mikasa"), TextIntent::WakeWordOnly);
        assert_eq!(
            classify_text("mikasalover, draw a cat", false, "mikasa"),
            TextIntent::Ignore
        );
    }

    #[test]
    fn empty_wake_word_disables_the_trigger() {
        assert_eq!(classify_text("mikasa cat", false, ""), TextIntent::Ignore);
    }

    #[tokio::test]
    async fn private_prompt_placeholder_replies_to_the_message() {
        let sent_message = json!({
            "ok": true,
            "result": {
                "message_id": 56,
                "date": 1_700_000_000,
                "chat": {"id": 42, "type": "private", "first_name": "Ada"},
                "text": "🌸"
            }
        })
        .to_string();
        let mut telegram = Server::new_async().await;
        let placeholder = telegram
            .mock("POST", Matcher::Regex(r"(?i)^/bot[^/]+/sendmessage$".to_string()))
            .match_body(Matcher::Regex(r#""reply_parameters":\{"message_id":55"#.to_string()))
            .with_status(200)
            .with_body(sent_message.clone())
            .expect(1)
            .create_async()
            .await;
        let _chat_action = telegram
            .mock("POST", Matcher::Regex(r"(?i)^/bot[^/]+/sendchataction$".to_string()))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await;
        let _edit = telegram
            .mock("POST", Matcher::Regex(r"(?i)^/bot[^/]+/editmessagetext$".to_string()))
            .with_status(200)
            .with_body(sent_message.clone())
            .create_async()
            .await;

        let message: Message = serde_json::from_value(json!({
            "message_id": 55,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private", "first_name": "Ada"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
            "text": "a red fox in snow"
        }))
        .unwrap();
        let bot = Bot::new("t").set_api_url(reqwest::Url::parse(&telegram.url()).unwrap());
        let state = AppState::new(
            SettingsStore::new(UserSettings::default()),
            ImageGenerator::new(Vec::new()),
            "mikasa",
        );

        text_handler(bot, state, message).await.unwrap();

        placeholder.assert_async().await;
    }
}
