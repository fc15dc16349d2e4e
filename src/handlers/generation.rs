use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{
    InputFile, InputMedia, InputMediaPhoto, MessageId, ParseMode, ReplyParameters, User,
};
use tracing::{error, warn};

use crate::handlers::templates;
use crate::imagegen::GeneratedImage;
use crate::state::AppState;
use crate::utils::telegram::{start_upload_photo_heartbeat, user_id_of};
use crate::utils::timing::CommandTimer;

/// Where a generation came from and where its result goes.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub command: &'static str,
    pub chat_id: ChatId,
    /// Message the placeholder replies to; `None` posts it standalone.
    pub reply_to: Option<MessageId>,
    pub user: Option<User>,
    pub prompt: String,
    /// Wake-word replies use the shorter "Generated for" caption heading.
    pub short_caption: bool,
}

fn photo_file(image: &GeneratedImage) -> InputFile {
    let extension = infer::get(&image.bytes)
        .map(|kind| kind.extension())
        .unwrap_or("png");
    InputFile::memory(image.bytes.clone()).file_name(format!("image.{extension}"))
}

/// Posts a status emoji, runs the fallback chain and swaps the placeholder
/// for the image or an error template.
pub async fn run_generation(bot: Bot, state: AppState, job: GenerationJob) -> Result<()> {
    let user_id = user_id_of(job.user.as_ref());
    let user_name = templates::mention(job.user.as_ref());
    let mut timer = CommandTimer::start(job.command, job.chat_id.0, user_id, &job.prompt);

    let mut placeholder_request =
        bot.send_message(job.chat_id, templates::random_status_emoji());
    if let Some(reply_to) = job.reply_to {
        placeholder_request =
            placeholder_request.reply_parameters(ReplyParameters::new(reply_to));
    }
    let placeholder = match placeholder_request.await {
        Ok(message) => message,
        Err(err) => {
            timer.complete("error", Some("placeholder_failed"));
            return Err(err.into());
        }
    };

    let heartbeat = start_upload_photo_heartbeat(bot.clone(), job.chat_id);
    let (request, result) = state.generate(user_id, &job.prompt).await;
    drop(heartbeat);

    match result {
        Ok(image) => {
            let caption = templates::image_caption(
                &user_name,
                &request.prompt,
                &image,
                job.short_caption,
            );
            deliver_image(&bot, &job, placeholder.id, &image, caption).await;
            timer.complete("success", Some(image.provider.log_name()));
        }
        Err(err) => {
            warn!(user_id, "Image generation failed: {err}");
            let text = templates::generation_error(&user_name, &err);
            deliver_text(&bot, &job, placeholder.id, text).await;
            timer.complete("error", Some(&err.to_string()));
        }
    }

    Ok(())
}

async fn deliver_image(
    bot: &Bot,
    job: &GenerationJob,
    placeholder_id: MessageId,
    image: &GeneratedImage,
    caption: String,
) {
    let media = InputMedia::Photo(
        InputMediaPhoto::new(photo_file(image))
            .caption(caption.clone())
            .parse_mode(ParseMode::Html),
    );
    if bot
        .edit_message_media(job.chat_id, placeholder_id, media)
        .await
        .is_ok()
    {
        return;
    }

    let mut request = bot
        .send_photo(job.chat_id, photo_file(image))
        .caption(caption)
        .parse_mode(ParseMode::Html);
    if let Some(reply_to) = job.reply_to {
        request = request.reply_parameters(ReplyParameters::new(reply_to));
    }
    match request.await {
        Ok(_) => {
            let _ = bot.delete_message(job.chat_id, placeholder_id).await;
        }
        Err(err) => error!(
            "Failed to deliver image to chat {}: {err}",
            job.chat_id.0
        ),
    }
}

async fn deliver_text(bot: &Bot, job: &GenerationJob, placeholder_id: MessageId, text: String) {
    if bot
        .edit_message_text(job.chat_id, placeholder_id, text.clone())
        .parse_mode(ParseMode::Html)
        .await
        .is_ok()
    {
        return;
    }

    let mut request = bot.send_message(job.chat_id, text).parse_mode(ParseMode::Html);
    if let Some(reply_to) = job.reply_to {
        request = request.reply_parameters(ReplyParameters::new(reply_to));
    }
    if let Err(err) = request.await {
        error!(
            "Failed to deliver error message to chat {}: {err}",
            job.chat_id.0
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::{Matcher, Mock, Server};
    use serde_json::json;

    use super::*;
    use crate::config::PollinationsConfig;
    use crate::imagegen::pollinations::PollinationsClient;
    use crate::imagegen::provider::ImageProvider;
    use crate::imagegen::ImageGenerator;
    use crate::settings::{SettingsStore, UserSettings};

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
    const CANT_EDIT: &str =
        r#"{"ok":false,"error_code":400,"description":"Bad Request: message can't be edited"}"#;
    const CHAT_NOT_FOUND: &str =
        r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
    const OK_TRUE: &str = r#"{"ok":true,"result":true}"#;
    // The placeholder is a lone status emoji; error templates are much longer.
    const PLACEHOLDER_BODY: &str = r#""text":"[^"]{1,16}""#;

    fn telegram_method(name: &str) -> Matcher {
        Matcher::Regex(format!(r"(?i)^/bot[^/]+/{name}$"))
    }

    fn message_response(message_id: i32) -> String {
        json!({
            "ok": true,
            "result": {
                "message_id": message_id,
                "date": 1_700_000_000,
                "chat": {"id": 42, "type": "private", "first_name": "Ada"},
                "text": "🌸"
            }
        })
        .to_string()
    }

    fn test_bot(server: &Server) -> Bot {
        Bot::new("t").set_api_url(reqwest::Url::parse(&server.url()).unwrap())
    }

    fn job() -> GenerationJob {
        GenerationJob {
            command: "generate",
            chat_id: ChatId(42),
            reply_to: Some(MessageId(7)),
            user: None,
            prompt: "a red fox in snow".to_string(),
            short_caption: false,
        }
    }

    fn state_with(providers: Vec<ImageProvider>) -> AppState {
        AppState::new(
            SettingsStore::new(UserSettings::default()),
            ImageGenerator::new(providers),
            "mikasa",
        )
    }

    fn pollinations(base_url: &str) -> ImageProvider {
        ImageProvider::Pollinations(PollinationsClient::new(PollinationsConfig {
            enabled: true,
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }))
    }

    async fn mock_placeholder(telegram: &mut Server) -> Mock {
        telegram
            .mock("POST", telegram_method("sendMessage"))
            .match_body(Matcher::Regex(PLACEHOLDER_BODY.to_string()))
            .with_status(200)
            .with_body(message_response(100))
            .expect(1)
            .create_async()
            .await
    }

    async fn mock_chat_action(telegram: &mut Server) -> Mock {
        telegram
            .mock("POST", telegram_method("sendChatAction"))
            .with_status(200)
            .with_body(OK_TRUE)
            .create_async()
            .await
    }

    async fn mock_image_upstream(upstream: &mut Server) -> Mock {
        upstream
            .mock("GET", Matcher::Regex("^/prompt/.+".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(PNG_BYTES)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn error_edit_success_needs_no_fallback() {
        let mut telegram = Server::new_async().await;
        let placeholder = mock_placeholder(&mut telegram).await;
        let _chat_action = mock_chat_action(&mut telegram).await;
        let edit = telegram
            .mock("POST", telegram_method("editMessageText"))
            .match_body(Matcher::Regex("No image service is configured".to_string()))
            .with_status(200)
            .with_body(message_response(100))
            .expect(1)
            .create_async()
            .await;
        let fallback = telegram
            .mock("POST", telegram_method("sendMessage"))
            .match_body(Matcher::Regex("No image service is configured".to_string()))
            .expect(0)
            .create_async()
            .await;

        run_generation(test_bot(&telegram), state_with(Vec::new()), job())
            .await
            .unwrap();

        placeholder.assert_async().await;
        edit.assert_async().await;
        fallback.assert_async().await;
    }

    #[tokio::test]
    async fn failed_error_edit_sends_a_new_message() {
        let mut telegram = Server::new_async().await;
        let placeholder = mock_placeholder(&mut telegram).await;
        let _chat_action = mock_chat_action(&mut telegram).await;
        let edit = telegram
            .mock("POST", telegram_method("editMessageText"))
            .with_status(400)
            .with_body(CANT_EDIT)
            .expect(1)
            .create_async()
            .await;
        let fallback = telegram
            .mock("POST", telegram_method("sendMessage"))
            .match_body(Matcher::Regex("No image service is configured".to_string()))
            .with_status(200)
            .with_body(message_response(101))
            .expect(1)
            .create_async()
            .await;

        run_generation(test_bot(&telegram), state_with(Vec::new()), job())
            .await
            .unwrap();

        placeholder.assert_async().await;
        edit.assert_async().await;
        fallback.assert_async().await;
    }

    #[tokio::test]
    async fn error_delivery_failing_twice_is_logged_not_raised() {
        let mut telegram = Server::new_async().await;
        let _placeholder = mock_placeholder(&mut telegram).await;
        let _chat_action = mock_chat_action(&mut telegram).await;
        let edit = telegram
            .mock("POST", telegram_method("editMessageText"))
            .with_status(400)
            .with_body(CANT_EDIT)
            .expect(1)
            .create_async()
            .await;
        let fallback = telegram
            .mock("POST", telegram_method("sendMessage"))
            .match_body(Matcher::Regex("No image service is configured".to_string()))
            .with_status(400)
            .with_body(CHAT_NOT_FOUND)
            .expect(1)
            .create_async()
            .await;

        let result = run_generation(test_bot(&telegram), state_with(Vec::new()), job()).await;

        assert!(result.is_ok());
        edit.assert_async().await;
        fallback.assert_async().await;
    }

    #[tokio::test]
    async fn failed_media_edit_sends_photo_and_removes_placeholder() {
        let mut upstream = Server::new_async().await;
        let _image = mock_image_upstream(&mut upstream).await;
        let mut telegram = Server::new_async().await;
        let placeholder = mock_placeholder(&mut telegram).await;
        let _chat_action = mock_chat_action(&mut telegram).await;
        let edit = telegram
            .mock("POST", telegram_method("editMessageMedia"))
            .with_status(400)
            .with_body(CANT_EDIT)
            .expect(1)
            .create_async()
            .await;
        let photo = telegram
            .mock("POST", telegram_method("sendPhoto"))
            .with_status(200)
            .with_body(message_response(102))
            .expect(1)
            .create_async()
            .await;
        let delete = telegram
            .mock("POST", telegram_method("deleteMessage"))
            .with_status(200)
            .with_body(OK_TRUE)
            .expect(1)
            .create_async()
            .await;

        let state = state_with(vec![pollinations(&upstream.url())]);
        run_generation(test_bot(&telegram), state, job())
            .await
            .unwrap();

        placeholder.assert_async().await;
        edit.assert_async().await;
        photo.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn image_delivery_failing_twice_keeps_placeholder_and_returns_ok() {
        let mut upstream = Server::new_async().await;
        let _image = mock_image_upstream(&mut upstream).await;
        let mut telegram = Server::new_async().await;
        let _placeholder = mock_placeholder(&mut telegram).await;
        let _chat_action = mock_chat_action(&mut telegram).await;
        let edit = telegram
            .mock("POST", telegram_method("editMessageMedia"))
            .with_status(400)
            .with_body(CANT_EDIT)
            .expect(1)
            .create_async()
            .await;
        let photo = telegram
            .mock("POST", telegram_method("sendPhoto"))
            .with_status(400)
            .with_body(CHAT_NOT_FOUND)
            .expect(1)
            .create_async()
            .await;
        let delete = telegram
            .mock("POST", telegram_method("deleteMessage"))
            .expect(0)
            .create_async()
            .await;

        let state = state_with(vec![pollinations(&upstream.url())]);
        let result = run_generation(test_bot(&telegram), state, job()).await;

        assert!(result.is_ok());
        edit.assert_async().await;
        photo.assert_async().await;
        delete.assert_async().await;
    }
}
