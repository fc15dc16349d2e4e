use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatAction, User};
use tokio::task::JoinHandle;
use tracing::debug;

const CHAT_ACTION_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(4);

/// Repeats `upload_photo` while a generation runs; stops when dropped.
pub struct UploadPhotoHeartbeat {
    task_handle: Option<JoinHandle<()>>,
}

impl Drop for UploadPhotoHeartbeat {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

pub fn start_upload_photo_heartbeat(bot: Bot, chat_id: ChatId) -> UploadPhotoHeartbeat {
    let task_handle = tokio::spawn(async move {
        loop {
            if let Err(err) = bot.send_chat_action(chat_id, ChatAction::UploadPhoto).await {
                debug!("send_chat_action failed for chat {}: {err}", chat_id.0);
                break;
            }
            tokio::time::sleep(CHAT_ACTION_HEARTBEAT_INTERVAL).await;
        }
    });

    UploadPhotoHeartbeat {
        task_handle: Some(task_handle),
    }
}

pub fn user_id_of(user: Option<&User>) -> i64 {
    user.and_then(|user| i64::try_from(user.id.0).ok())
        .unwrap_or_default()
}
