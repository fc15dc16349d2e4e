use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::utils::logging::TIMING_TARGET;

const PROMPT_PREVIEW_CHARS: usize = 120;

fn preview(text: &str) -> String {
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= PROMPT_PREVIEW_CHARS {
        return flattened;
    }
    let truncated: String = flattened.chars().take(PROMPT_PREVIEW_CHARS).collect();
    format!("{truncated}...")
}

/// Tracks one generation from the inbound update to the final reply.
#[derive(Debug)]
pub struct CommandTimer {
    command: &'static str,
    chat_id: i64,
    user_id: i64,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    completed: bool,
}

impl CommandTimer {
    pub fn start(command: &'static str, chat_id: i64, user_id: i64, prompt: &str) -> Self {
        let timer = CommandTimer {
            command,
            chat_id,
            user_id,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            completed: false,
        };
        info!(
            target: TIMING_TARGET,
            event = "command_received",
            command = timer.command,
            chat_id = timer.chat_id,
            user_id = timer.user_id,
            received_at = %timer.started_at.to_rfc3339(),
            prompt = %preview(prompt),
        );
        timer
    }

    pub fn complete(&mut self, status: &str, detail: Option<&str>) {
        if self.completed {
            return;
        }
        self.completed = true;
        info!(
            target: TIMING_TARGET,
            event = "command_completed",
            command = self.command,
            chat_id = self.chat_id,
            user_id = self.user_id,
            started_at = %self.started_at.to_rfc3339(),
            duration_s = self.started_perf.elapsed().as_secs_f64(),
            status,
            detail = detail.unwrap_or_default(),
        );
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        self.complete("dropped", None);
    }
}

/// Wraps one provider attempt with request/response timing events.
pub async fn log_provider_timing<T, E, F, Fut>(provider: &str, model: &str, call: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let started_perf = Instant::now();
    info!(
        target: TIMING_TARGET,
        event = "provider_request",
        provider,
        model,
        started_at = %Utc::now().to_rfc3339(),
    );

    let result = call().await;

    let (status, detail) = match &result {
        Ok(_) => ("success", String::new()),
        Err(err) => ("error", err.to_string()),
    };
    info!(
        target: TIMING_TARGET,
        event = "provider_response",
        provider,
        model,
        duration_s = started_perf.elapsed().as_secs_f64(),
        status,
        detail = %detail,
    );

    result
}
