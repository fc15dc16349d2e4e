use std::error::Error;

use dotenvy::dotenv;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

mod config;
mod handlers;
mod imagegen;
mod settings;
mod state;
mod utils;

use config::CONFIG;
use handlers::{callbacks, commands, messages};
use state::AppState;
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
enum Command {
    #[command(description = "Start the bot and see the welcome message")]
    Start,
    #[command(description = "Show the usage guide")]
    Help,
    #[command(description = "Generate an image from a prompt")]
    Generate(String),
    #[command(description = "Adjust size and other settings")]
    Settings,
    #[command(description = "Choose the AI model")]
    Model,
    #[command(description = "Pin a seed, or clear it with no number")]
    Seed(String),
    #[command(description = "Check that the bot is alive")]
    Ping,
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let _guards = init_logging(&CONFIG.log_level);

    if !CONFIG.has_bot_token() {
        return Err("BOT_TOKEN is not set; put your bot token in the environment or .env".into());
    }

    let bot = Bot::new(CONFIG.bot_token.trim().to_string());
    info!("Starting Pollinations studio bot");

    let state = AppState::from_config(&CONFIG);
    let providers = state.generator.configured_providers();
    if providers.is_empty() {
        warn!("No image provider is configured; every generation will fail");
    } else {
        info!(
            "Image providers in fallback order: {}",
            providers
                .iter()
                .map(|provider| provider.log_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {err}");
    }

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text_message))
        .endpoint(ignore_message);

    let callback_handler = Update::filter_callback_query().endpoint(handle_callback_query);

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    state: AppState,
    message: Message,
    command: Command,
) -> HandlerResult {
    fn optional_arg(arg: String) -> Option<String> {
        let trimmed = arg.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    match command {
        Command::Start => commands::start_handler(bot, state, message).await?,
        Command::Help => commands::help_handler(bot, state, message).await?,
        Command::Generate(arg) => {
            let prompt = optional_arg(arg);
            tokio::spawn(async move {
                if let Err(err) = commands::generate_handler(bot, state, message, prompt).await {
                    error!("generate handler failed: {err}");
                }
            });
        }
        Command::Settings => commands::settings_handler(bot, state, message).await?,
        Command::Model => commands::model_handler(bot, state, message).await?,
        Command::Seed(arg) => commands::seed_handler(bot, state, message, arg).await?,
        Command::Ping => commands::ping_handler(bot, message).await?,
    }
    Ok(())
}

async fn handle_text_message(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    tokio::spawn(async move {
        if let Err(err) = messages::text_handler(bot, state, message).await {
            error!("text handler failed: {err}");
        }
    });
    Ok(())
}

async fn handle_callback_query(bot: Bot, state: AppState, query: CallbackQuery) -> HandlerResult {
    tokio::spawn(async move {
        if let Err(err) = callbacks::callback_handler(bot, state, query).await {
            error!("callback handler failed: {err}");
        }
    });
    Ok(())
}

async fn ignore_message(_message: Message) -> HandlerResult {
    Ok(())
}
