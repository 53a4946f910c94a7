//! Webhook Manager Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn, error};

use webhook_manager::{
    config::Settings,
    utils::{helpers::mask_token, logging},
    services::ServiceFactory,
    state::{ScenarioManager, StateStorage, StateStorageManager},
    i18n::I18n,
    middleware::LoggingMiddleware,
    handlers::{
        ConversationManager,
        commands::{handle_command, Command},
        callbacks::handle_callback_query,
        messages::handle_message,
    },
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration; a missing or placeholder token stops here
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", webhook_manager::info());
    info!(bot = %mask_token(&settings.bot.token), "Configuration loaded");

    // Initialize i18n system
    info!("Loading translations...");
    let mut i18n = I18n::new(&settings.i18n);
    i18n.load_translations().await?;
    let stats = i18n.get_stats();
    info!(languages = stats.languages.len(), keys = stats.total_keys, "Translations loaded");

    // Initialize state management
    let state_storage = StateStorage::new();
    let mut storage_manager = StateStorageManager::new(
        state_storage.clone(),
        Duration::from_secs(settings.state.cleanup_interval_seconds),
    );
    storage_manager.start_cleanup();
    let scenario_manager = ScenarioManager::new(chrono::Duration::seconds(
        i64::try_from(settings.state.ttl_seconds).unwrap_or(i64::MAX),
    ));

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(&settings)?;
    let manager = Arc::new(ConversationManager::new(
        state_storage,
        scenario_manager,
        services,
        Arc::new(i18n),
    ));

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        logging::log_api_error("setMyCommands", &e.to_string(), Some("command list not registered"));
    }

    info!("Setting up bot handlers...");
    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![manager, LoggingMiddleware::default()])
        .default_handler(|upd| async move {
            warn!(update_id = upd.id.0, "Unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error occurred while handling an update",
        ))
        .enable_ctrlc_handler()
        .build();

    info!("Webhook manager bot is running (long polling)");
    dispatcher.dispatch().await;

    storage_manager.stop_cleanup();
    info!("Webhook manager bot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .inspect(|update: Update, middleware: LoggingMiddleware| middleware.log_update(&update))
        .branch(
            Update::filter_message()
                .branch(
                    // Handle commands
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_commands),
                )
                .branch(
                    // Handle free text
                    dptree::filter(|msg: Message| msg.text().is_some())
                        .endpoint(handle_messages),
                ),
        )
        .branch(
            // Handle menu buttons
            Update::filter_callback_query().endpoint(handle_callbacks),
        )
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: Command,
    manager: Arc<ConversationManager>,
) -> HandlerResult {
    let chat_id = msg.chat.id;

    if let Err(e) = handle_command(bot, msg, cmd, manager).await {
        error!(chat_id = chat_id.0, error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle free-text messages
async fn handle_messages(
    bot: Bot,
    msg: Message,
    manager: Arc<ConversationManager>,
) -> HandlerResult {
    let chat_id = msg.chat.id;

    if let Err(e) = handle_message(bot, msg, manager).await {
        error!(chat_id = chat_id.0, error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(
    bot: Bot,
    query: teloxide::types::CallbackQuery,
    manager: Arc<ConversationManager>,
) -> HandlerResult {
    let user_id = query.from.id.0;

    if let Err(e) = handle_callback_query(bot, query, manager).await {
        error!(user_id = user_id, error = %e, "Error handling callback query");
        return Err(e.into());
    }

    Ok(())
}
