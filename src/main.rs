use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use coffee_bot::bot;
use coffee_bot::config::{BotConfig, LogFormat};
use coffee_bot::db::{self, PgStore};
use coffee_bot::navigation::{Navigator, NavigatorOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Coffee Bot");
    info!(config = ?config, "Configuration loaded");

    let catalog = Arc::new(config.load_catalog()?);
    info!(items = catalog.len(), "Catalog ready");

    let pool = db::connect(&config.database_url, config.database_max_connections).await?;
    db::init_database_schema(&pool).await?;

    let store = Arc::new(PgStore::new(pool, Arc::clone(&catalog)));
    let navigator = Arc::new(Navigator::new(
        catalog,
        store.clone(),
        store,
        NavigatorOptions {
            clear_cart_on_checkout: config.clear_cart_on_checkout,
        },
    ));

    let bot = Bot::new(&config.telegram_bot_token);
    let config = Arc::new(config);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler))
        .branch(Update::filter_message().endpoint(bot::message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![navigator, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Coffee Bot stopped");
    Ok(())
}

/// Initialize tracing with EnvFilter, defaulting to info for our crate
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "coffee_bot=info,teloxide=warn".into());

    let json = format == LogFormat::Json;
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
