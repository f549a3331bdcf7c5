use anyhow::Result;
use rusqlite::Connection;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use storebot::bot::{self, AppContext};
use storebot::catalog::{Catalog, FlowConfig};
use storebot::config::Config;
use storebot::session::SessionStore;
use storebot::{db, health};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file before reading config
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting storefront bot");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration, refusing to start");
            std::process::exit(1);
        }
    };

    info!(db_path = %config.db_path, "Initializing database");
    let conn = Connection::open(&config.db_path)?;
    db::init_schema(&conn)?;

    health::spawn(config.health_port).await?;

    let bot = Bot::new(config.bot_token.clone());
    let ctx = Arc::new(AppContext {
        conn: Arc::new(Mutex::new(conn)),
        sessions: SessionStore::new(),
        catalog: Catalog::storefront(),
        flow: FlowConfig::default(),
        config,
    });

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let ctx = Arc::clone(&ctx);
            move |bot: Bot, msg: Message| {
                let ctx = Arc::clone(&ctx);
                async move { bot::message_handler(bot, msg, ctx).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let ctx = Arc::clone(&ctx);
            move |bot: Bot, q: CallbackQuery| {
                let ctx = Arc::clone(&ctx);
                async move { bot::callback_handler(bot, q, ctx).await }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}
