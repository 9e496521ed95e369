// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Google Sheets)
// - `discord/` = Discord-specific adapters (commands, channel)
// - `webhook/` = Inbound HTTP boundary for form submissions
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Spawn the webhook listener

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "webhook/webhook_server.rs"]
mod webhook;

mod config;

use crate::config::{AppConfig, LookupStrategy};
use crate::core::announce::{AnnounceService, CorrelationLog};
use crate::core::worklog::WorklogService;
use crate::discord::announce::{ChannelHistoryLog, SerenityAnnouncementChannel};
use crate::discord::{Data, Error};
use crate::infra::sheets::{ServiceAccountAuth, SheetCorrelationLog, SheetRowStore, SheetsClient};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Log command failures instead of letting poise print to stderr.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    tracing::error!("Command error: {:?}", error);
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let app_config = AppConfig::from_env().expect("Invalid configuration");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let auth = ServiceAccountAuth::from_env()
        .await
        .expect("Failed to load Google service account credentials");
    let sheets = Arc::new(SheetsClient::new(auth));

    // Read side: the summary commands scan the form responses sheet.
    let row_store = SheetRowStore::new(
        Arc::clone(&sheets),
        app_config.spreadsheet_id.clone(),
        app_config.worksheet_name.clone(),
    );
    let worklog_service = Arc::new(WorklogService::new(row_store));

    // Create the data structure that will be shared across all commands
    let data = Data {
        worklog: Arc::clone(&worklog_service),
        timezone: app_config.timezone,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let token = app_config.discord_token.clone();
    let setup_config = app_config.clone();
    let setup_sheets = Arc::clone(&sheets);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::worklog::w(),
                discord::commands::worklog::most(),
                discord::commands::help::ping(),
                discord::commands::help::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(app_config.command_prefix.clone()),
                case_insensitive_commands: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "Bot is ready");

                // Write side: the webhook path talks to the announcement
                // channel through the Discord REST API, so it can only be
                // wired up once we have an authenticated Http handle.
                let channel = Arc::new(SerenityAnnouncementChannel::new(
                    ctx.http.clone(),
                    setup_config.announce_channel_id,
                ));

                let log: Arc<dyn CorrelationLog> = match setup_config.lookup_strategy {
                    LookupStrategy::Log => Arc::new(SheetCorrelationLog::new(
                        Arc::clone(&setup_sheets),
                        setup_config.spreadsheet_id.clone(),
                        setup_config.log_worksheet_name.clone(),
                    )),
                    LookupStrategy::History => Arc::new(ChannelHistoryLog::new(
                        ctx.http.clone(),
                        setup_config.announce_channel_id,
                    )),
                };

                let announce_service = Arc::new(AnnounceService::new(
                    log,
                    channel,
                    setup_config.announce_marker.clone(),
                ));

                // Hand-off channel between the HTTP handlers and the bot's
                // runtime, then the listener itself.
                let handle =
                    webhook::spawn_dispatcher(announce_service, setup_config.dispatch_timeout);
                let port = setup_config.webhook_port;
                tokio::spawn(async move {
                    if let Err(err) = webhook::serve(port, handle).await {
                        tracing::error!(error = %err, "Webhook server exited");
                    }
                });

                Ok(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
