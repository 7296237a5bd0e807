use std::sync::Arc;

use anyhow::Context;
use guides_bot::application::guide_service::GuideService;
use guides_bot::application::ingest_service::IngestService;
use guides_bot::data::guide_repository::SqliteGuideRepository;
use guides_bot::domain::channel_post::ChannelName;
use guides_bot::infrastructure::config::AppConfig;
use guides_bot::infrastructure::database::{create_pool, run_migrations};
use guides_bot::infrastructure::logging::init_logging;
use guides_bot::infrastructure::telegram::TelegramClient;
use guides_bot::presentation::dispatcher::UpdateDispatcher;
use guides_bot::presentation::polling::run_polling;
use guides_bot::server::start_http_server;
use tracing::{error, info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration, refusing to start");
            return Err(e.into());
        }
    };

    let pool = create_pool(&config.database_url)
        .await
        .context("failed to open database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let channel = ChannelName::new(&config.channel_username);
    let guide_repo = Arc::new(SqliteGuideRepository::new(pool));
    let guide_service = GuideService::new(Arc::clone(&guide_repo));
    let ingest_service = IngestService::new(Arc::clone(&guide_repo), channel.clone());

    let telegram = Arc::new(TelegramClient::new(
        &config.telegram_api_url,
        &config.bot_token,
    )?);
    let bot_username = match telegram.get_me().await {
        Ok(me) => me.username,
        Err(e) => {
            warn!(error = %e, "getMe failed, addressed commands will be ignored");
            None
        }
    };
    let dispatcher = Arc::new(
        UpdateDispatcher::new(ingest_service, guide_service.clone(), Arc::clone(&telegram))
            .with_bot_username(bot_username),
    );

    info!(channel = %channel, "guides bot starting");

    match config.webhook_endpoint() {
        Some(endpoint) => {
            telegram
                .set_webhook(&endpoint, config.webhook_secret.as_deref())
                .await
                .context("failed to register webhook")?;
            start_http_server(&config, guide_service, dispatcher).await
        }
        None => {
            info!("WEBHOOK_URL not set, falling back to long polling");
            telegram
                .delete_webhook()
                .await
                .context("failed to remove webhook")?;
            let poller =
                actix_web::rt::spawn(run_polling(Arc::clone(&telegram), Arc::clone(&dispatcher)));
            let result = start_http_server(&config, guide_service, dispatcher).await;
            poller.abort();
            result
        }
    }
}
