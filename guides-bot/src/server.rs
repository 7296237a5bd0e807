use std::sync::Arc;

use crate::application::guide_service::GuideService;
use crate::data::guide_repository::SqliteGuideRepository;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::telegram::TelegramClient;
use crate::presentation::dispatcher::UpdateDispatcher;
use crate::presentation::handlers;
use crate::presentation::middleware::RequestTrace;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

pub type BotDispatcher = UpdateDispatcher<SqliteGuideRepository, TelegramClient>;

pub async fn start_http_server(
    config: &AppConfig,
    guide_service: GuideService<SqliteGuideRepository>,
    dispatcher: Arc<BotDispatcher>,
) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);
    let webhook_path = config.webhook_path.clone();
    let webhook_secret = config.webhook_secret.clone();
    let guide_service = web::Data::new(guide_service);
    let dispatcher = web::Data::from(dispatcher);

    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    HttpServer::new(move || {
        App::new()
            .wrap(RequestTrace::new(&webhook_path))
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer")),
            )
            .app_data(guide_service.clone())
            .app_data(dispatcher.clone())
            .route("/health", web::get().to(health))
            .service(handlers::guides::scope())
            .configure(|cfg| {
                handlers::webhook::configure::<SqliteGuideRepository, TelegramClient>(
                    cfg,
                    &webhook_path,
                    webhook_secret.clone(),
                )
            })
    })
    .bind(bind_address)?
    .run()
    .await?;

    info!("HTTP server stopped");
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
