use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;
use tracing::{debug, warn};

use crate::data::guide_repository::GuideRepository;
use crate::infrastructure::telegram::BotApi;
use crate::presentation::dispatcher::UpdateDispatcher;
use crate::presentation::dto::Update;
use crate::presentation::handlers::request_id;
use crate::presentation::middleware::WebhookSecretMiddleware;

pub fn configure<R, B>(cfg: &mut web::ServiceConfig, path: &str, secret: Option<String>)
where
    R: GuideRepository + 'static,
    B: BotApi + 'static,
{
    cfg.service(
        web::resource(path)
            .route(
                web::post()
                    .to(receive_update::<R, B>)
                    .wrap(WebhookSecretMiddleware::new(secret)),
            )
            .default_service(web::to(method_not_allowed)),
    );
}

// Well-formed updates are always acknowledged, even when handling failed.
async fn receive_update<R, B>(
    req: HttpRequest,
    body: web::Bytes,
    dispatcher: web::Data<UpdateDispatcher<R, B>>,
) -> HttpResponse
where
    R: GuideRepository + 'static,
    B: BotApi + 'static,
{
    let request_id = request_id(&req);

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "unparsable update");
            return HttpResponse::BadRequest()
                .json(json!({ "ok": false, "error": "invalid update" }));
        }
    };

    let update_id = update.update_id;
    if let Err(e) = dispatcher.dispatch(update).await {
        warn!(request_id = %request_id, update_id, error = %e, "replying to update failed");
    } else {
        debug!(request_id = %request_id, update_id, "update handled");
    }

    HttpResponse::Ok().json(json!({ "ok": true }))
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "POST"))
        .json(json!({ "ok": false, "error": "method not allowed" }))
}
