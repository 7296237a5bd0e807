use crate::application::guide_service::GuideService;
use crate::data::guide_repository::SqliteGuideRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{ListGuidesQuery, ListGuidesResponse};
use crate::presentation::handlers::request_id;
use actix_web::{HttpRequest, HttpResponse, Scope, get, web};
use tracing::info;

const MAX_PAGE: i64 = 100;

pub fn scope() -> Scope {
    web::scope("/api")
        .service(list_guides)
        .service(get_guide)
        .service(get_stats)
}

#[get("/guides")]
async fn list_guides(
    req: HttpRequest,
    guides: web::Data<GuideService<SqliteGuideRepository>>,
    query: web::Query<ListGuidesQuery>,
) -> Result<HttpResponse, DomainError> {
    let query = query.into_inner();
    let limit = query.limit.map(|limit| limit.clamp(1, MAX_PAGE));

    let result = match query.q.as_deref() {
        Some(term) => guides.search(term, limit.or(Some(MAX_PAGE))).await?,
        None => guides.list_guides(limit).await?,
    };

    info!(
        request_id = %request_id(&req),
        count = result.len(),
        "guides retrieved"
    );

    Ok(HttpResponse::Ok().json(ListGuidesResponse {
        total: result.len(),
        guides: result,
    }))
}

#[get("/guides/{message_id}")]
async fn get_guide(
    guides: web::Data<GuideService<SqliteGuideRepository>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let guide = guides.get_guide(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(guide))
}

#[get("/stats")]
async fn get_stats(
    guides: web::Data<GuideService<SqliteGuideRepository>>,
) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse::Ok().json(guides.stats().await?))
}
