use std::future::{Ready, ready};
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_service::{Service, Transform};
use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
static TIMING_HEADER: HeaderName = HeaderName::from_static("server-timing");
pub static SECRET_TOKEN_HEADER: HeaderName =
    HeaderName::from_static("x-telegram-bot-api-secret-token");

#[derive(Clone)]
pub struct RequestId(pub String);

// Telegram hits the webhook once per update, so those requests are logged at
// debug level; everything else is logged at info.
pub struct RequestTrace {
    webhook_path: Rc<str>,
}

impl RequestTrace {
    pub fn new(webhook_path: &str) -> Self {
        Self {
            webhook_path: Rc::from(webhook_path),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestTrace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTraceService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTraceService {
            service,
            webhook_path: self.webhook_path.clone(),
        }))
    }
}

pub struct RequestTraceService<S> {
    service: S,
    webhook_path: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for RequestTraceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let request_id = req
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let method = req.method().clone();
        let path = req.path().to_owned();
        let is_webhook = path == *self.webhook_path;

        req.extensions_mut().insert(RequestId(request_id.clone()));
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let status = res.status().as_u16();
            if is_webhook {
                debug!(request_id = %request_id, status, elapsed_ms, "webhook delivery handled");
            } else {
                info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status,
                    elapsed_ms,
                    "request completed"
                );
            }

            let headers = res.response_mut().headers_mut();
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                headers.insert(REQUEST_ID_HEADER.clone(), value);
            }
            if let Ok(value) = HeaderValue::from_str(&format!("app;dur={elapsed_ms}")) {
                headers.insert(TIMING_HEADER.clone(), value);
            }
            Ok(res)
        })
    }
}

// Without a configured secret every request passes.
pub struct WebhookSecretMiddleware {
    secret: Option<Rc<str>>,
}

impl WebhookSecretMiddleware {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.map(Rc::from),
        }
    }
}

impl<S, B: 'static> Transform<S, ServiceRequest> for WebhookSecretMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = WebhookSecretService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookSecretService {
            service,
            secret: self.secret.clone(),
        }))
    }
}

pub struct WebhookSecretService<S> {
    service: S,
    secret: Option<Rc<str>>,
}

impl<S, B: 'static> Service<ServiceRequest> for WebhookSecretService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authorized = match &self.secret {
            None => true,
            Some(secret) => req
                .headers()
                .get(&SECRET_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|token| token == &**secret),
        };

        if !authorized {
            warn!(path = %req.path(), "webhook call with wrong secret token");
            let response = HttpResponse::Unauthorized()
                .json(json!({ "ok": false, "error": "invalid secret token" }))
                .map_into_right_body();
            return Box::pin(async move { Ok(req.into_response(response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}
