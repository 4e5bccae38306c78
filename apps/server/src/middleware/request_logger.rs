//! Request logging middleware.
//!
//! Tags every request with a short id so the log lines of one conversion
//! (upload, tool run, storage, cleanup) can be correlated.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let request_id = Uuid::new_v4().simple().to_string()[..12].to_string();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let content_length = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        let span = info_span!("request", id = %request_id);

        span.in_scope(|| {
            info!(
                target: "api",
                method = %method,
                path = %path,
                remote_addr = %remote_addr,
                content_length = %content_length,
                "→ Request started"
            )
        });

        let fut = self.service.call(req).instrument(span.clone());

        Box::pin(
            async move {
                let mut res = fut.await?;
                let elapsed_ms = start.elapsed().as_millis();
                let status = res.status();

                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    res.headers_mut()
                        .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }

                if status.is_success() {
                    info!(
                        target: "api",
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        duration_ms = %elapsed_ms,
                        "← Request completed"
                    );
                } else if status.is_client_error() {
                    warn!(
                        target: "api",
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        duration_ms = %elapsed_ms,
                        "← Client error"
                    );
                } else {
                    error!(
                        target: "api",
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        duration_ms = %elapsed_ms,
                        "← Server error"
                    );
                }

                Ok(res)
            }
            .instrument(span),
        )
    }
}
