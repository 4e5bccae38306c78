//! OpenAPI documentation configuration.

use actix_web::{HttpResponse, get, web};
use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Model Conversion Service",
        version = "0.1.0",
        description = "Converts uploaded 3D models with an external tool and serves the stored results"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Conversion
        api::convert::convert_model,
        // Stored files
        api::files::serve_model,
        api::files::serve_image,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Conversion
            models::ConvertForm,
            models::ConvertResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Conversion", description = "3D model conversion"),
        (name = "Files", description = "Stored file retrieval")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON.
#[get("/api-docs/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Configure documentation routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(openapi_json);
}
