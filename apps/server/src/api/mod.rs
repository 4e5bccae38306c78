//! API endpoint modules.

pub mod convert;
pub mod files;
pub mod health;
pub mod openapi;

pub use convert::configure_routes as configure_convert_routes;
pub use files::configure_routes as configure_file_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use openapi::configure_routes as configure_openapi_routes;

use actix_web::web;

/// Register every route of the service.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_convert_routes)
        .configure(configure_file_routes)
        .configure(configure_openapi_routes);
}
