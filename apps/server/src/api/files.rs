//! File serving API handlers.
//!
//! Streams stored files back under the routes their access URLs point at.

use actix_web::{HttpResponse, get, web};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::RouteKind;
use crate::services::{FileRepository, FileStore};

/// Stream a stored file, rejecting subfolders that belong to the other route.
async fn serve_file(
    repository: &FileRepository,
    route: RouteKind,
    subfolder: &str,
    filename: &str,
) -> AppResult<HttpResponse> {
    if FileRepository::route_for(subfolder) != route {
        return Err(AppError::NotFound(format!(
            "File not found: {}/{}",
            subfolder, filename
        )));
    }

    debug!("Serving file: /{}/bucket/{}/{}", route, subfolder, filename);

    let stored = repository
        .retrieve(subfolder, filename)
        .await
        .ok_or_else(|| AppError::NotFound(format!("File not found: {}/{}", subfolder, filename)))?;

    Ok(HttpResponse::Ok()
        .content_type(stored.content_type)
        .no_chunking(stored.content_length)
        .streaming(ReaderStream::new(stored.body)))
}

/// Download a stored model.
#[utoipa::path(
    get,
    path = "/model/bucket/{subfolder}/{filename}",
    tag = "Files",
    params(
        ("subfolder" = String, Path, description = "Repository subfolder (models)"),
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[get("/model/bucket/{subfolder}/{filename}")]
pub async fn serve_model(
    repository: web::Data<FileRepository>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (subfolder, filename) = path.into_inner();
    serve_file(&repository, RouteKind::Model, &subfolder, &filename).await
}

/// Download a stored image.
#[utoipa::path(
    get,
    path = "/image/bucket/{subfolder}/{filename}",
    tag = "Files",
    params(
        ("subfolder" = String, Path, description = "Repository subfolder"),
        ("filename" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[get("/image/bucket/{subfolder}/{filename}")]
pub async fn serve_image(
    repository: web::Data<FileRepository>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (subfolder, filename) = path.into_inner();
    serve_file(&repository, RouteKind::Image, &subfolder, &filename).await
}

/// Configure file routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(serve_model).service(serve_image);
}
