//! Model conversion endpoint.
//!
//! `POST /convert` takes a multipart form with a `modelFile` part and an
//! optional `filename` part, converts the model and answers with the access
//! URL of the stored result.

use std::path::Path;

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{HttpResponse, post, web};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::{ConvertForm, ConvertResponse, UploadedFile};
use crate::services::{ConversionGateway, remove_temp_file};

/// Multipart part carrying the model.
const MODEL_FILE_FIELD: &str = "modelFile";

/// Multipart part carrying the desired base name.
const FILENAME_FIELD: &str = "filename";

/// Upper bound for text parts.
const MAX_TEXT_FIELD_SIZE: usize = 1024;

/// Parsed multipart form.
#[derive(Debug, Default)]
struct ConvertFormData {
    upload: Option<UploadedFile>,
    filename: Option<String>,
}

/// Convert an uploaded 3D model and store the result.
#[utoipa::path(
    post,
    path = "/convert",
    tag = "Conversion",
    request_body(content = ConvertForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Model converted and stored", body = ConvertResponse),
        (status = 400, description = "Missing or invalid input", body = ErrorResponse),
        (status = 413, description = "Model file too large", body = ErrorResponse),
        (status = 500, description = "Conversion or storage failed", body = ErrorResponse)
    )
)]
#[post("/convert")]
pub async fn convert_model(
    mut payload: Multipart,
    config: web::Data<Config>,
    gateway: web::Data<ConversionGateway>,
) -> AppResult<HttpResponse> {
    let form = read_convert_form(&mut payload, &config).await?;

    let Some(upload) = form.upload else {
        return Err(AppError::InvalidInput("No modelFile provided".to_string()));
    };

    let glb_url = gateway.convert(upload, form.filename.as_deref()).await?;
    info!("Conversion complete: {}", glb_url);

    Ok(HttpResponse::Ok().json(ConvertResponse { glb_url }))
}

/// Read every part of the form, removing a spooled upload if anything fails.
async fn read_convert_form(payload: &mut Multipart, config: &Config) -> AppResult<ConvertFormData> {
    let mut form = ConvertFormData::default();

    if let Err(e) = read_fields(payload, config, &mut form).await {
        if let Some(upload) = form.upload.take() {
            remove_temp_file(&upload.path).await;
        }
        return Err(e);
    }

    Ok(form)
}

async fn read_fields(
    payload: &mut Multipart,
    config: &Config,
    form: &mut ConvertFormData,
) -> AppResult<()> {
    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            // Not a multipart body, so there is no file part.
            Err(MultipartError::ContentTypeMissing | MultipartError::ContentTypeIncompatible) => {
                debug!("Request body is not multipart/form-data");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let (field_name, original_name) = {
            let content_disposition = field
                .content_disposition()
                .ok_or_else(|| AppError::InvalidInput("Missing content disposition".to_string()))?;
            (
                content_disposition.get_name().map(str::to_owned),
                content_disposition.get_filename().map(str::to_owned),
            )
        };

        match field_name.as_deref() {
            Some(MODEL_FILE_FIELD) if original_name.as_deref().is_none_or(str::is_empty) => {
                debug!("Skipping modelFile part without a filename");
                drain_field(&mut field).await?;
            }
            Some(MODEL_FILE_FIELD) => {
                if form.upload.is_some() {
                    return Err(AppError::InvalidInput(
                        "Only one modelFile may be provided".to_string(),
                    ));
                }
                let upload = spool_model_file(
                    &mut field,
                    original_name,
                    &config.upload_dir,
                    config.max_upload_size,
                )
                .await?;
                form.upload = Some(upload);
            }
            Some(FILENAME_FIELD) => {
                let value = read_text_field(&mut field).await?;
                if !value.is_empty() {
                    form.filename = Some(value);
                }
            }
            other => {
                warn!("Ignoring unexpected form field: {:?}", other);
                drain_field(&mut field).await?;
            }
        }
    }

    Ok(())
}

/// Stream the model part to a uniquely named temp file.
async fn spool_model_file(
    field: &mut Field,
    original_name: Option<String>,
    upload_dir: &Path,
    max_upload_size: usize,
) -> AppResult<UploadedFile> {
    let content_type = field.content_type().map(|mime| mime.to_string());
    let path = upload_dir.join(temp_upload_name(original_name.as_deref()));

    let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
        AppError::FileSystem(format!("Failed to create {}: {}", path.display(), e))
    })?;

    let mut size: usize = 0;
    let written: AppResult<()> = async {
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            size += data.len();

            if size > max_upload_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "modelFile exceeds {} bytes",
                    max_upload_size
                )));
            }

            file.write_all(&data)
                .await
                .map_err(|e| AppError::FileSystem(format!("Failed to write upload: {}", e)))?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to flush upload: {}", e)))
    }
    .await;

    drop(file);

    if let Err(e) = written {
        remove_temp_file(&path).await;
        return Err(e);
    }

    info!(
        "Received {} ({} bytes) as {}",
        original_name.as_deref().unwrap_or("<unnamed>"),
        size,
        path.display()
    );

    Ok(UploadedFile {
        path,
        original_name,
        content_type,
    })
}

/// `<uuid>.<ext>`, keeping a plain alphanumeric extension so the tool can sniff the format.
fn temp_upload_name(original_name: Option<&str>) -> String {
    let id = Uuid::new_v4().simple();
    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", id, ext.to_lowercase()),
        None => id.to_string(),
    }
}

async fn drain_field(field: &mut Field) -> AppResult<()> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}

async fn read_text_field(field: &mut Field) -> AppResult<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if data.len() + chunk.len() > MAX_TEXT_FIELD_SIZE {
            return Err(AppError::InvalidInput(format!(
                "Form field exceeds {} bytes",
                MAX_TEXT_FIELD_SIZE
            )));
        }
        data.extend_from_slice(&chunk);
    }

    String::from_utf8(data)
        .map_err(|_| AppError::InvalidInput("Form field is not valid UTF-8".to_string()))
}

/// Configure conversion routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(convert_model);
}
