//! Request and response bodies for the conversion endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AccessUrl;

/// Multipart form accepted by `POST /convert` (documentation only).
#[derive(Deserialize, ToSchema)]
pub struct ConvertForm {
    /// Model file to convert
    #[serde(rename = "modelFile")]
    #[schema(value_type = String, format = Binary)]
    pub model_file: Vec<u8>,
    /// Desired base name of the converted file (e.g. a product id)
    pub filename: Option<String>,
}

/// Successful conversion response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConvertResponse {
    /// Access URL of the stored converted model
    #[serde(rename = "glbUrl")]
    #[schema(value_type = String, example = "http://localhost:3002/model/bucket/models/42.glb")]
    pub glb_url: AccessUrl,
}
