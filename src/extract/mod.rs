//! Unified write-payload extraction. Section write endpoints accept either
//! `application/json` or `multipart/form-data`; both arrive here as one
//! field map (multipart text parts land as JSON strings and are resolved
//! later by the field decoding layer) plus any uploaded files.

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde_json::{Map, Value};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct SectionPayload {
    pub fields: Map<String, Value>,
    pub files: HashMap<String, UploadedFile>,
}

#[async_trait]
impl<S> FromRequest<S> for SectionPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?;

            let mut payload = SectionPayload::default();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
            {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                if let Some(file_name) = field.file_name().map(str::to_string) {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|e| {
                        ApiError::bad_request(format!("Failed to read uploaded file: {}", e))
                    })?;
                    payload
                        .files
                        .insert(name, UploadedFile { file_name, content_type, bytes });
                } else {
                    let text = field.text().await.map_err(|e| {
                        ApiError::bad_request(format!("Invalid form field: {}", e))
                    })?;
                    payload.fields.insert(name, Value::String(text));
                }
            }
            Ok(payload)
        } else {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
            match value {
                Value::Object(fields) => Ok(SectionPayload {
                    fields,
                    files: HashMap::new(),
                }),
                _ => Err(ApiError::bad_request("Request body must be a JSON object")),
            }
        }
    }
}
