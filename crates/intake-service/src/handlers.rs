//! API request handlers for denuncia intake

use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use denuncias_common::Error;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{
    config::CONNECTION_STRING_VAR,
    intake::{Intake, UploadedFile},
    storage::ObjectStore,
    Limits,
};

/// Shared application state
pub struct AppState {
    /// `None` when no storage credential is configured
    pub store: Option<Arc<dyn ObjectStore>>,
    pub limits: Limits,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn ObjectStore>>, limits: Limits) -> Self {
        Self { store, limits }
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    /// A logged 400 for requests that never reach the intake pipeline
    fn bad_request(message: &str, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        warn!("Request rejected: {}", detail);
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
            detail: Some(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "error": self.message
        });
        if let Some(detail) = self.detail {
            body["detail"] = serde_json::Value::String(detail);
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, message) = match &err {
            Error::Configuration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error de configuración: la conexión al almacenamiento no está configurada.",
            ),
            Error::AttachmentTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Uno de los archivos adjuntos excede el tamaño máximo permitido.",
            ),
            e if e.is_client_error() => (
                StatusCode::BAD_REQUEST,
                "Los datos de la denuncia no son válidos.",
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno del servidor al guardar la denuncia.",
            ),
        };

        ApiError {
            status,
            message: message.to_string(),
            detail: Some(err.to_string()),
        }
    }
}

/// Log a failed submission and turn it into a response
fn reject(err: Error) -> ApiError {
    if err.is_client_error() {
        warn!("Denuncia rejected: {}", err);
    } else {
        error!("Failed to process denuncia: {}", err);
    }
    ApiError::from(err)
}

fn multipart_error(err: MultipartError) -> ApiError {
    warn!("Malformed multipart body: {}", err);
    ApiError {
        status: err.status(),
        message: "El cuerpo multipart de la solicitud no es válido.".to_string(),
        detail: Some(err.body_text()),
    }
}

/// Successful submission
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: String,
    pub tracking_id: String,
    pub json_path: String,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "intake-service"
    }))
}

/// Only POST is served on the intake routes
pub async fn method_not_allowed_handler() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(serde_json::json!({
            "error": "Método GET no permitido para esta ruta. Use POST."
        })),
    )
}

/// Store a new denuncia
pub async fn submit_denuncia_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<SubmitResponse>, ApiError> {
    // Missing storage is reported before the body is read
    let Some(store) = state.store.clone() else {
        return Err(reject(Error::Configuration(format!(
            "{} is not set",
            CONNECTION_STRING_VAR
        ))));
    };

    let (data, files) = read_body(request, &state.limits).await?;
    debug!("Received denuncia with {} file part(s)", files.len());

    let receipt = Intake::new(store)
        .process(data.as_deref(), files)
        .await
        .map_err(reject)?;

    Ok(Json(SubmitResponse {
        message: "Denuncia registrada con éxito.".to_string(),
        tracking_id: receipt.tracking_id.to_string(),
        json_path: receipt.json_path,
    }))
}

/// Split the request into the `data` JSON text and the attached files
async fn read_body(
    request: Request,
    limits: &Limits,
) -> Result<(Option<String>, Vec<UploadedFile>), ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &()).await.map_err(|rejection| {
            ApiError::bad_request(
                "El cuerpo multipart de la solicitud no es válido.",
                rejection.body_text(),
            )
        })?;
        read_multipart(multipart, limits).await
    } else if content_type.starts_with("application/json") {
        let body = axum::body::to_bytes(request.into_body(), limits.max_request_bytes)
            .await
            .map_err(|e| ApiError::bad_request("No se pudo leer la solicitud.", e.to_string()))?;
        let text = String::from_utf8(body.to_vec()).map_err(|e| {
            ApiError::bad_request("La solicitud no es texto UTF-8 válido.", e.to_string())
        })?;
        Ok((Some(text), Vec::new()))
    } else {
        Err(ApiError::bad_request(
            "Por favor, envíe una solicitud POST válida con los datos de la denuncia.",
            format!("unsupported content type {:?}", content_type),
        ))
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    limits: &Limits,
) -> Result<(Option<String>, Vec<UploadedFile>), ApiError> {
    let mut data = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "data" => data = Some(field.text().await.map_err(multipart_error)?),
            "archivos" => files.push(read_file(field, limits.max_attachment_bytes).await?),
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok((data, files))
}

async fn read_file(mut field: Field<'_>, limit: usize) -> Result<UploadedFile, ApiError> {
    let file_name = field.file_name().unwrap_or("archivo").to_string();
    let content_type = field.content_type().map(str::to_string);

    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buf.len() + chunk.len() > limit {
            return Err(reject(Error::AttachmentTooLarge {
                name: file_name,
                limit,
            }));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes: Bytes::from(buf),
    })
}
