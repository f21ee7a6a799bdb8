//! Client for the denuncia intake service

use async_trait::async_trait;
use denuncias_common::{DenunciaSubmission, TrackingId};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::draft::Attachment;

/// Intake route, relative to the service base URL
pub const SUBMIT_PATH: &str = "/api/submit-denuncia";

/// A confirmed denuncia, ready to be sent
#[derive(Debug, Clone)]
pub struct OutgoingDenuncia {
    pub submission: DenunciaSubmission,
    pub archivos: Vec<Attachment>,
}

/// What the service hands back on success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub tracking_id: TrackingId,
    pub json_path: Option<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("No se pudo contactar al servidor: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("No se pudo preparar la denuncia: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Error en el servidor ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("La respuesta del servidor no incluye un código de seguimiento válido")]
    MissingTrackingId,
}

/// Anything able to deliver a denuncia to the intake service
#[async_trait]
pub trait DenunciaSender: Send + Sync {
    async fn send(&self, denuncia: &OutgoingDenuncia) -> Result<SubmitReceipt, SubmitError>;
}

/// HTTP sender posting `multipart/form-data` to the intake service
pub struct IntakeClient {
    endpoint: String,
    client: reqwest::Client,
}

impl IntakeClient {
    /// Create a new intake client for a service base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SUBMIT_PATH),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(denuncia: &OutgoingDenuncia) -> Result<Form, SubmitError> {
        let mut form = Form::new().text("data", serde_json::to_string(&denuncia.submission)?);

        for archivo in &denuncia.archivos {
            let part = Part::bytes(archivo.bytes.clone())
                .file_name(archivo.file_name.clone())
                .mime_str(&archivo.content_type)?;
            form = form.part("archivos", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl DenunciaSender for IntakeClient {
    async fn send(&self, denuncia: &OutgoingDenuncia) -> Result<SubmitReceipt, SubmitError> {
        debug!(
            "Submitting denuncia with {} attachment(s) to {}",
            denuncia.archivos.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(Self::form(denuncia)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        interpret_response(status, &body)
    }
}

/// Turn the service's reply into a receipt or an error
fn interpret_response(status: StatusCode, body: &[u8]) -> Result<SubmitReceipt, SubmitError> {
    let json: serde_json::Value = serde_json::from_slice(body).unwrap_or_default();

    if !status.is_success() {
        let message = json["error"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        return Err(SubmitError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let tracking_id = json["trackingId"]
        .as_str()
        .and_then(|s| s.parse::<TrackingId>().ok())
        .ok_or(SubmitError::MissingTrackingId)?;

    Ok(SubmitReceipt {
        tracking_id,
        json_path: json["jsonPath"].as_str().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint() {
        let client = IntakeClient::new("http://localhost:8080/");
        assert_eq!(client.endpoint(), "http://localhost:8080/api/submit-denuncia");
    }

    #[test]
    fn test_success_response() {
        let body = json!({
            "message": "Denuncia registrada con éxito.",
            "trackingId": "ABCDE1234",
            "jsonPath": "fraude/ABCDE1234/metadata.json"
        })
        .to_string();

        let receipt = interpret_response(StatusCode::OK, body.as_bytes()).unwrap();
        assert_eq!(receipt.tracking_id.as_str(), "ABCDE1234");
        assert_eq!(receipt.json_path.as_deref(), Some("fraude/ABCDE1234/metadata.json"));
    }

    #[test]
    fn test_success_without_tracking_id_is_an_error() {
        let body = json!({ "message": "ok" }).to_string();
        let result = interpret_response(StatusCode::OK, body.as_bytes());
        assert!(matches!(result, Err(SubmitError::MissingTrackingId)));

        let body = json!({ "trackingId": "lowercase" }).to_string();
        let result = interpret_response(StatusCode::OK, body.as_bytes());
        assert!(matches!(result, Err(SubmitError::MissingTrackingId)));
    }

    #[test]
    fn test_error_response_carries_server_message() {
        let body = json!({ "error": "Error interno del servidor al guardar la denuncia.", "detail": "x" })
            .to_string();
        match interpret_response(StatusCode::INTERNAL_SERVER_ERROR, body.as_bytes()) {
            Err(SubmitError::Rejected { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Error interno del servidor al guardar la denuncia.");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_error_response_without_json_body() {
        match interpret_response(StatusCode::BAD_GATEWAY, b"<html>") {
            Err(SubmitError::Rejected { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
