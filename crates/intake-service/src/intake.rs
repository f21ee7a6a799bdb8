//! The intake pipeline: turn one submission into stored objects
//!
//! Objects for a submission share the prefix `{category}/{trackingId}/`.
//! Attachments are written first and `metadata.json` last, so a record is
//! only visible to readers once everything it references exists.

use axum::body::Bytes;
use denuncias_common::models::storage_prefix;
use denuncias_common::{
    AttachmentDescriptor, DenunciaRecord, DenunciaSubmission, Error, Result, TrackingId,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::storage::ObjectStore;

pub const METADATA_FILE: &str = "metadata.json";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const FALLBACK_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 8;

/// One `archivos` part as received
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Outcome of a stored submission
#[derive(Debug, Clone)]
pub struct IntakeReceipt {
    pub tracking_id: TrackingId,
    pub json_path: String,
    pub attachments: usize,
}

/// Stores denuncias in an [`ObjectStore`]
pub struct Intake {
    store: Arc<dyn ObjectStore>,
}

impl Intake {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Validate and persist one submission.
    ///
    /// `data` is the raw JSON of the `data` part. Any failure aborts the
    /// remaining writes; attachments already written are left in place.
    pub async fn process(&self, data: Option<&str>, files: Vec<UploadedFile>) -> Result<IntakeReceipt> {
        let tracking_id = TrackingId::generate();

        let raw = data.ok_or(Error::MissingData)?;
        let denuncia: DenunciaSubmission = serde_json::from_str(raw)?;
        let denuncia = denuncia.normalized();
        denuncia.validate()?;

        let prefix = storage_prefix(denuncia.tipo_denuncia, &tracking_id);

        let mut adjuntos = Vec::new();
        for file in files.into_iter().filter(|f| !f.bytes.is_empty()) {
            let path = format!("{}{}", prefix, attachment_name(adjuntos.len() + 1, &file.file_name));
            let content_type = file
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
            let size = file.bytes.len() as u64;

            self.store.put(&path, file.bytes, &content_type).await?;

            adjuntos.push(AttachmentDescriptor {
                original_name: file.file_name,
                size,
                content_type,
                path,
            });
        }

        let attachments = adjuntos.len();
        let record = DenunciaRecord::new(tracking_id.clone(), denuncia, adjuntos);
        let json = serde_json::to_vec_pretty(&record)?;

        let json_path = format!("{}{}", prefix, METADATA_FILE);
        self.store
            .put(&json_path, Bytes::from(json), "application/json")
            .await?;
        debug!("Wrote {}", json_path);

        info!(
            tracking_id = %tracking_id,
            category = %record.denuncia.tipo_denuncia,
            attachments,
            "Denuncia stored"
        );

        Ok(IntakeReceipt {
            tracking_id,
            json_path,
            attachments,
        })
    }
}

/// Storage name for the `n`-th attachment.
///
/// Only the extension of the reporter's file name survives, and only if it
/// is short and plain ASCII alphanumeric.
pub fn attachment_name(n: usize, original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let ext = match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.bytes().all(|b| b.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => FALLBACK_EXTENSION.to_string(),
    };
    format!("adjunto-{}.{}", n, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn file(name: &str, content_type: Option<&str>, bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from_static(bytes),
        }
    }

    fn anonymous_fraud() -> String {
        json!({
            "anonimo": true,
            "tipoDenuncia": "fraude",
            "denunciaDetalle": "0123456789"
        })
        .to_string()
    }

    #[test]
    fn test_attachment_name() {
        assert_eq!(attachment_name(1, "a.pdf"), "adjunto-1.pdf");
        assert_eq!(attachment_name(2, "Foto.JPG"), "adjunto-2.jpg");
        assert_eq!(attachment_name(3, "informe.final.docx"), "adjunto-3.docx");
        assert_eq!(attachment_name(4, "../../etc/passwd"), "adjunto-4.bin");
        assert_eq!(attachment_name(5, "..\\evil.exe"), "adjunto-5.exe");
        assert_eq!(attachment_name(6, "sin_extension"), "adjunto-6.bin");
        assert_eq!(attachment_name(7, ".hidden"), "adjunto-7.bin");
        assert_eq!(attachment_name(8, "x.p/df"), "adjunto-8.bin");
        assert_eq!(attachment_name(9, "x.verylongext"), "adjunto-9.bin");
        assert_eq!(attachment_name(10, "x.pd f"), "adjunto-10.bin");
    }

    #[tokio::test]
    async fn test_process_stores_attachments_then_metadata() {
        let store = Arc::new(MemoryStore::new());
        let intake = Intake::new(store.clone());

        let receipt = intake
            .process(
                Some(&anonymous_fraud()),
                vec![
                    file("a.pdf", Some("application/pdf"), b"%PDF-1.4"),
                    file("b.jpg", Some("image/jpeg"), b"\xff\xd8\xff"),
                ],
            )
            .await
            .unwrap();

        let prefix = format!("fraude/{}/", receipt.tracking_id);
        assert_eq!(receipt.json_path, format!("{}metadata.json", prefix));
        assert_eq!(receipt.attachments, 2);

        let pdf = store.get(&format!("{}adjunto-1.pdf", prefix)).await.unwrap();
        assert_eq!(pdf.content_type, "application/pdf");
        assert!(store.get(&format!("{}adjunto-2.jpg", prefix)).await.is_some());

        let metadata = store.get(&receipt.json_path).await.unwrap();
        assert_eq!(metadata.content_type, "application/json");
        let value: serde_json::Value = serde_json::from_slice(&metadata.bytes).unwrap();
        assert_eq!(value["tipoDenuncia"], "fraude");
        assert_eq!(value["trackingId"], receipt.tracking_id.as_str());
        assert_eq!(value["adjuntos"][0]["originalName"], "a.pdf");
        assert_eq!(value["adjuntos"][0]["size"], 8);
        assert_eq!(value["adjuntos"][0]["path"], format!("{}adjunto-1.pdf", prefix));
        assert_eq!(value["adjuntos"][1]["path"], format!("{}adjunto-2.jpg", prefix));
    }

    #[tokio::test]
    async fn test_empty_parts_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let intake = Intake::new(store.clone());

        let receipt = intake
            .process(
                Some(&anonymous_fraud()),
                vec![file("vacio.pdf", None, b""), file("foto.png", None, b"\x89PNG")],
            )
            .await
            .unwrap();

        assert_eq!(receipt.attachments, 1);
        let png = store
            .get(&format!("fraude/{}/adjunto-1.png", receipt.tracking_id))
            .await
            .unwrap();
        assert_eq!(png.content_type, "application/octet-stream");
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_missing_data_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let intake = Intake::new(store.clone());

        let result = intake
            .process(None, vec![file("a.pdf", None, b"%PDF")])
            .await;
        assert!(matches!(result, Err(Error::MissingData)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_json_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let intake = Intake::new(store.clone());

        let result = intake.process(Some("{not json"), Vec::new()).await;
        assert!(matches!(result, Err(Error::Json(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_anonymous_record_drops_contact_data() {
        let store = Arc::new(MemoryStore::new());
        let intake = Intake::new(store.clone());

        let data = json!({
            "nombre": "Ana",
            "rut": "12.345.678-5",
            "email": "ana@x.cl",
            "telefono": "912345678",
            "anonimo": true,
            "tipoDenuncia": "acoso_laboral",
            "denunciaDetalle": "Descripción de los hechos"
        })
        .to_string();

        let receipt = intake.process(Some(&data), Vec::new()).await.unwrap();
        let metadata = store.get(&receipt.json_path).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&metadata.bytes).unwrap();

        for field in ["nombre", "rut", "email", "telefono"] {
            assert!(value.get(field).is_none(), "{} should be cleared", field);
        }
        assert_eq!(value["adjuntos"], json!([]));
    }

    #[tokio::test]
    async fn test_metadata_failure_leaves_attachments() {
        let store = Arc::new(MemoryStore::failing_on(METADATA_FILE));
        let intake = Intake::new(store.clone());

        let result = intake
            .process(Some(&anonymous_fraud()), vec![file("a.pdf", None, b"%PDF")])
            .await;

        assert!(matches!(result, Err(Error::Storage(_))));
        let paths = store.paths().await;
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("/adjunto-1.pdf"));
    }
}
