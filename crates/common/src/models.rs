//! Wire and storage schema for denuncias

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::tracking::TrackingId;
use crate::validation;
use crate::MIN_DETAIL_CHARS;

/// Complaint category offered in step 2 of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoDenuncia {
    AcosoLaboral,
    AcosoSexual,
    Fraude,
    Medioambiente,
    Seguridad,
    Otro,
}

impl TipoDenuncia {
    pub const ALL: [TipoDenuncia; 6] = [
        TipoDenuncia::AcosoLaboral,
        TipoDenuncia::AcosoSexual,
        TipoDenuncia::Fraude,
        TipoDenuncia::Medioambiente,
        TipoDenuncia::Seguridad,
        TipoDenuncia::Otro,
    ];

    /// Wire value, also used as the top-level storage folder
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoDenuncia::AcosoLaboral => "acoso_laboral",
            TipoDenuncia::AcosoSexual => "acoso_sexual",
            TipoDenuncia::Fraude => "fraude",
            TipoDenuncia::Medioambiente => "medioambiente",
            TipoDenuncia::Seguridad => "seguridad",
            TipoDenuncia::Otro => "otro",
        }
    }

    /// Label shown to the reporter
    pub fn label(&self) -> &'static str {
        match self {
            TipoDenuncia::AcosoLaboral => "Acoso Laboral",
            TipoDenuncia::AcosoSexual => "Acoso Sexual o Violencia en el Trabajo",
            TipoDenuncia::Fraude => "Fraude, Corrupción o Conflicto de Interés",
            TipoDenuncia::Medioambiente => "Incumplimiento Medioambiental",
            TipoDenuncia::Seguridad => "Incumplimiento de Seguridad y Salud Ocupacional (SSO)",
            TipoDenuncia::Otro => "Otro tipo de falta o delito",
        }
    }
}

impl fmt::Display for TipoDenuncia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `data` part of an intake request, as produced by the form.
///
/// Unknown keys are rejected so that nothing unexpected ends up in the
/// persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DenunciaSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,

    #[serde(default)]
    pub anonimo: bool,

    pub tipo_denuncia: TipoDenuncia,

    pub denuncia_detalle: String,

    /// Approximate date of the incident
    #[serde(
        default,
        deserialize_with = "empty_date_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_incidente: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ubicacion: Option<String>,
}

impl DenunciaSubmission {
    /// Drop blank optional fields and, for anonymous reports, every contact field
    pub fn normalized(mut self) -> Self {
        if self.anonimo {
            self.nombre = None;
            self.rut = None;
            self.email = None;
            self.telefono = None;
        }

        for field in [
            &mut self.nombre,
            &mut self.rut,
            &mut self.email,
            &mut self.telefono,
            &mut self.ubicacion,
        ] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            }
        }

        self
    }

    /// Check the rules a submission must satisfy before it is stored
    pub fn validate(&self) -> Result<()> {
        if self.denuncia_detalle.chars().count() < MIN_DETAIL_CHARS {
            return Err(Error::InvalidSubmission(format!(
                "denunciaDetalle must have at least {} characters",
                MIN_DETAIL_CHARS
            )));
        }

        let sufficient = validation::contact_is_sufficient(
            self.anonimo,
            self.nombre.as_deref().unwrap_or_default(),
            self.rut.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default(),
            self.telefono.as_deref().unwrap_or_default(),
        );
        if !sufficient {
            return Err(Error::InvalidSubmission(
                "a non-anonymous report needs name and valid RUT, or valid email and phone"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn empty_date_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Metadata for one stored attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    /// File name as uploaded by the reporter (never used as a storage key)
    pub original_name: String,

    /// Size in bytes
    pub size: u64,

    /// MIME type declared by the client
    pub content_type: String,

    /// Object path the bytes were written to
    pub path: String,
}

/// Persisted form of a denuncia, written once as `metadata.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenunciaRecord {
    pub tracking_id: TrackingId,

    pub received_at: DateTime<Utc>,

    #[serde(flatten)]
    pub denuncia: DenunciaSubmission,

    pub adjuntos: Vec<AttachmentDescriptor>,
}

impl DenunciaRecord {
    /// Create a new record stamped with the current time
    pub fn new(
        tracking_id: TrackingId,
        denuncia: DenunciaSubmission,
        adjuntos: Vec<AttachmentDescriptor>,
    ) -> Self {
        Self {
            tracking_id,
            received_at: Utc::now(),
            denuncia,
            adjuntos,
        }
    }
}

/// Folder grouping a record with its attachments: `{category}/{trackingId}/`
pub fn storage_prefix(tipo: TipoDenuncia, tracking_id: &TrackingId) -> String {
    format!("{}/{}/", tipo.as_str(), tracking_id)
}
