//! In-memory form data, built up across the three steps
//!
//! Setters take and return the draft by value, so a draft is only ever
//! changed by whoever currently owns it.

use chrono::NaiveDate;
use denuncias_common::validation;
use denuncias_common::{DenunciaSubmission, TipoDenuncia, MIN_DETAIL_CHARS};

/// An evidence file picked in step 3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Everything the reporter has typed so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenunciaDraft {
    nombre: String,
    rut: String,
    email: String,
    telefono: String,
    anonimo: bool,
    tipo_denuncia: Option<TipoDenuncia>,
    denuncia_detalle: String,
    fecha_incidente: Option<NaiveDate>,
    ubicacion: String,
    archivos: Vec<Attachment>,
}

impl DenunciaDraft {
    pub fn new() -> Self {
        Self::default()
    }

    // Contact fields are locked while the report is anonymous.

    pub fn nombre(mut self, nombre: impl Into<String>) -> Self {
        if !self.anonimo {
            self.nombre = nombre.into();
        }
        self
    }

    pub fn rut(mut self, rut: impl Into<String>) -> Self {
        if !self.anonimo {
            self.rut = rut.into();
        }
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        if !self.anonimo {
            self.email = email.into();
        }
        self
    }

    pub fn telefono(mut self, telefono: impl Into<String>) -> Self {
        if !self.anonimo {
            self.telefono = telefono.into();
        }
        self
    }

    /// Turning anonymity on wipes every contact field
    pub fn anonimo(mut self, anonimo: bool) -> Self {
        self.anonimo = anonimo;
        if anonimo {
            self.nombre.clear();
            self.rut.clear();
            self.email.clear();
            self.telefono.clear();
        }
        self
    }

    pub fn tipo_denuncia(mut self, tipo: TipoDenuncia) -> Self {
        self.tipo_denuncia = Some(tipo);
        self
    }

    pub fn detalle(mut self, detalle: impl Into<String>) -> Self {
        self.denuncia_detalle = detalle.into();
        self
    }

    pub fn fecha_incidente(mut self, fecha: Option<NaiveDate>) -> Self {
        self.fecha_incidente = fecha;
        self
    }

    pub fn ubicacion(mut self, ubicacion: impl Into<String>) -> Self {
        self.ubicacion = ubicacion.into();
        self
    }

    pub fn archivo(mut self, archivo: Attachment) -> Self {
        self.archivos.push(archivo);
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonimo
    }

    pub fn category(&self) -> Option<TipoDenuncia> {
        self.tipo_denuncia
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.archivos
    }

    /// Whether the RUT field deserves an "invalid" hint: filled in and wrong
    pub fn rut_needs_attention(&self) -> bool {
        !self.anonimo && !self.rut.is_empty() && !validation::validate_rut(&self.rut)
    }

    /// Step 1 gate
    pub fn contact_is_sufficient(&self) -> bool {
        validation::contact_is_sufficient(
            self.anonimo,
            &self.nombre,
            &self.rut,
            &self.email,
            &self.telefono,
        )
    }

    /// Length of the description in characters, not bytes
    pub fn detail_chars(&self) -> usize {
        self.denuncia_detalle.chars().count()
    }

    /// Step 3 gate
    pub fn detail_is_long_enough(&self) -> bool {
        self.detail_chars() >= MIN_DETAIL_CHARS
    }

    /// The `data` payload, or `None` while no category is chosen
    pub fn to_submission(&self) -> Option<DenunciaSubmission> {
        let submission = DenunciaSubmission {
            nombre: Some(self.nombre.clone()),
            rut: Some(self.rut.clone()),
            email: Some(self.email.clone()),
            telefono: Some(self.telefono.clone()),
            anonimo: self.anonimo,
            tipo_denuncia: self.tipo_denuncia?,
            denuncia_detalle: self.denuncia_detalle.clone(),
            fecha_incidente: self.fecha_incidente,
            ubicacion: Some(self.ubicacion.clone()),
        };
        Some(submission.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_clears_and_locks_contact() {
        let draft = DenunciaDraft::new()
            .nombre("Ana")
            .rut("12.345.678-5")
            .email("ana@x.cl")
            .telefono("912345678")
            .anonimo(true)
            .nombre("Otra");

        assert!(draft.is_anonymous());
        assert_eq!(draft, DenunciaDraft::new().anonimo(true));
        assert!(draft.contact_is_sufficient());
    }

    #[test]
    fn test_unchecking_anonymous_keeps_fields_empty() {
        let draft = DenunciaDraft::new().nombre("Ana").anonimo(true).anonimo(false);
        assert!(!draft.contact_is_sufficient());

        let draft = draft.nombre("Ana").rut("12.345.678-5");
        assert!(draft.contact_is_sufficient());
    }

    #[test]
    fn test_rut_hint() {
        assert!(!DenunciaDraft::new().rut_needs_attention());
        assert!(DenunciaDraft::new().rut("12.345.678-0").rut_needs_attention());
        assert!(!DenunciaDraft::new().rut("12.345.678-5").rut_needs_attention());
    }

    #[test]
    fn test_to_submission_requires_category() {
        let draft = DenunciaDraft::new().anonimo(true).detalle("0123456789");
        assert!(draft.to_submission().is_none());

        let submission = draft.tipo_denuncia(TipoDenuncia::Fraude).to_submission().unwrap();
        assert_eq!(submission.tipo_denuncia, TipoDenuncia::Fraude);
        assert!(submission.anonimo);
        assert_eq!(submission.nombre, None);
        assert_eq!(submission.ubicacion, None);
        assert!(submission.validate().is_ok());
    }

    #[test]
    fn test_to_submission_keeps_contact_when_identified() {
        let submission = DenunciaDraft::new()
            .email("ana@x.cl")
            .telefono("+56 9 1234 5678")
            .tipo_denuncia(TipoDenuncia::Otro)
            .detalle("Descripción de los hechos")
            .ubicacion("Sucursal Centro")
            .to_submission()
            .unwrap();

        assert_eq!(submission.email.as_deref(), Some("ana@x.cl"));
        assert_eq!(submission.nombre, None);
        assert_eq!(submission.ubicacion.as_deref(), Some("Sucursal Centro"));
        assert!(submission.validate().is_ok());
    }

    #[test]
    fn test_detail_length_gate() {
        assert!(!DenunciaDraft::new().detalle("123456789").detail_is_long_enough());
        assert!(DenunciaDraft::new().detalle("1234567890").detail_is_long_enough());
        assert_eq!(DenunciaDraft::new().detalle("acción").detail_chars(), 6);
    }
}
