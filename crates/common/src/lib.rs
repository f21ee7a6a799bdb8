//! Shared domain types for the denuncia intake flow.
//!
//! Used by both the form controller (client) and the intake service (server)
//! so that the wire schema and the validation rules cannot drift apart.

pub mod error;
pub mod models;
pub mod tracking;
pub mod validation;

pub use error::{Error, Result};
pub use models::{AttachmentDescriptor, DenunciaRecord, DenunciaSubmission, TipoDenuncia};
pub use tracking::TrackingId;

/// Minimum number of characters required in `denunciaDetalle`
pub const MIN_DETAIL_CHARS: usize = 10;
