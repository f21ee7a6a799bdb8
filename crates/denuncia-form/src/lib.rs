//! Denuncia form controller
//!
//! Drives the three-step "Centro de Denuncias" form: collects the reporter's
//! data into a [`DenunciaDraft`], walks it through the [`Wizard`] steps and
//! submits it to the intake service with an [`IntakeClient`].
//!
//! ```no_run
//! use denuncia_form::{IntakeClient, TipoDenuncia, Wizard};
//!
//! # async fn run() -> Result<(), denuncia_form::Rejected> {
//! let wizard = Wizard::new()
//!     .edit(|d| d.anonimo(true))?
//!     .next()?
//!     .edit(|d| d.tipo_denuncia(TipoDenuncia::Fraude))?
//!     .next()?
//!     .edit(|d| d.detalle("Cobros duplicados a proveedores"))?
//!     .next()?;
//!
//! let client = IntakeClient::new("http://localhost:8080");
//! let wizard = wizard.submit_with(&client).await?;
//! println!("Código de seguimiento: {:?}", wizard.tracking_id());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod draft;
pub mod wizard;

pub use client::{DenunciaSender, IntakeClient, OutgoingDenuncia, SubmitError, SubmitReceipt};
pub use denuncias_common::{TipoDenuncia, TrackingId};
pub use draft::{Attachment, DenunciaDraft};
pub use wizard::{Rejected, Step, StepError, Transition, Wizard};
