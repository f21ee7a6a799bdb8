//! The three-step form as an explicit state machine
//!
//! A [`Wizard`] is moved into every transition. A refused transition hands
//! the wizard back untouched inside [`Rejected`], so no entered data is
//! ever lost.

use denuncias_common::{TrackingId, MIN_DETAIL_CHARS};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{DenunciaSender, OutgoingDenuncia, SubmitError, SubmitReceipt};
use crate::draft::DenunciaDraft;

/// Where the reporter currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Paso 1: identification or anonymity
    Privacy,
    /// Paso 2: category
    Category,
    /// Paso 3: description, date, location and evidence
    Detail,
    /// Confirmation dialog shown
    Confirming,
    /// Request in flight
    Submitting,
    Success { tracking_id: TrackingId },
    Failure { message: String },
}

impl Step {
    /// "Paso N de 3" for the editable steps
    pub fn progress(&self) -> Option<u8> {
        match self {
            Step::Privacy => Some(1),
            Step::Category => Some(2),
            Step::Detail => Some(3),
            _ => None,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.progress().is_some()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Privacy => "privacy",
            Step::Category => "category",
            Step::Detail => "detail",
            Step::Confirming => "confirming",
            Step::Submitting => "submitting",
            Step::Success { .. } => "success",
            Step::Failure { .. } => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("Debe marcar la opción anónima, o ingresar nombre y RUT válido, o correo y teléfono válidos")]
    InsufficientContact,

    #[error("Debe seleccionar un tipo de denuncia")]
    MissingCategory,

    #[error("La descripción debe tener al menos {min} caracteres (tiene {0})", min = MIN_DETAIL_CHARS)]
    DetailTooShort(usize),

    #[error("Transición no permitida desde el paso {0}")]
    InvalidTransition(&'static str),
}

/// A refused transition, carrying the wizard back unchanged
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct Rejected {
    pub wizard: Box<Wizard>,
    pub reason: StepError,
}

pub type Transition = Result<Wizard, Rejected>;

#[derive(Debug, Clone, PartialEq)]
pub struct Wizard {
    step: Step,
    draft: DenunciaDraft,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: Step::Privacy,
            draft: DenunciaDraft::new(),
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn draft(&self) -> &DenunciaDraft {
        &self.draft
    }

    /// Tracking code shown on the success screen
    pub fn tracking_id(&self) -> Option<&TrackingId> {
        match &self.step {
            Step::Success { tracking_id } => Some(tracking_id),
            _ => None,
        }
    }

    fn reject(self, reason: StepError) -> Rejected {
        Rejected {
            wizard: Box::new(self),
            reason,
        }
    }

    fn invalid(self) -> Rejected {
        let name = self.step.name();
        self.reject(StepError::InvalidTransition(name))
    }

    fn goto(mut self, step: Step) -> Wizard {
        debug!("Form step {} -> {}", self.step.name(), step.name());
        self.step = step;
        self
    }

    /// Change form fields; only allowed on the three editable steps
    pub fn edit(mut self, f: impl FnOnce(DenunciaDraft) -> DenunciaDraft) -> Transition {
        if !self.step.is_editable() {
            return Err(self.invalid());
        }
        self.draft = f(self.draft);
        Ok(self)
    }

    /// First failing gate among the steps up to and including `through`
    ///
    /// Any editable step may change any field, so leaving a step re-checks
    /// every gate before it as well.
    fn check_gates(&self, through: u8) -> Result<(), StepError> {
        if !self.draft.contact_is_sufficient() {
            return Err(StepError::InsufficientContact);
        }
        if through >= 2 && self.draft.category().is_none() {
            return Err(StepError::MissingCategory);
        }
        if through >= 3 && !self.draft.detail_is_long_enough() {
            return Err(StepError::DetailTooShort(self.draft.detail_chars()));
        }
        Ok(())
    }

    /// Advance one step, enforcing the gates of this and every earlier step
    pub fn next(self) -> Transition {
        let (through, to) = match self.step {
            Step::Privacy => (1, Step::Category),
            Step::Category => (2, Step::Detail),
            Step::Detail => (3, Step::Confirming),
            _ => return Err(self.invalid()),
        };

        match self.check_gates(through) {
            Ok(()) => Ok(self.goto(to)),
            Err(reason) => Err(self.reject(reason)),
        }
    }

    /// Go back one step; entered data is kept
    pub fn back(self) -> Transition {
        match self.step {
            Step::Category => Ok(self.goto(Step::Privacy)),
            Step::Detail => Ok(self.goto(Step::Category)),
            Step::Confirming => Ok(self.goto(Step::Detail)),
            _ => Err(self.invalid()),
        }
    }

    /// Accept the confirmation dialog and hand out what must be sent
    pub fn confirm(self) -> Result<(Wizard, OutgoingDenuncia), Rejected> {
        if self.step != Step::Confirming {
            return Err(self.invalid());
        }
        if let Err(reason) = self.check_gates(3) {
            return Err(self.reject(reason));
        }

        let Some(submission) = self.draft.to_submission() else {
            return Err(self.reject(StepError::MissingCategory));
        };
        let outgoing = OutgoingDenuncia {
            submission,
            archivos: self.draft.attachments().to_vec(),
        };

        Ok((self.goto(Step::Submitting), outgoing))
    }

    /// Record the outcome of the request
    ///
    /// Success discards the draft; failure keeps it for a retry.
    pub fn resolve(self, outcome: Result<SubmitReceipt, SubmitError>) -> Transition {
        if self.step != Step::Submitting {
            return Err(self.invalid());
        }

        match outcome {
            Ok(receipt) => {
                info!("Denuncia submitted with tracking id {}", receipt.tracking_id);
                Ok(Wizard {
                    step: Step::Success {
                        tracking_id: receipt.tracking_id,
                    },
                    draft: DenunciaDraft::new(),
                })
            }
            Err(err) => {
                warn!("Denuncia submission failed: {}", err);
                Ok(self.goto(Step::Failure {
                    message: err.to_string(),
                }))
            }
        }
    }

    /// Close the error alert and return to the last editable step
    pub fn dismiss(self) -> Transition {
        match self.step {
            Step::Failure { .. } => Ok(self.goto(Step::Detail)),
            _ => Err(self.invalid()),
        }
    }

    /// Leave the success screen with an empty form
    pub fn start_over(self) -> Transition {
        match self.step {
            Step::Success { .. } => Ok(Wizard::new()),
            _ => Err(self.invalid()),
        }
    }

    /// Confirm, send and resolve in one go
    pub async fn submit_with(self, sender: &dyn DenunciaSender) -> Transition {
        let (wizard, outgoing) = self.confirm()?;
        let outcome = sender.send(&outgoing).await;
        wizard.resolve(outcome)
    }
}
