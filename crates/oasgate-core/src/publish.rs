//! Publish gate.
//!
//! Drives one upload through
//! `Received → Validating → {Rejected | Validated} → {Published | PublishFailed}`.
//! The publisher runs at most once per request, and only from `Validated`.

use std::fmt;
use std::sync::Arc;

use oasgate_telemetry::{log_document_published, log_publish_failed};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::document::Document;
use crate::error::ValidateError;
use crate::pipeline::{Upload, Validator};
use crate::result::ValidationResult;

/// States of a request passing through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Received,
    Validating,
    Rejected,
    Validated,
    Published,
    PublishFailed,
}

impl GateState {
    pub fn can_advance_to(self, next: GateState) -> bool {
        use GateState::*;
        matches!(
            (self, next),
            (Received, Validating)
                | (Validating, Rejected)
                | (Validating, Validated)
                | (Validated, Published)
                | (Validated, PublishFailed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GateState::Rejected | GateState::Published | GateState::PublishFailed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GateState::Received => "received",
            GateState::Validating => "validating",
            GateState::Rejected => "rejected",
            GateState::Validated => "validated",
            GateState::Published => "published",
            GateState::PublishFailed => "publish_failed",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confirmation returned by a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub document: String,
    pub sha256: String,
    pub message: String,
}

impl PublishReceipt {
    pub fn for_document(document: &Document) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(document.text().as_bytes());
        Self {
            document: document.name().to_string(),
            sha256: hex::encode(hasher.finalize()),
            message: format!(
                "OpenAPI document: {} published to API catalog",
                document.name()
            ),
        }
    }
}

/// The catalog refused or failed to take the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("catalog rejected '{document}': {reason}")]
    Rejected { document: String, reason: String },
}

/// Downstream publish action.
pub trait Publisher: Send + Sync {
    fn publish(&self, document: &Document) -> Result<PublishReceipt, PublishError>;
}

/// Publisher with no backing catalog. Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogPublisher;

impl Publisher for CatalogPublisher {
    fn publish(&self, document: &Document) -> Result<PublishReceipt, PublishError> {
        Ok(PublishReceipt::for_document(document))
    }
}

/// Terminal (or validation-only) result of a gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Rejected(ValidationResult),
    Validated(ValidationResult),
    Published {
        result: ValidationResult,
        receipt: PublishReceipt,
    },
}

impl GateOutcome {
    pub fn state(&self) -> GateState {
        match self {
            GateOutcome::Rejected(_) => GateState::Rejected,
            GateOutcome::Validated(_) => GateState::Validated,
            GateOutcome::Published { .. } => GateState::Published,
        }
    }

    pub fn result(&self) -> &ValidationResult {
        match self {
            GateOutcome::Rejected(result)
            | GateOutcome::Validated(result)
            | GateOutcome::Published { result, .. } => result,
        }
    }
}

/// A gate run failed outside of validation findings.
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Validate(#[from] ValidateError),

    /// Reached `PublishFailed`.
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

impl GateError {
    pub fn state(&self) -> GateState {
        match self {
            GateError::Validate(_) => GateState::Validating,
            GateError::Publish(_) => GateState::PublishFailed,
        }
    }
}

struct Transitions<'a> {
    document: &'a str,
    state: GateState,
}

impl<'a> Transitions<'a> {
    fn start(document: &'a str) -> Self {
        tracing::debug!(document, state = %GateState::Received, "gate state");
        Self {
            document,
            state: GateState::Received,
        }
    }

    fn advance(&mut self, next: GateState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal gate transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(document = self.document, from = %self.state, to = %next, "gate state");
        self.state = next;
    }
}

/// Gates the publish action on a clean validation result.
#[derive(Clone)]
pub struct PublishGate {
    validator: Validator,
    publisher: Arc<dyn Publisher>,
}

impl PublishGate {
    pub fn new(validator: Validator, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            validator,
            publisher,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validate without publishing; stops at `Rejected` or `Validated`.
    pub fn validate_only(&self, upload: &Upload) -> Result<GateOutcome, GateError> {
        let mut transitions = Transitions::start(&upload.filename);
        let (_, result) = self.validate(upload, &mut transitions)?;
        Ok(if result.has_errors() {
            transitions.advance(GateState::Rejected);
            GateOutcome::Rejected(result)
        } else {
            transitions.advance(GateState::Validated);
            GateOutcome::Validated(result)
        })
    }

    /// Validate, then publish iff the error gate passes.
    pub fn run(&self, upload: &Upload) -> Result<GateOutcome, GateError> {
        let mut transitions = Transitions::start(&upload.filename);
        let (document, result) = self.validate(upload, &mut transitions)?;

        if result.has_errors() {
            transitions.advance(GateState::Rejected);
            return Ok(GateOutcome::Rejected(result));
        }
        transitions.advance(GateState::Validated);

        match self.publisher.publish(&document) {
            Ok(receipt) => {
                transitions.advance(GateState::Published);
                log_document_published!(
                    document = %receipt.document,
                    sha256 = %receipt.sha256
                );
                Ok(GateOutcome::Published { result, receipt })
            }
            Err(e) => {
                transitions.advance(GateState::PublishFailed);
                log_publish_failed!(document = %document.name(), error = %e);
                Err(GateError::Publish(e))
            }
        }
    }

    fn validate(
        &self,
        upload: &Upload,
        transitions: &mut Transitions<'_>,
    ) -> Result<(Document, ValidationResult), GateError> {
        transitions.advance(GateState::Validating);
        Ok(self.validator.validate(upload)?)
    }
}
