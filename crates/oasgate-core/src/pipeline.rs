//! Loader → engine → classifier wiring.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use oasgate_telemetry::log_validation_completed;
use uuid::Uuid;

use crate::document::{Document, DocumentFormat};
use crate::engine::RuleEngine;
use crate::error::ValidateError;
use crate::result::ValidationResult;

/// A file accepted by the upload boundary.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes: bytes.into(),
        }
    }
}

/// Runs one upload through the whole validation pipeline.
#[derive(Clone)]
pub struct Validator {
    engine: Arc<dyn RuleEngine>,
}

impl Validator {
    pub fn new(engine: Arc<dyn RuleEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<dyn RuleEngine> {
        &self.engine
    }

    /// Load, evaluate and classify. Findings are data; only an unreadable
    /// document or an unclassifiable diagnostic is an error.
    pub fn validate(&self, upload: &Upload) -> Result<(Document, ValidationResult), ValidateError> {
        let validation_id = Uuid::now_v7();
        let started = Instant::now();

        let document = Document::load(&upload.bytes, &upload.filename, DocumentFormat::Yaml)
            .inspect_err(|e| {
                tracing::warn!(%validation_id, document = %upload.filename, error = %e, "document could not be loaded");
            })?;

        let diagnostics = self.engine.run(&document);
        let result = ValidationResult::from_diagnostics(&diagnostics).inspect_err(|e| {
            tracing::error!(%validation_id, document = %upload.filename, error = %e, "engine emitted an unclassifiable diagnostic");
        })?;

        log_validation_completed!(
            %validation_id,
            document = %document.name(),
            findings = result.len(),
            has_errors = result.has_errors(),
            duration_ms = started.elapsed().as_millis() as u64
        );

        Ok((document, result))
    }
}
