//! Validation result and error gate.

use crate::classify::classify_all;
use crate::engine::RawDiagnostic;
use crate::error::ClassificationError;
use crate::finding::{Finding, Severity};

/// Code of the diagnostic an engine emits for documents in no known format.
///
/// Findings with this code fail the error gate whatever their severity.
pub const UNRECOGNIZED_FORMAT: &str = "unrecognized-format";

/// Ordered findings of one validation run.
///
/// Built once from the full diagnostic stream and frozen afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    findings: Vec<Finding>,
}

impl ValidationResult {
    /// Classify the engine's diagnostics in emission order.
    pub fn from_diagnostics<'a, I>(diagnostics: I) -> Result<Self, ClassificationError>
    where
        I: IntoIterator<Item = &'a RawDiagnostic>,
    {
        Ok(Self {
            findings: classify_all(diagnostics)?,
        })
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    /// True iff some finding is an error or reports an unrecognized format.
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::fails_gate)
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.findings.iter().map(Finding::severity).max()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity() == severity)
            .count()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}
