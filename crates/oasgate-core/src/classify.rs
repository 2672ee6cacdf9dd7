//! Finding classifier.

use crate::engine::RawDiagnostic;
use crate::error::ClassificationError;
use crate::finding::{Finding, Severity};

/// Raw engine level → canonical severity.
pub const SEVERITY_LEVELS: [(i64, Severity); 4] = [
    (0, Severity::Error),
    (1, Severity::Warning),
    (2, Severity::Information),
    (3, Severity::Hint),
];

fn resolve_severity(level: i64) -> Option<Severity> {
    SEVERITY_LEVELS
        .iter()
        .find(|(raw, _)| *raw == level)
        .map(|(_, severity)| *severity)
}

/// Build the finding for one raw diagnostic.
pub fn classify(raw: &RawDiagnostic) -> Result<Finding, ClassificationError> {
    let severity =
        resolve_severity(raw.severity).ok_or_else(|| ClassificationError::UnknownSeverity {
            code: raw.code.to_string(),
            level: raw.severity,
        })?;

    if !raw.range.is_well_formed() {
        return Err(ClassificationError::InvertedRange {
            code: raw.code.to_string(),
        });
    }

    Ok(Finding::new(
        raw.code.clone(),
        raw.message.clone(),
        raw.path.clone(),
        raw.range,
        severity,
    ))
}

/// Classify a whole diagnostic stream, keeping emission order.
pub fn classify_all<'a, I>(diagnostics: I) -> Result<Vec<Finding>, ClassificationError>
where
    I: IntoIterator<Item = &'a RawDiagnostic>,
{
    diagnostics.into_iter().map(classify).collect()
}
