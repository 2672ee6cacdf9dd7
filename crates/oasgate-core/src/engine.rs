//! Rule engine boundary.

use crate::document::Document;
use crate::finding::{Code, PathSegment, Range};

/// A diagnostic as emitted by a rule engine, before classification.
///
/// `severity` is the engine's raw level: `0` error, `1` warning,
/// `2` information, `3` hint. Anything else is rejected by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDiagnostic {
    pub code: Code,
    pub message: String,
    pub path: Vec<PathSegment>,
    pub range: Range,
    pub severity: i64,
}

impl RawDiagnostic {
    pub fn new(code: impl Into<Code>, message: impl Into<String>, severity: i64) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: Vec::new(),
            range: Range::default(),
            severity,
        }
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }
}

/// Evaluates documents against a loaded ruleset.
///
/// Implementations are initialized once per process and shared read-only by
/// all requests, so `run` takes `&self` and must not reconfigure the engine.
/// Documents in a format the engine does not recognize must produce an
/// `unrecognized-format` diagnostic rather than an empty result.
pub trait RuleEngine: Send + Sync {
    fn run(&self, document: &Document) -> Vec<RawDiagnostic>;

    /// Number of active rules, for health reporting.
    fn rule_count(&self) -> usize {
        0
    }
}
