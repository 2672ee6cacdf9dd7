//! Findings and the value types they are made of.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::result::UNRECOGNIZED_FORMAT;

/// Zero-based location in a document. `character` counts Unicode scalar
/// values from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const ZERO: Position = Position {
        line: 0,
        character: 0,
    };

    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Span between two positions. A well-formed range has `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Empty range at a single position.
    pub fn at(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.start <= self.end
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::at(Position::ZERO)
    }
}

/// Criticality of a finding, ordered `Error > Warning > Information > Hint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Error,
        Severity::Warning,
        Severity::Information,
        Severity::Hint,
    ];

    /// Canonical label used on the wire.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Information => "Information",
            Severity::Hint => "Hint",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Severity::Error => 3,
            Severity::Warning => 2,
            Severity::Information => 1,
            Severity::Hint => 0,
        }
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rule or engine code identifying what produced a finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    Number(i64),
    Name(String),
}

impl Code {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Code::Name(name) => Some(name),
            Code::Number(_) => None,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Number(n) => write!(f, "{}", n),
            Code::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Code {
    fn from(name: &str) -> Self {
        Code::Name(name.to_string())
    }
}

impl From<String> for Code {
    fn from(name: String) -> Self {
        Code::Name(name)
    }
}

impl From<i64> for Code {
    fn from(n: i64) -> Self {
        Code::Number(n)
    }
}

/// One step of a key path into the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A classified diagnostic.
///
/// Only [`crate::classify`] builds findings, and nothing mutates them
/// afterwards. Serializes to the wire DTO with the severity as its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    code: Code,
    message: String,
    path: Vec<PathSegment>,
    range: Range,
    severity: Severity,
}

impl Finding {
    pub(crate) fn new(
        code: Code,
        message: String,
        path: Vec<PathSegment>,
        range: Range,
        severity: Severity,
    ) -> Self {
        Self {
            code,
            message,
            path,
            range,
            severity,
        }
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// True when this finding alone blocks publication: it is an error or
    /// reports an unrecognized format.
    pub fn fails_gate(&self) -> bool {
        self.severity == Severity::Error || self.code.as_name() == Some(UNRECOGNIZED_FORMAT)
    }

    /// Dotted rendering of the path, e.g. `paths./pets.get`.
    pub fn path_display(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_total_order() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Information);
        assert!(Severity::Information > Severity::Hint);
        assert_eq!(Severity::ALL.iter().max(), Some(&Severity::Error));
        assert_eq!(Severity::ALL.iter().min(), Some(&Severity::Hint));
    }

    #[test]
    fn severity_serializes_as_label() {
        for severity in Severity::ALL {
            assert_eq!(
                serde_json::to_value(severity).unwrap(),
                json!(severity.label())
            );
        }
    }

    #[test]
    fn position_orders_in_document_order() {
        assert!(Position::new(1, 9) < Position::new(2, 0));
        assert!(Position::new(3, 1) < Position::new(3, 2));
        assert!(Range::new(Position::new(2, 4), Position::new(2, 4)).is_well_formed());
        assert!(!Range::new(Position::new(2, 4), Position::new(1, 8)).is_well_formed());
    }

    #[test]
    fn finding_wire_shape() {
        let finding = Finding::new(
            Code::from("info-contact"),
            "Info object must have \"contact\" object.".into(),
            vec![PathSegment::from("paths"), PathSegment::from("/pets"), PathSegment::Index(0)],
            Range::new(Position::new(1, 0), Position::new(1, 12)),
            Severity::Warning,
        );

        assert_eq!(
            serde_json::to_value(&finding).unwrap(),
            json!({
                "code": "info-contact",
                "message": "Info object must have \"contact\" object.",
                "path": ["paths", "/pets", 0],
                "range": {
                    "start": {"line": 1, "character": 0},
                    "end": {"line": 1, "character": 12}
                },
                "severity": "Warning"
            })
        );
        assert_eq!(finding.path_display(), "paths./pets.0");
    }

    #[test]
    fn gate_failure_by_severity_or_code() {
        let finding = |code: &str, severity| {
            Finding::new(Code::from(code), String::new(), vec![], Range::default(), severity)
        };
        assert!(finding("rule", Severity::Error).fails_gate());
        assert!(!finding("rule", Severity::Warning).fails_gate());
        assert!(!finding("rule", Severity::Hint).fails_gate());
        assert!(finding(UNRECOGNIZED_FORMAT, Severity::Warning).fails_gate());
        assert!(finding(UNRECOGNIZED_FORMAT, Severity::Information).fails_gate());
    }

    #[test]
    fn numeric_code_serializes_as_number() {
        assert_eq!(serde_json::to_value(Code::from(42i64)).unwrap(), json!(42));
        assert_eq!(Code::from(42i64).to_string(), "42");
        assert_eq!(Code::from("parser").as_name(), Some("parser"));
    }
}
