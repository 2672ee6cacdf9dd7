use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading a ruleset or building the engine.
///
/// All of them are startup failures: an engine is never built from a
/// ruleset that did not load cleanly.
#[derive(Debug, Error)]
pub enum RulesetError {
    /// The ruleset file could not be read.
    #[error("cannot read ruleset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ruleset is not valid YAML or has the wrong shape.
    #[error("invalid ruleset: {0}")]
    Syntax(String),

    /// A rule is structurally wrong.
    #[error("rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    /// A rule names a function that does not exist.
    #[error("rule '{rule}': unknown function '{function}'")]
    UnknownFunction { rule: String, function: String },

    /// A rule's function options are missing or malformed.
    #[error("rule '{rule}': invalid options for '{function}': {reason}")]
    InvalidOptions {
        rule: String,
        function: String,
        reason: String,
    },

    /// A `given` path could not be parsed.
    #[error("rule '{rule}': invalid path '{path}': {reason}")]
    InvalidPath {
        rule: String,
        path: String,
        reason: String,
    },

    /// A `pattern` or `casing` expression failed to compile.
    #[error("rule '{rule}': invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        reason: String,
    },

    /// A rule's severity is not one of `error`, `warn`, `info`, `hint`, `off`.
    #[error("rule '{rule}': unknown severity '{severity}'")]
    InvalidSeverity { rule: String, severity: String },

    /// A rule restricts itself to a format the engine does not know.
    #[error("rule '{rule}': unknown format '{format}'")]
    UnknownFormat { rule: String, format: String },

    /// A built-in document schema failed to compile.
    #[error("document schema '{name}' failed to compile: {reason}")]
    Schema { name: &'static str, reason: String },
}
