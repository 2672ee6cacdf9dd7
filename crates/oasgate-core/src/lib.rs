//! Validation-result pipeline for oasgate.
//!
//! Turns uploaded bytes into an addressable [`Document`], hands it to a
//! pluggable [`RuleEngine`], classifies every raw diagnostic into a
//! [`Finding`] and aggregates them into a [`ValidationResult`] whose error
//! gate decides whether the [`PublishGate`] may invoke the publish action.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use oasgate_core::{CatalogPublisher, PublishGate, Upload, Validator};
//!
//! let validator = Validator::new(Arc::new(engine));
//! let gate = PublishGate::new(validator, Arc::new(CatalogPublisher));
//! let outcome = gate.run(&Upload::new("petstore.yaml", None, bytes))?;
//! ```

pub mod classify;
pub mod document;
pub mod engine;
pub mod error;
pub mod finding;
pub mod pipeline;
pub mod publish;
pub mod result;

pub use classify::{classify, classify_all, SEVERITY_LEVELS};
pub use document::{Document, DocumentFormat};
pub use engine::{RawDiagnostic, RuleEngine};
pub use error::{ClassificationError, ParseError, ValidateError};
pub use finding::{Code, Finding, PathSegment, Position, Range, Severity};
pub use pipeline::{Upload, Validator};
pub use publish::{
    CatalogPublisher, GateError, GateOutcome, GateState, PublishError, PublishGate,
    PublishReceipt, Publisher,
};
pub use result::{ValidationResult, UNRECOGNIZED_FORMAT};
