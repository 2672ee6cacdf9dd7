//! Ruleset-driven OpenAPI rule engine.
//!
//! [`RulesetEngine`] implements [`oasgate_core::RuleEngine`]. For each
//! document it:
//! - parses the YAML text, reporting syntax errors as a `parser` diagnostic;
//! - detects the format (OpenAPI 2.0, 3.0 or 3.1), reporting
//!   `unrecognized-format` otherwise;
//! - validates structure against an embedded schema (`oas2-schema`,
//!   `oas3-schema`);
//! - evaluates the custom rules of a [`Ruleset`] in file order.
//!
//! Every diagnostic is positioned in the source by a block-structure scan
//! of the YAML text.

mod engine;
mod error;
mod format;
mod functions;
mod locate;
mod path;
mod ruleset;
mod schema;
mod yaml;

pub use engine::{RulesetEngine, PARSER};
pub use error::RulesetError;
pub use format::{DocFormat, FormatFilter};
pub use functions::{Casing, RuleFunction};
pub use path::{JsonPath, Selected};
pub use ruleset::{Check, Field, Rule, RuleSeverity, Ruleset};
pub use schema::{SchemaSet, SchemaViolation};
