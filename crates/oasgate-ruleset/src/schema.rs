//! Structural validation of documents against the built-in OpenAPI schemas.

use oasgate_core::PathSegment;
use serde_json::{json, Value};

use crate::error::RulesetError;
use crate::format::DocFormat;

const OAS2_SCHEMA: &str = include_str!("../schemas/oas2.json");
const OAS3_SCHEMA: &str = include_str!("../schemas/oas3.json");

/// One schema violation.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    pub path: Vec<PathSegment>,
    pub message: String,
}

/// Compiled document schemas, one per format.
pub struct SchemaSet {
    oas2: jsonschema::Validator,
    oas3_0: jsonschema::Validator,
    oas3_1: jsonschema::Validator,
}

impl SchemaSet {
    pub fn compile() -> Result<Self, RulesetError> {
        let oas2 = parse("oas2", OAS2_SCHEMA)?;
        let oas3_0 = parse("oas3.0", OAS3_SCHEMA)?;

        // 3.1 relaxes `paths`: any of paths, components or webhooks will do.
        let mut oas3_1 = oas3_0.clone();
        oas3_1["required"] = json!(["openapi", "info"]);
        oas3_1["anyOf"] = json!([
            { "required": ["paths"] },
            { "required": ["components"] },
            { "required": ["webhooks"] }
        ]);

        Ok(Self {
            oas2: build("oas2", &oas2)?,
            oas3_0: build("oas3.0", &oas3_0)?,
            oas3_1: build("oas3.1", &oas3_1)?,
        })
    }

    /// Schema diagnostic code for a format.
    pub fn code(format: DocFormat) -> &'static str {
        match format {
            DocFormat::Oas2 => "oas2-schema",
            DocFormat::Oas3_0 | DocFormat::Oas3_1 => "oas3-schema",
        }
    }

    pub fn validate(&self, format: DocFormat, root: &Value) -> Vec<SchemaViolation> {
        let validator = match format {
            DocFormat::Oas2 => &self.oas2,
            DocFormat::Oas3_0 => &self.oas3_0,
            DocFormat::Oas3_1 => &self.oas3_1,
        };

        validator
            .iter_errors(root)
            .map(|error| SchemaViolation {
                path: pointer_to_path(&error.instance_path.to_string(), root),
                message: error.to_string(),
            })
            .collect()
    }
}

fn parse(name: &'static str, source: &str) -> Result<Value, RulesetError> {
    serde_json::from_str(source).map_err(|e| RulesetError::Schema {
        name,
        reason: e.to_string(),
    })
}

fn build(name: &'static str, schema: &Value) -> Result<jsonschema::Validator, RulesetError> {
    jsonschema::options()
        .build(schema)
        .map_err(|e| RulesetError::Schema {
            name,
            reason: e.to_string(),
        })
}

/// Turn a JSON pointer into path segments, using the document to tell
/// array indices from numeric object keys such as `"200"`.
pub(crate) fn pointer_to_path(pointer: &str, root: &Value) -> Vec<PathSegment> {
    let mut path = Vec::new();
    let mut node = Some(root);

    for raw in pointer.split('/').skip(1) {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let segment = match (node, token.parse::<usize>()) {
            (Some(Value::Array(_)), Ok(i)) => PathSegment::Index(i),
            _ => PathSegment::Key(token),
        };
        node = node.and_then(|n| match (&segment, n) {
            (PathSegment::Index(i), Value::Array(items)) => items.get(*i),
            (PathSegment::Key(k), Value::Object(map)) => map.get(k),
            _ => None,
        });
        path.push(segment);
    }

    path
}
