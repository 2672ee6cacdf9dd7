//! The ruleset-driven rule engine.

use std::borrow::Cow;
use std::path::Path;

use oasgate_core::{Document, PathSegment, Range, RawDiagnostic, RuleEngine, UNRECOGNIZED_FORMAT};
use serde_json::Value;

use crate::error::RulesetError;
use crate::format::DocFormat;
use crate::functions::render;
use crate::locate::SourceMap;
use crate::path::Selected;
use crate::ruleset::{Check, Field, Rule, Ruleset};
use crate::schema::SchemaSet;
use crate::yaml;

/// Code of the diagnostic emitted for YAML syntax errors.
pub const PARSER: &str = "parser";

/// Rule engine backed by a compiled [`Ruleset`] and the built-in schemas.
///
/// Built once at startup; `run` never mutates it.
pub struct RulesetEngine {
    ruleset: Ruleset,
    schemas: SchemaSet,
}

impl RulesetEngine {
    /// Load the ruleset at `path` and build the engine.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesetError> {
        Self::from_ruleset(Ruleset::from_path(path)?)
    }

    pub fn from_ruleset(ruleset: Ruleset) -> Result<Self, RulesetError> {
        let schemas = SchemaSet::compile()?;
        tracing::debug!(
            ruleset = %ruleset,
            rules = ruleset.rules().len(),
            active = ruleset.active_rules().count(),
            "rule engine ready"
        );
        Ok(Self { ruleset, schemas })
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    fn schema_diagnostics(
        &self,
        format: DocFormat,
        root: &Value,
        source: &SourceMap,
        out: &mut Vec<RawDiagnostic>,
    ) {
        let code = SchemaSet::code(format);
        for violation in self.schemas.validate(format, root) {
            let range = source.range_of(&violation.path);
            out.push(
                RawDiagnostic::new(code, violation.message, 0)
                    .with_path(violation.path)
                    .with_range(range),
            );
        }
    }
}

impl RuleEngine for RulesetEngine {
    fn run(&self, document: &Document) -> Vec<RawDiagnostic> {
        let mut diagnostics = Vec::new();

        let root = match yaml::parse(document.text()) {
            Ok(root) => root,
            Err(error) => {
                let range = match error.offset.map(|offset| document.position_at(offset)) {
                    Some(start) => {
                        let end = document.end_of_line(start.line as usize);
                        if end >= start {
                            Range::new(start, end)
                        } else {
                            Range::at(start)
                        }
                    }
                    None => Range::default(),
                };
                diagnostics.push(RawDiagnostic::new(PARSER, error.message, 0).with_range(range));
                return diagnostics;
            }
        };

        let source = SourceMap::new(document);
        let format = DocFormat::detect(&root);

        match format {
            Some(format) => self.schema_diagnostics(format, &root, &source, &mut diagnostics),
            None => diagnostics.push(RawDiagnostic::new(
                UNRECOGNIZED_FORMAT,
                unrecognized_message(),
                1,
            )),
        }

        for rule in self.ruleset.active_rules() {
            let applies = match format {
                Some(format) => {
                    rule.is_format_agnostic() || rule.formats.iter().any(|f| f.matches(format))
                }
                None => rule.is_format_agnostic(),
            };
            if applies {
                evaluate_rule(rule, &root, &source, &mut diagnostics);
            }
        }

        diagnostics
    }

    fn rule_count(&self) -> usize {
        self.ruleset.active_rules().count()
    }
}

fn unrecognized_message() -> String {
    let names: Vec<&str> = DocFormat::ALL.iter().map(|f| f.display_name()).collect();
    format!(
        "The provided document does not match any of the registered formats [{}]",
        names.join(", ")
    )
}

/// One value a check inspects, with its path. `value` is `None` when the
/// field does not exist.
struct Target<'v> {
    path: Vec<PathSegment>,
    value: Option<Cow<'v, Value>>,
}

fn targets<'v>(node: &Selected<'v>, field: &Field) -> Vec<Target<'v>> {
    match field {
        Field::Node => vec![Target {
            path: node.path.clone(),
            value: Some(Cow::Borrowed(node.value)),
        }],
        Field::Keys => match node.value {
            Value::Object(map) => map
                .keys()
                .map(|key| {
                    let mut path = node.path.clone();
                    path.push(key.as_str().into());
                    Target {
                        path,
                        value: Some(Cow::Owned(Value::String(key.clone()))),
                    }
                })
                .collect(),
            _ => Vec::new(),
        },
        Field::Path(segments) => {
            let mut path = node.path.clone();
            let mut value = Some(node.value);
            for segment in segments {
                let (next, step) = match (value, segment.parse::<usize>()) {
                    (Some(Value::Array(items)), Ok(i)) => (items.get(i), PathSegment::Index(i)),
                    (Some(Value::Object(map)), _) => (map.get(segment), segment.as_str().into()),
                    _ => (None, segment.as_str().into()),
                };
                value = next;
                path.push(step);
            }
            vec![Target {
                path,
                value: value.map(Cow::Borrowed),
            }]
        }
    }
}

fn evaluate_rule(rule: &Rule, root: &Value, source: &SourceMap, out: &mut Vec<RawDiagnostic>) {
    let Some(level) = rule.severity.level() else {
        return;
    };

    for given in &rule.given {
        for node in given.select(root) {
            for check in &rule.then {
                evaluate_check(rule, check, level, &node, source, out);
            }
        }
    }
}

fn evaluate_check(
    rule: &Rule,
    check: &Check,
    level: i64,
    node: &Selected<'_>,
    source: &SourceMap,
    out: &mut Vec<RawDiagnostic>,
) {
    for target in targets(node, &check.field) {
        let property = target
            .path
            .last()
            .map(ToString::to_string)
            .unwrap_or_default();

        for error in check.function.evaluate(target.value.as_deref(), &property) {
            let message = match &rule.message {
                Some(template) => interpolate(template, rule, &error, &target, &property),
                None => error,
            };
            let range = source.range_of(&target.path);
            out.push(
                RawDiagnostic::new(rule.name.as_str(), message, level)
                    .with_path(target.path.clone())
                    .with_range(range),
            );
        }
    }
}

fn interpolate(
    template: &str,
    rule: &Rule,
    error: &str,
    target: &Target<'_>,
    property: &str,
) -> String {
    let path = target
        .path
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".");
    let value = target.value.as_deref().map(render).unwrap_or_default();

    // Placeholders are read from the template only; substituted text is
    // copied through as-is.
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            rest = &rest[open..];
            break;
        };
        let replacement = match &after[..close] {
            "description" => Some(rule.description.as_deref().unwrap_or("")),
            "error" => Some(error),
            "property" => Some(property),
            "path" => Some(path.as_str()),
            "value" => Some(value.as_str()),
            _ => None,
        };
        match replacement {
            Some(text) => {
                out.push_str(text);
                rest = &after[close + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
