//! Ruleset loading.
//!
//! A ruleset is a YAML file with a `rules` mapping. Every rule is compiled
//! when the file is loaded, so a ruleset that loads is guaranteed to run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::RulesetError;
use crate::format::FormatFilter;
use crate::functions::RuleFunction;
use crate::path::JsonPath;

/// Severity configured for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSeverity {
    Error,
    Warn,
    Info,
    Hint,
    Off,
}

impl RuleSeverity {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.as_str() {
                "error" => Some(Self::Error),
                "warn" | "warning" => Some(Self::Warn),
                "info" | "information" => Some(Self::Info),
                "hint" => Some(Self::Hint),
                "off" => Some(Self::Off),
                _ => None,
            },
            Value::Bool(false) => Some(Self::Off),
            Value::Number(n) => match n.as_i64()? {
                -1 => Some(Self::Off),
                0 => Some(Self::Error),
                1 => Some(Self::Warn),
                2 => Some(Self::Info),
                3 => Some(Self::Hint),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleSeverity::Error => "error",
            RuleSeverity::Warn => "warn",
            RuleSeverity::Info => "info",
            RuleSeverity::Hint => "hint",
            RuleSeverity::Off => "off",
        }
    }

    /// Raw diagnostic level, or `None` when the rule is disabled.
    pub fn level(self) -> Option<i64> {
        match self {
            RuleSeverity::Error => Some(0),
            RuleSeverity::Warn => Some(1),
            RuleSeverity::Info => Some(2),
            RuleSeverity::Hint => Some(3),
            RuleSeverity::Off => None,
        }
    }
}

/// What a check inspects inside each node selected by `given`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// The selected node itself.
    Node,
    /// Every key of the selected object (`@key`).
    Keys,
    /// A dotted path below the selected node.
    Path(Vec<String>),
}

impl Field {
    fn parse(rule: &str, field: Option<&str>) -> Result<Self, RulesetError> {
        let Some(field) = field else {
            return Ok(Field::Node);
        };
        if field == "@key" {
            return Ok(Field::Keys);
        }
        let segments: Vec<String> = field.split('.').map(str::to_string).collect();
        if field.starts_with('$') || segments.iter().any(String::is_empty) {
            return Err(RulesetError::InvalidRule {
                rule: rule.to_string(),
                reason: format!("invalid field '{}'", field),
            });
        }
        Ok(Field::Path(segments))
    }
}

/// One `then` entry: a field and the function applied to it.
#[derive(Debug)]
pub struct Check {
    pub field: Field,
    pub function: RuleFunction,
}

/// A compiled rule.
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    pub description: Option<String>,
    pub message: Option<String>,
    pub severity: RuleSeverity,
    /// Empty means the rule applies to every document, recognized or not.
    pub formats: Vec<FormatFilter>,
    pub given: Vec<JsonPath>,
    pub then: Vec<Check>,
}

impl Rule {
    pub fn is_enabled(&self) -> bool {
        self.severity != RuleSeverity::Off
    }

    pub fn is_format_agnostic(&self) -> bool {
        self.formats.is_empty()
    }
}

/// A loaded ruleset, rules kept in file order.
#[derive(Debug)]
pub struct Ruleset {
    source: Option<PathBuf>,
    rules: Vec<Rule>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRuleset {
    #[serde(default)]
    rules: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    description: Option<String>,
    message: Option<String>,
    severity: Option<Value>,
    formats: Option<Vec<String>>,
    given: OneOrMany<String>,
    then: OneOrMany<RawCheck>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawCheck {
    field: Option<String>,
    function: String,
    function_options: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

impl Ruleset {
    /// Load and compile a ruleset file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RulesetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RulesetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut ruleset = Self::from_yaml_str(&content)?;
        ruleset.source = Some(path.to_path_buf());
        Ok(ruleset)
    }

    /// Compile a ruleset from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, RulesetError> {
        let raw: RawRuleset =
            serde_yaml::from_str(content).map_err(|e| RulesetError::Syntax(e.to_string()))?;

        let rules = raw
            .rules
            .into_iter()
            .map(|(name, value)| compile_rule(name, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: None,
            rules,
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules that are not switched off.
    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_enabled())
    }
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str("<inline>"),
        }
    }
}

fn compile_rule(name: String, value: Value) -> Result<Rule, RulesetError> {
    let raw: RawRule = serde_json::from_value(value).map_err(|e| RulesetError::InvalidRule {
        rule: name.clone(),
        reason: e.to_string(),
    })?;

    let severity = match &raw.severity {
        None => RuleSeverity::Warn,
        Some(value) => RuleSeverity::parse(value).ok_or_else(|| RulesetError::InvalidSeverity {
            rule: name.clone(),
            severity: crate::functions::render(value),
        })?,
    };

    let formats = raw
        .formats
        .unwrap_or_default()
        .iter()
        .map(|f| {
            FormatFilter::parse(f).ok_or_else(|| RulesetError::UnknownFormat {
                rule: name.clone(),
                format: f.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let given = raw
        .given
        .into_vec()
        .iter()
        .map(|expr| {
            JsonPath::parse(expr).map_err(|reason| RulesetError::InvalidPath {
                rule: name.clone(),
                path: expr.clone(),
                reason,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if given.is_empty() {
        return Err(RulesetError::InvalidRule {
            rule: name,
            reason: "'given' must name at least one path".into(),
        });
    }

    let then = raw
        .then
        .into_vec()
        .into_iter()
        .map(|check| {
            Ok(Check {
                field: Field::parse(&name, check.field.as_deref())?,
                function: RuleFunction::build(
                    &name,
                    &check.function,
                    check.function_options.as_ref(),
                )?,
            })
        })
        .collect::<Result<Vec<_>, RulesetError>>()?;
    if then.is_empty() {
        return Err(RulesetError::InvalidRule {
            rule: name,
            reason: "'then' must contain at least one check".into(),
        });
    }

    Ok(Rule {
        name,
        description: raw.description,
        message: raw.message,
        severity,
        formats,
        given,
        then,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RULESET: &str = r#"
rules:
  info-contact:
    description: Info object must have a contact.
    given: $.info
    then:
      field: contact
      function: truthy
  operation-ids:
    severity: error
    formats: [oas3]
    given:
      - $.paths[*].get
      - $.paths[*].post
    then:
      - field: operationId
        function: defined
      - field: operationId
        function: casing
        functionOptions:
          type: camel
  no-trailing-slash:
    severity: off
    given: $.paths
    then:
      field: "@key"
      function: pattern
      functionOptions:
        notMatch: /$
"#;

    #[test]
    fn loads_rules_in_file_order() {
        let ruleset = Ruleset::from_yaml_str(RULESET).unwrap();
        let names: Vec<&str> = ruleset.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["info-contact", "operation-ids", "no-trailing-slash"]);
        assert_eq!(ruleset.active_rules().count(), 2);
        assert!(ruleset.source().is_none());
    }

    #[test]
    fn single_and_list_forms() {
        let ruleset = Ruleset::from_yaml_str(RULESET).unwrap();
        let contact = &ruleset.rules()[0];
        assert_eq!(contact.severity, RuleSeverity::Warn);
        assert!(contact.is_format_agnostic());
        assert_eq!(contact.given.len(), 1);
        assert_eq!(contact.then[0].field, Field::Path(vec!["contact".into()]));

        let ids = &ruleset.rules()[1];
        assert_eq!(ids.severity.level(), Some(0));
        assert_eq!(ids.formats, [FormatFilter::Oas3]);
        assert_eq!(ids.given.len(), 2);
        assert_eq!(ids.then.len(), 2);
        assert_eq!(ids.then[1].function.name(), "casing");

        let slash = &ruleset.rules()[2];
        assert_eq!(slash.then[0].field, Field::Keys);
        assert!(!slash.is_enabled());
        assert_eq!(slash.severity.level(), None);
    }

    #[test]
    fn numeric_severities() {
        assert_eq!(RuleSeverity::parse(&Value::from(0)), Some(RuleSeverity::Error));
        assert_eq!(RuleSeverity::parse(&Value::from(3)), Some(RuleSeverity::Hint));
        assert_eq!(RuleSeverity::parse(&Value::from(-1)), Some(RuleSeverity::Off));
        assert_eq!(RuleSeverity::parse(&Value::from(7)), None);
        assert_eq!(RuleSeverity::parse(&Value::from("fatal")), None);
    }

    fn load_err(yaml: &str) -> RulesetError {
        Ruleset::from_yaml_str(yaml).unwrap_err()
    }

    #[test]
    fn rejects_bad_rules_at_load_time() {
        assert!(matches!(
            load_err("rules:\n  r:\n    given: $\n    then:\n      function: nope\n"),
            RulesetError::UnknownFunction { function, .. } if function == "nope"
        ));
        assert!(matches!(
            load_err("rules:\n  r:\n    given: info\n    then:\n      function: truthy\n"),
            RulesetError::InvalidPath { .. }
        ));
        assert!(matches!(
            load_err("rules:\n  r:\n    severity: fatal\n    given: $\n    then:\n      function: truthy\n"),
            RulesetError::InvalidSeverity { severity, .. } if severity == "fatal"
        ));
        assert!(matches!(
            load_err("rules:\n  r:\n    formats: [asyncapi2]\n    given: $\n    then:\n      function: truthy\n"),
            RulesetError::UnknownFormat { .. }
        ));
        assert!(matches!(
            load_err("rules:\n  r:\n    given: $\n    then:\n      function: pattern\n      functionOptions:\n        match: '(['\n"),
            RulesetError::InvalidPattern { .. }
        ));
        assert!(matches!(
            load_err("rules:\n  r:\n    given: $\n    then:\n      function: length\n"),
            RulesetError::InvalidOptions { .. }
        ));
        assert!(matches!(
            load_err("rules:\n  r:\n    given: $\n    then:\n      function: truthy\n    colour: red\n"),
            RulesetError::InvalidRule { .. }
        ));
        assert!(matches!(
            load_err("rules:\n  r:\n    given: []\n    then:\n      function: truthy\n"),
            RulesetError::InvalidRule { .. }
        ));
        assert!(matches!(
            load_err("rules: ["),
            RulesetError::Syntax(_)
        ));
    }

    #[test]
    fn empty_ruleset_is_valid() {
        assert!(Ruleset::from_yaml_str("rules: {}").unwrap().rules().is_empty());
        assert!(Ruleset::from_yaml_str("{}").unwrap().rules().is_empty());
    }

    #[test]
    fn from_path_records_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RULESET.as_bytes()).unwrap();
        let ruleset = Ruleset::from_path(file.path()).unwrap();
        assert_eq!(ruleset.source(), Some(file.path()));
        assert_eq!(ruleset.to_string(), file.path().display().to_string());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Ruleset::from_path("/nonexistent/ruleset.yaml").unwrap_err();
        assert!(matches!(err, RulesetError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/ruleset.yaml"));
    }
}
