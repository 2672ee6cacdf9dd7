//! Rule functions.
//!
//! Each function inspects one target value (absent when the rule's `field`
//! does not exist) and returns zero or more error messages.

use std::fmt;

use regex_lite::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::RulesetError;

/// Casing conventions accepted by `casing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    Flat,
    Camel,
    Pascal,
    Kebab,
    Cobol,
    Snake,
    Macro,
}

impl Casing {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "flat" => Some(Self::Flat),
            "camel" => Some(Self::Camel),
            "pascal" => Some(Self::Pascal),
            "kebab" => Some(Self::Kebab),
            "cobol" => Some(Self::Cobol),
            "snake" => Some(Self::Snake),
            "macro" => Some(Self::Macro),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Casing::Flat => "flat",
            Casing::Camel => "camel",
            Casing::Pascal => "pascal",
            Casing::Kebab => "kebab",
            Casing::Cobol => "cobol",
            Casing::Snake => "snake",
            Casing::Macro => "macro",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Casing::Flat => r"^[a-z][a-z0-9]*$",
            Casing::Camel => r"^[a-z][a-z0-9]*(?:[A-Z0-9][a-z0-9]*)*$",
            Casing::Pascal => r"^[A-Z][a-z0-9]*(?:[A-Z0-9][a-z0-9]*)*$",
            Casing::Kebab => r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*$",
            Casing::Cobol => r"^[A-Z][A-Z0-9]*(?:-[A-Z0-9]+)*$",
            Casing::Snake => r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)*$",
            Casing::Macro => r"^[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)*$",
        }
    }
}

/// A compiled rule function.
pub enum RuleFunction {
    Truthy,
    Falsy,
    Defined,
    Undefined,
    Pattern {
        must_match: Option<(String, Regex)>,
        must_not_match: Option<(String, Regex)>,
    },
    Enumeration {
        values: Vec<Value>,
    },
    Length {
        min: Option<f64>,
        max: Option<f64>,
    },
    Casing {
        casing: Casing,
        regex: Regex,
    },
    Schema {
        validator: jsonschema::Validator,
    },
}

impl fmt::Debug for RuleFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternOptions {
    #[serde(rename = "match")]
    must_match: Option<String>,
    #[serde(rename = "notMatch")]
    must_not_match: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumerationOptions {
    values: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LengthOptions {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CasingOptions {
    #[serde(rename = "type")]
    casing: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaOptions {
    schema: Value,
}

impl RuleFunction {
    /// Compile function `name` with its options for rule `rule`.
    pub fn build(rule: &str, name: &str, options: Option<&Value>) -> Result<Self, RulesetError> {
        let invalid = |reason: String| RulesetError::InvalidOptions {
            rule: rule.to_string(),
            function: name.to_string(),
            reason,
        };

        match name {
            "truthy" => Ok(Self::Truthy),
            "falsy" => Ok(Self::Falsy),
            "defined" => Ok(Self::Defined),
            "undefined" => Ok(Self::Undefined),
            "pattern" => {
                let opts: PatternOptions = options_of(options).map_err(invalid)?;
                if opts.must_match.is_none() && opts.must_not_match.is_none() {
                    return Err(invalid("one of 'match' or 'notMatch' is required".into()));
                }
                Ok(Self::Pattern {
                    must_match: opts
                        .must_match
                        .map(|p| compile_pattern(rule, &p).map(|r| (p, r)))
                        .transpose()?,
                    must_not_match: opts
                        .must_not_match
                        .map(|p| compile_pattern(rule, &p).map(|r| (p, r)))
                        .transpose()?,
                })
            }
            "enumeration" => {
                let opts: EnumerationOptions = options_of(options).map_err(invalid)?;
                Ok(Self::Enumeration {
                    values: opts.values,
                })
            }
            "length" => {
                let opts: LengthOptions = options_of(options).map_err(invalid)?;
                if opts.min.is_none() && opts.max.is_none() {
                    return Err(invalid("one of 'min' or 'max' is required".into()));
                }
                Ok(Self::Length {
                    min: opts.min,
                    max: opts.max,
                })
            }
            "casing" => {
                let opts: CasingOptions = options_of(options).map_err(invalid)?;
                let casing = Casing::parse(&opts.casing)
                    .ok_or_else(|| invalid(format!("unknown casing '{}'", opts.casing)))?;
                Ok(Self::Casing {
                    casing,
                    regex: compile_pattern(rule, casing.pattern())?,
                })
            }
            "schema" => {
                let opts: SchemaOptions = options_of(options).map_err(invalid)?;
                let validator = jsonschema::options()
                    .should_validate_formats(true)
                    .build(&opts.schema)
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(Self::Schema { validator })
            }
            other => Err(RulesetError::UnknownFunction {
                rule: rule.to_string(),
                function: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleFunction::Truthy => "truthy",
            RuleFunction::Falsy => "falsy",
            RuleFunction::Defined => "defined",
            RuleFunction::Undefined => "undefined",
            RuleFunction::Pattern { .. } => "pattern",
            RuleFunction::Enumeration { .. } => "enumeration",
            RuleFunction::Length { .. } => "length",
            RuleFunction::Casing { .. } => "casing",
            RuleFunction::Schema { .. } => "schema",
        }
    }

    /// Evaluate against `target`; `property` names it in messages.
    pub fn evaluate(&self, target: Option<&Value>, property: &str) -> Vec<String> {
        let subject = if property.is_empty() {
            "Value".to_string()
        } else {
            format!("\"{}\" property", property)
        };

        match self {
            RuleFunction::Truthy => {
                if target.is_some_and(is_truthy) {
                    vec![]
                } else {
                    vec![format!("{} must be truthy", subject)]
                }
            }
            RuleFunction::Falsy => {
                if target.is_some_and(is_truthy) {
                    vec![format!("{} must be falsy", subject)]
                } else {
                    vec![]
                }
            }
            RuleFunction::Defined => match target {
                Some(_) => vec![],
                None => vec![format!("{} must be defined", subject)],
            },
            RuleFunction::Undefined => match target {
                Some(_) => vec![format!("{} must not be defined", subject)],
                None => vec![],
            },
            RuleFunction::Pattern {
                must_match,
                must_not_match,
            } => {
                let Some(Value::String(s)) = target else {
                    return vec![];
                };
                let mut errors = Vec::new();
                if let Some((source, regex)) = must_match {
                    if !regex.is_match(s) {
                        errors.push(format!("\"{}\" must match the pattern \"{}\"", s, source));
                    }
                }
                if let Some((source, regex)) = must_not_match {
                    if regex.is_match(s) {
                        errors.push(format!(
                            "\"{}\" must not match the pattern \"{}\"",
                            s, source
                        ));
                    }
                }
                errors
            }
            RuleFunction::Enumeration { values } => match target {
                Some(value) if !values.contains(value) => {
                    let allowed: Vec<String> = values.iter().map(render).collect();
                    vec![format!(
                        "\"{}\" must be equal to one of the allowed values: {}",
                        render(value),
                        allowed.join(", ")
                    )]
                }
                _ => vec![],
            },
            RuleFunction::Length { min, max } => {
                let Some(len) = target.and_then(measure) else {
                    return vec![];
                };
                let mut errors = Vec::new();
                if let Some(min) = min {
                    if len < *min {
                        errors.push(format!("{} must not be shorter than {}", subject, min));
                    }
                }
                if let Some(max) = max {
                    if len > *max {
                        errors.push(format!("{} must not be longer than {}", subject, max));
                    }
                }
                errors
            }
            RuleFunction::Casing { casing, regex } => match target {
                Some(Value::String(s)) if !s.is_empty() && !regex.is_match(s) => {
                    vec![format!("\"{}\" must be {} case", s, casing.name())]
                }
                _ => vec![],
            },
            RuleFunction::Schema { validator } => match target {
                Some(value) => validator.iter_errors(value).map(|e| e.to_string()).collect(),
                None => vec![],
            },
        }
    }
}

fn options_of<T: for<'de> Deserialize<'de>>(options: Option<&Value>) -> Result<T, String> {
    let options = options.ok_or_else(|| "functionOptions is required".to_string())?;
    serde_json::from_value(options.clone()).map_err(|e| e.to_string())
}

/// Compile a pattern, accepting JavaScript-style `/source/flags` literals.
pub(crate) fn compile_pattern(rule: &str, pattern: &str) -> Result<Regex, RulesetError> {
    let expr = match pattern
        .strip_prefix('/')
        .and_then(|p| p.rfind('/').map(|end| (&p[..end], &p[end + 1..])))
    {
        Some((source, flags)) if flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'g' | 'u')) => {
            let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
            if inline.is_empty() {
                source.to_string()
            } else {
                format!("(?{}){}", inline, source)
            }
        }
        _ => pattern.to_string(),
    };

    Regex::new(&expr).map_err(|e| RulesetError::InvalidPattern {
        rule: rule.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// JavaScript truthiness.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
