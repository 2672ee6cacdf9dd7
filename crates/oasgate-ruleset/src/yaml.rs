//! YAML document parsing into the JSON data model rules operate on.

use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;

/// A YAML syntax error with its byte offset, when known.
#[derive(Debug, Clone)]
pub struct YamlError {
    pub message: String,
    pub offset: Option<usize>,
}

/// Parse `text` as a single YAML document.
///
/// An empty document parses to `null`. Merge keys (`<<`) are applied.
pub fn parse(text: &str) -> Result<Value, YamlError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    let mut yaml: Yaml = serde_yaml::from_str(text).map_err(to_error)?;
    yaml.apply_merge().map_err(to_error)?;
    Ok(to_json(yaml))
}

fn to_error(error: serde_yaml::Error) -> YamlError {
    YamlError {
        offset: error.location().map(|loc| loc.index()),
        message: error.to_string(),
    }
}

fn to_json(yaml: Yaml) -> Value {
    match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(key_string(key), to_json(value));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => to_json(tagged.value),
    }
}

fn number(n: &serde_yaml::Number) -> Value {
    if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else {
        // NaN and infinities have no JSON form.
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

/// Object keys are strings in JSON; scalars keep their YAML spelling.
fn key_string(key: Yaml) -> String {
    match key {
        Yaml::String(s) => s,
        Yaml::Null => "null".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Tagged(tagged) => key_string(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_to_json_preserving_order() {
        let value = parse("b: 1\na: [true, null, 1.5]\n200: ok\n").unwrap();
        assert_eq!(value, json!({"b": 1, "a": [true, null, 1.5], "200": "ok"}));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a", "200"]);
    }

    #[test]
    fn empty_document_is_null() {
        assert_eq!(parse("").unwrap(), Value::Null);
        assert_eq!(parse("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn applies_merge_keys() {
        let value = parse("base: &b {x: 1}\nchild:\n  <<: *b\n  y: 2\n").unwrap();
        assert_eq!(value["child"], json!({"x": 1, "y": 2}));
    }

    #[test]
    fn special_floats_become_strings() {
        assert!(parse("v: .nan").unwrap()["v"].is_string());
        assert!(parse("v: -.inf").unwrap()["v"].is_string());
    }

    #[test]
    fn syntax_errors_carry_a_byte_offset() {
        let text = "openapi: 3.0.0\ninfo:\n  title: [unclosed\n";
        let err = parse(text).unwrap_err();
        let offset = err.offset.unwrap();
        assert!(offset >= text.find("[unclosed").unwrap());
        assert!(offset <= text.len());
        assert!(!err.message.is_empty());
    }
}
