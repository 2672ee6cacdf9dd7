//! The JSONPath subset accepted by `given`.
//!
//! Supported selectors: `$`, `.key`, `.*`, `[*]`, `[n]`, `['key']`,
//! `["key"]` and unions such as `['get','put']`.

use oasgate_core::PathSegment;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Key(String),
    Keys(Vec<String>),
    Index(usize),
    Wildcard,
}

/// A parsed `given` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    source: String,
    selectors: Vec<Selector>,
}

/// A node selected by a path, with its location in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Selected<'v> {
    pub path: Vec<PathSegment>,
    pub value: &'v Value,
}

impl JsonPath {
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut rest = source
            .trim()
            .strip_prefix('$')
            .ok_or_else(|| "path must start with '$'".to_string())?;
        let mut selectors = Vec::new();

        while !rest.is_empty() {
            if rest.starts_with("..") {
                return Err("recursive descent '..' is not supported".into());
            } else if let Some(after) = rest.strip_prefix('.') {
                let end = after.find(['.', '[']).unwrap_or(after.len());
                let name = &after[..end];
                if name.is_empty() {
                    return Err("empty member name".into());
                }
                selectors.push(if name == "*" {
                    Selector::Wildcard
                } else {
                    Selector::Key(name.to_string())
                });
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('[') {
                let (inner, tail) = split_bracket(after)?;
                selectors.push(parse_bracket(inner)?);
                rest = tail;
            } else {
                return Err(format!("unexpected input at '{}'", rest));
            }
        }

        Ok(Self {
            source: source.trim().to_string(),
            selectors,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Nodes matched in `root`, in document order.
    pub fn select<'v>(&self, root: &'v Value) -> Vec<Selected<'v>> {
        let mut current = vec![Selected {
            path: Vec::new(),
            value: root,
        }];

        for selector in &self.selectors {
            let mut next = Vec::new();
            for node in current {
                match (selector, node.value) {
                    (Selector::Key(key), Value::Object(map)) => {
                        if let Some(value) = map.get(key) {
                            next.push(node.child(key.as_str().into(), value));
                        }
                    }
                    (Selector::Keys(keys), Value::Object(map)) => {
                        // Document order, not union order.
                        for (key, value) in map {
                            if keys.iter().any(|k| k == key) {
                                next.push(node.child(key.as_str().into(), value));
                            }
                        }
                    }
                    (Selector::Index(i), Value::Array(items)) => {
                        if let Some(value) = items.get(*i) {
                            next.push(node.child((*i).into(), value));
                        }
                    }
                    (Selector::Wildcard, Value::Object(map)) => {
                        for (key, value) in map {
                            next.push(node.child(key.as_str().into(), value));
                        }
                    }
                    (Selector::Wildcard, Value::Array(items)) => {
                        for (i, value) in items.iter().enumerate() {
                            next.push(node.child(i.into(), value));
                        }
                    }
                    _ => {}
                }
            }
            current = next;
        }

        current
    }
}

impl<'v> Selected<'v> {
    fn child(&self, segment: PathSegment, value: &'v Value) -> Selected<'v> {
        let mut path = self.path.clone();
        path.push(segment);
        Selected { path, value }
    }
}

/// Split `inner]rest` at the closing bracket, honouring quotes.
fn split_bracket(input: &str) -> Result<(&str, &str), String> {
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Ok((&input[..i], &input[i + 1..])),
            (None, _) => {}
        }
    }
    Err("unterminated '['".into())
}

fn parse_bracket(inner: &str) -> Result<Selector, String> {
    let inner = inner.trim();
    if inner == "*" {
        return Ok(Selector::Wildcard);
    }
    if let Ok(i) = inner.parse::<usize>() {
        return Ok(Selector::Index(i));
    }

    let mut keys = Vec::new();
    for part in split_union(inner) {
        let part = part.trim();
        let unquoted = part
            .strip_prefix('\'')
            .and_then(|p| p.strip_suffix('\''))
            .or_else(|| part.strip_prefix('"').and_then(|p| p.strip_suffix('"')))
            .ok_or_else(|| format!("expected a quoted key, '*' or an index, got '{}'", part))?;
        keys.push(unquoted.to_string());
    }

    match keys.len() {
        0 => Err("empty brackets".into()),
        1 => Ok(Selector::Key(keys.remove(0))),
        _ => Ok(Selector::Keys(keys)),
    }
}

/// Split on commas outside quotes.
fn split_union(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ',') => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            (None, _) => {}
        }
    }
    if !input.is_empty() {
        parts.push(&input[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(expr: &str, root: &Value) -> Vec<Vec<PathSegment>> {
        JsonPath::parse(expr)
            .unwrap()
            .select(root)
            .into_iter()
            .map(|s| s.path)
            .collect()
    }

    fn doc() -> Value {
        json!({
            "info": {"title": "Pets", "contact": {"name": "Ops"}},
            "servers": [{"url": "https://a"}, {"url": "http://b"}],
            "paths": {
                "/pets": {"get": {"operationId": "list"}, "post": {}, "parameters": []},
                "/pets/{id}": {"get": {}}
            }
        })
    }

    #[test]
    fn root() {
        assert_eq!(paths("$", &doc()), vec![Vec::<PathSegment>::new()]);
    }

    #[test]
    fn dotted_members() {
        assert_eq!(
            paths("$.info.contact", &doc()),
            vec![vec![PathSegment::from("info"), PathSegment::from("contact")]]
        );
        assert!(paths("$.info.missing", &doc()).is_empty());
    }

    #[test]
    fn wildcards_follow_document_order() {
        let selected = paths("$.paths[*][*]", &doc());
        let rendered: Vec<String> = selected
            .iter()
            .map(|p| p.iter().map(ToString::to_string).collect::<Vec<_>>().join("."))
            .collect();
        assert_eq!(
            rendered,
            [
                "paths./pets.get",
                "paths./pets.post",
                "paths./pets.parameters",
                "paths./pets/{id}.get"
            ]
        );
    }

    #[test]
    fn array_wildcard_and_index() {
        let expected: Vec<Vec<PathSegment>> = vec![
            vec!["servers".into(), PathSegment::Index(0), "url".into()],
            vec!["servers".into(), PathSegment::Index(1), "url".into()],
        ];
        assert_eq!(paths("$.servers[*].url", &doc()), expected);
        assert_eq!(
            paths("$.servers[1]", &doc()),
            vec![vec![PathSegment::from("servers"), PathSegment::Index(1)]]
        );
    }

    #[test]
    fn quoted_keys_and_unions() {
        assert_eq!(
            paths("$.paths['/pets/{id}'].get", &doc()).len(),
            1
        );
        assert_eq!(
            paths("$.paths[*]['get','post']", &doc()).len(),
            3
        );
        assert_eq!(paths("$.paths[\"/pets\"]", &doc()).len(), 1);
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(JsonPath::parse("info.title").is_err());
        assert!(JsonPath::parse("$..title").is_err());
        assert!(JsonPath::parse("$.paths[").is_err());
        assert!(JsonPath::parse("$.paths[get]").is_err());
        assert!(JsonPath::parse("$.").is_err());
    }
}
