//! Document format detection.

use std::fmt;

use serde_json::Value;

/// Formats the engine can evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocFormat {
    Oas2,
    Oas3_0,
    Oas3_1,
}

impl DocFormat {
    pub const ALL: [DocFormat; 3] = [DocFormat::Oas2, DocFormat::Oas3_0, DocFormat::Oas3_1];

    /// Detect the format from the document root.
    pub fn detect(root: &Value) -> Option<Self> {
        let obj = root.as_object()?;

        if let Some(swagger) = obj.get("swagger") {
            let is_v2 = match swagger {
                Value::String(s) => s == "2.0",
                Value::Number(n) => n.as_f64() == Some(2.0),
                _ => false,
            };
            return is_v2.then_some(DocFormat::Oas2);
        }

        let version = obj.get("openapi")?.as_str()?;
        if is_minor(version, "3.0") {
            Some(DocFormat::Oas3_0)
        } else if is_minor(version, "3.1") {
            Some(DocFormat::Oas3_1)
        } else {
            None
        }
    }

    pub fn is_oas3(self) -> bool {
        matches!(self, DocFormat::Oas3_0 | DocFormat::Oas3_1)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DocFormat::Oas2 => "OpenAPI 2.0 (Swagger)",
            DocFormat::Oas3_0 => "OpenAPI 3.0.x",
            DocFormat::Oas3_1 => "OpenAPI 3.1.x",
        }
    }
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// `3.0`, `3.0.3`, `3.0.3-rc1` all match minor `3.0`.
fn is_minor(version: &str, minor: &str) -> bool {
    match version.strip_prefix(minor) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with('-'),
        None => false,
    }
}

/// A ruleset `formats` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFilter {
    Oas2,
    Oas3,
    Oas3_0,
    Oas3_1,
}

impl FormatFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "oas2" => Some(Self::Oas2),
            "oas3" => Some(Self::Oas3),
            "oas3.0" | "oas3_0" => Some(Self::Oas3_0),
            "oas3.1" | "oas3_1" => Some(Self::Oas3_1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormatFilter::Oas2 => "oas2",
            FormatFilter::Oas3 => "oas3",
            FormatFilter::Oas3_0 => "oas3.0",
            FormatFilter::Oas3_1 => "oas3.1",
        }
    }

    pub fn matches(self, format: DocFormat) -> bool {
        match self {
            FormatFilter::Oas2 => format == DocFormat::Oas2,
            FormatFilter::Oas3 => format.is_oas3(),
            FormatFilter::Oas3_0 => format == DocFormat::Oas3_0,
            FormatFilter::Oas3_1 => format == DocFormat::Oas3_1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_openapi_versions() {
        assert_eq!(
            DocFormat::detect(&json!({"openapi": "3.0.3"})),
            Some(DocFormat::Oas3_0)
        );
        assert_eq!(
            DocFormat::detect(&json!({"openapi": "3.1.0"})),
            Some(DocFormat::Oas3_1)
        );
        assert_eq!(
            DocFormat::detect(&json!({"openapi": "3.0"})),
            Some(DocFormat::Oas3_0)
        );
        assert_eq!(
            DocFormat::detect(&json!({"swagger": "2.0"})),
            Some(DocFormat::Oas2)
        );
        assert_eq!(
            DocFormat::detect(&json!({"swagger": 2.0})),
            Some(DocFormat::Oas2)
        );
    }

    #[test]
    fn rejects_unknown_documents() {
        assert_eq!(DocFormat::detect(&json!({"openapi": "4.0.0"})), None);
        assert_eq!(DocFormat::detect(&json!({"openapi": "3.10.0"})), None);
        assert_eq!(DocFormat::detect(&json!({"openapi": 3.0})), None);
        assert_eq!(DocFormat::detect(&json!({"asyncapi": "3.0.0"})), None);
        assert_eq!(DocFormat::detect(&json!({"swagger": "1.2"})), None);
        assert_eq!(DocFormat::detect(&json!(["openapi"])), None);
        assert_eq!(DocFormat::detect(&Value::Null), None);
    }

    #[test]
    fn filters() {
        let oas3 = FormatFilter::parse("oas3").unwrap();
        assert!(oas3.matches(DocFormat::Oas3_0));
        assert!(oas3.matches(DocFormat::Oas3_1));
        assert!(!oas3.matches(DocFormat::Oas2));
        assert!(FormatFilter::parse("oas3.1")
            .unwrap()
            .matches(DocFormat::Oas3_1));
        assert_eq!(FormatFilter::parse("asyncapi2"), None);
    }
}
