//! Maps document paths back to source ranges.
//!
//! A lightweight scan of YAML block structure: every mapping key and every
//! sequence dash becomes a token at its column, and nesting follows
//! indentation. Flow collections and multi-line scalars are not descended
//! into; a path that cannot be followed resolves to its deepest located
//! ancestor.

use oasgate_core::{Document, PathSegment, Position, Range};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Key(String),
    Item,
}

#[derive(Debug, Clone)]
struct Token {
    kind: Kind,
    line: usize,
    column: usize,
    /// Character column just past the last non-blank character of the line.
    line_end: usize,
}

/// Token index of one document, built once per validation.
pub struct SourceMap {
    tokens: Vec<Token>,
}

impl SourceMap {
    pub fn new(document: &Document) -> Self {
        let mut tokens = Vec::new();
        // Column of the key that owns an open block scalar (`|` or `>`).
        let mut block_owner: Option<usize> = None;

        for (line, text) in document.lines().enumerate() {
            let trimmed = text.trim_start_matches(' ');
            let indent = text.len() - trimmed.len();

            if let Some(owner) = block_owner {
                if trimmed.trim().is_empty() || indent > owner {
                    continue;
                }
                block_owner = None;
            }

            if trimmed.trim().is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with("---")
                || trimmed.starts_with("...")
                || trimmed.starts_with('%')
            {
                continue;
            }

            let line_end = text.trim_end().chars().count();
            let mut column = indent;
            let mut rest = trimmed;

            loop {
                if rest == "-" || rest.starts_with("- ") {
                    tokens.push(Token {
                        kind: Kind::Item,
                        line,
                        column,
                        line_end,
                    });
                    let after = &rest[1..];
                    let content = after.trim_start_matches(' ');
                    column += 1 + (after.len() - content.len());
                    rest = content;
                    if rest.is_empty() {
                        break;
                    }
                    continue;
                }

                if let Some((key, value)) = split_key(rest) {
                    tokens.push(Token {
                        kind: Kind::Key(key),
                        line,
                        column: column_in_chars(text, column),
                        line_end,
                    });
                    if is_block_scalar(value) {
                        block_owner = Some(column);
                    }
                }
                break;
            }
        }

        Self { tokens }
    }

    /// Range of the deepest node along `path` that can be located.
    pub fn range_of(&self, path: &[PathSegment]) -> Range {
        let mut scope = 0..self.tokens.len();
        let mut found: Option<&Token> = None;

        for segment in path {
            let children = self.children(scope.clone());
            let next = match segment {
                PathSegment::Key(key) => children
                    .into_iter()
                    .find(|&i| matches!(&self.tokens[i].kind, Kind::Key(k) if k == key)),
                PathSegment::Index(n) => children
                    .into_iter()
                    .filter(|&i| self.tokens[i].kind == Kind::Item)
                    .nth(*n),
            };
            match next {
                Some(i) => {
                    found = Some(&self.tokens[i]);
                    scope = i + 1..self.subtree_end(i);
                }
                None => break,
            }
        }

        match found {
            Some(token) => Range::new(
                Position::new(token.line as u32, token.column as u32),
                Position::new(token.line as u32, token.line_end.max(token.column) as u32),
            ),
            None => Range::default(),
        }
    }

    /// Indices of the direct children within a token range.
    fn children(&self, scope: std::ops::Range<usize>) -> Vec<usize> {
        let Some(min) = self.tokens[scope.clone()].iter().map(|t| t.column).min() else {
            return Vec::new();
        };
        let mut children = Vec::new();
        let mut i = scope.start;
        while i < scope.end {
            if self.tokens[i].column == min {
                children.push(i);
                i = self.subtree_end(i).max(i + 1);
            } else {
                i += 1;
            }
        }
        children
    }

    /// One past the last token nested under token `i`.
    fn subtree_end(&self, i: usize) -> usize {
        let owner = &self.tokens[i];
        let is_key = matches!(owner.kind, Kind::Key(_));
        let mut j = i + 1;
        while j < self.tokens.len() {
            let t = &self.tokens[j];
            let nested = t.column > owner.column
                // A key's sequence may sit at the key's own indentation.
                || (is_key && t.column == owner.column && t.kind == Kind::Item);
            if !nested {
                break;
            }
            j += 1;
        }
        j
    }
}

/// Split `key: value` (or `key:`), honouring quoted keys.
fn split_key(rest: &str) -> Option<(String, &str)> {
    if rest.starts_with('{') || rest.starts_with('[') || rest.starts_with("? ") {
        return None;
    }

    if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let body = &rest[1..];
        let close = find_closing_quote(body, quote)?;
        let key = unquote(&body[..close], quote);
        let after = body[close + 1..].trim_start();
        let value = after.strip_prefix(':')?;
        return (value.is_empty() || value.starts_with(' ')).then(|| (key, value));
    }

    let key_end = rest
        .find(": ")
        .or_else(|| rest.strip_suffix(':').map(|k| k.len()))?;
    let key = rest[..key_end].trim_end();
    if key.is_empty() || key.contains(" #") {
        return None;
    }
    Some((key.to_string(), &rest[key_end + 1..]))
}

fn find_closing_quote(body: &str, quote: char) -> Option<usize> {
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if quote == '"' && c == '\\' {
            chars.next();
        } else if c == quote {
            // '' is an escaped single quote.
            if quote == '\'' && chars.peek().map(|(_, n)| *n) == Some('\'') {
                chars.next();
                continue;
            }
            return Some(i);
        }
    }
    None
}

fn unquote(inner: &str, quote: char) -> String {
    match quote {
        '\'' => inner.replace("''", "'"),
        _ => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
    }
}

fn is_block_scalar(value: &str) -> bool {
    let value = value.split(" #").next().unwrap_or("").trim();
    let mut chars = value.chars();
    matches!(chars.next(), Some('|' | '>'))
        && chars.all(|c| matches!(c, '+' | '-' | '1'..='9'))
}

/// Convert a byte column into a character column.
fn column_in_chars(line: &str, byte_column: usize) -> usize {
    line.get(..byte_column)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(byte_column)
}
