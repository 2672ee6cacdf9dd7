//! Document loader: decodes uploaded bytes into addressable text.

use crate::error::ParseError;
use crate::finding::Position;

/// Declared content type of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
}

impl DocumentFormat {
    pub fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "application/yaml",
        }
    }
}

/// An uploaded document. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    format: DocumentFormat,
    text: String,
    /// Byte offset at which each line starts.
    line_starts: Vec<usize>,
}

impl Document {
    /// Decode `bytes` as UTF-8. A leading byte order mark is dropped.
    pub fn load(
        bytes: &[u8],
        name: impl Into<String>,
        format: DocumentFormat,
    ) -> Result<Self, ParseError> {
        if u32::try_from(bytes.len()).is_err() {
            return Err(ParseError::TooLarge { size: bytes.len() });
        }
        let text = std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidEncoding {
            offset: e.valid_up_to(),
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text).to_string();
        Ok(Self::from_text(name, format, text))
    }

    fn from_text(name: impl Into<String>, format: DocumentFormat, text: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            format,
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line `n` without its terminator.
    pub fn line(&self, n: usize) -> Option<&str> {
        let start = *self.line_starts.get(n)?;
        let end = self
            .line_starts
            .get(n + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches('\r'))
    }

    /// Lines of the document, without terminators.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        (0..self.line_count()).filter_map(move |n| self.line(n))
    }

    /// Position of a byte offset. Offsets past the end clamp to the end of
    /// the document; an offset inside a multi-byte character resolves to
    /// the position just after that character.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let character = self.text[start..]
            .char_indices()
            .take_while(|(i, _)| start + i < offset)
            .count();
        Position::new(line as u32, character as u32)
    }

    /// Position just past the last character of line `n`.
    pub fn end_of_line(&self, n: usize) -> Position {
        let chars = self.line(n).map(|l| l.chars().count()).unwrap_or(0);
        Position::new(n as u32, chars as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::load(text.as_bytes(), "test.yaml", DocumentFormat::Yaml).unwrap()
    }

    #[test]
    fn load_valid_utf8() {
        let d = doc("openapi: 3.0.3\ninfo:\n  title: Pets\n");
        assert_eq!(d.name(), "test.yaml");
        assert_eq!(d.format(), DocumentFormat::Yaml);
        assert_eq!(d.line_count(), 4);
        assert_eq!(d.line(2), Some("  title: Pets"));
        assert_eq!(d.line(3), Some(""));
        assert_eq!(d.line(4), None);
    }

    #[test]
    fn load_rejects_invalid_utf8() {
        let err = Document::load(b"openapi: \xff\xfe", "bad.yaml", DocumentFormat::Yaml)
            .unwrap_err();
        assert_eq!(err, ParseError::InvalidEncoding { offset: 9 });
    }

    #[test]
    fn load_strips_bom() {
        let d = Document::load(
            "\u{feff}openapi: 3.1.0".as_bytes(),
            "bom.yaml",
            DocumentFormat::Yaml,
        )
        .unwrap();
        assert_eq!(d.text(), "openapi: 3.1.0");
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let d = doc("a: 1\r\nb: 2\r\n");
        assert_eq!(d.line(0), Some("a: 1"));
        assert_eq!(d.line(1), Some("b: 2"));
    }

    #[test]
    fn position_at_offsets() {
        let d = doc("ab\ncdé\nf");
        assert_eq!(d.position_at(0), Position::new(0, 0));
        assert_eq!(d.position_at(2), Position::new(0, 2));
        assert_eq!(d.position_at(3), Position::new(1, 0));
        // 'é' is two bytes; the offset after it is character 3.
        assert_eq!(d.position_at(7), Position::new(1, 3));
        // Inside 'é': resolves past it.
        assert_eq!(d.position_at(6), Position::new(1, 3));
        assert_eq!(d.position_at(8), Position::new(2, 0));
        assert_eq!(d.position_at(1000), Position::new(2, 1));
    }

    #[test]
    fn end_of_line_counts_characters() {
        let d = doc("title: Café\n");
        assert_eq!(d.end_of_line(0), Position::new(0, 11));
        assert_eq!(d.end_of_line(7), Position::new(7, 0));
    }
}
