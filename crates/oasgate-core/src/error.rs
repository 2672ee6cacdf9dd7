use thiserror::Error;

/// The uploaded bytes could not be turned into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The payload is not valid UTF-8.
    #[error("document is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidEncoding { offset: usize },

    /// The payload is larger than a `u32` line/character space can address.
    #[error("document of {size} bytes is too large to address")]
    TooLarge { size: usize },
}

/// A raw diagnostic could not be classified into a finding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    /// The engine reported a severity level outside the known table.
    #[error("diagnostic '{code}' has unknown severity level {level}")]
    UnknownSeverity { code: String, level: i64 },

    /// The diagnostic range ends before it starts.
    #[error("diagnostic '{code}' has a range that ends before it starts")]
    InvertedRange { code: String },
}

/// A validation run failed before findings could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),
}
