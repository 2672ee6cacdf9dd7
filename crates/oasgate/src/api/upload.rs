//! Upload boundary: turns a multipart request into an [`Upload`].
//!
//! Exactly one file part, named `file`, is accepted. Its size is checked
//! chunk by chunk while it streams in, so oversized files are refused
//! without being buffered.

use std::fmt;

use axum::extract::multipart::{Multipart, MultipartRejection};
use bytes::BytesMut;
use oasgate_core::Upload;

use crate::error::ProblemDetails;

/// Name of the multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// Default maximum document size in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100_000;

/// Allowance for multipart headers and boundaries on top of the file size.
const ENVELOPE_BYTES: usize = 16 * 1024;

/// Limits applied at the upload boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_upload_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadLimits {
    /// Cap for the whole request body.
    pub fn max_request_bytes(&self) -> usize {
        self.max_upload_bytes.saturating_add(ENVELOPE_BYTES)
    }
}

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    /// The body is not a readable multipart form.
    Malformed(String),
    /// No file part named `file`.
    MissingFile,
    /// A file part under another field name.
    UnexpectedField(String),
    /// More than one file part.
    MultipleFiles,
    /// The file is larger than the limit.
    TooLarge { limit: usize },
    /// Neither the filename nor the content type names YAML.
    UnsupportedType {
        filename: String,
        content_type: Option<String>,
    },
}

impl UploadRejection {
    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            UploadRejection::Malformed(_) => "malformed",
            UploadRejection::MissingFile => "missing_file",
            UploadRejection::UnexpectedField(_) => "unexpected_field",
            UploadRejection::MultipleFiles => "multiple_files",
            UploadRejection::TooLarge { .. } => "too_large",
            UploadRejection::UnsupportedType { .. } => "unsupported_type",
        }
    }
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadRejection::Malformed(reason) => write!(f, "Invalid multipart data: {}", reason),
            UploadRejection::MissingFile => write!(f, "Missing '{}' field", FILE_FIELD),
            UploadRejection::UnexpectedField(name) => {
                write!(f, "Unexpected file field '{}'; upload the document as '{}'", name, FILE_FIELD)
            }
            UploadRejection::MultipleFiles => f.write_str("Only one file may be uploaded"),
            UploadRejection::TooLarge { limit } => {
                write!(f, "File exceeds the maximum size of {} bytes", limit)
            }
            UploadRejection::UnsupportedType {
                filename,
                content_type,
            } => write!(
                f,
                "Only YAML files are accepted (filename '{}', content type '{}')",
                filename,
                content_type.as_deref().unwrap_or("none")
            ),
        }
    }
}

impl From<UploadRejection> for ProblemDetails {
    fn from(rejection: UploadRejection) -> Self {
        ProblemDetails::invalid_upload(rejection.to_string())
    }
}

impl From<MultipartRejection> for UploadRejection {
    fn from(rejection: MultipartRejection) -> Self {
        UploadRejection::Malformed(rejection.body_text())
    }
}

/// `true` when the filename or the media type ends in `yaml` or `yml`.
///
/// Content type parameters such as `charset` are ignored.
pub fn is_yaml(filename: &str, content_type: Option<&str>) -> bool {
    let yaml_suffix = |s: &str| {
        let s = s.trim().to_ascii_lowercase();
        s.ends_with("yaml") || s.ends_with("yml")
    };
    let media_type = |s: &str| s.split(';').next().is_some_and(yaml_suffix);
    yaml_suffix(filename) || content_type.is_some_and(media_type)
}

/// Read the single `file` part of a multipart form.
pub async fn receive(
    mut multipart: Multipart,
    limits: UploadLimits,
) -> Result<Upload, UploadRejection> {
    let mut upload: Option<Upload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadRejection::Malformed(e.body_text()))?
    {
        // Parts without a filename are plain form values.
        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };
        if upload.is_some() {
            return Err(UploadRejection::MultipleFiles);
        }
        let name = field.name().unwrap_or_default();
        if name != FILE_FIELD {
            return Err(UploadRejection::UnexpectedField(name.to_string()));
        }

        let content_type = field.content_type().map(String::from);
        if !is_yaml(&filename, content_type.as_deref()) {
            return Err(UploadRejection::UnsupportedType {
                filename,
                content_type,
            });
        }

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| UploadRejection::Malformed(e.body_text()))?
        {
            if buffer.len() + chunk.len() > limits.max_upload_bytes {
                return Err(UploadRejection::TooLarge {
                    limit: limits.max_upload_bytes,
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        upload = Some(Upload::new(filename, content_type, buffer.freeze()));
    }

    upload.ok_or(UploadRejection::MissingFile)
}
