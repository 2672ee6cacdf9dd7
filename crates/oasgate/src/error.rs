//! RFC 9457 Problem Details error responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use oasgate_core::{GateError, ValidateError};
use serde::Serialize;

/// RFC 9457 Problem Details response.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    fn new(error_type: &str, title: &str, status: StatusCode, detail: Option<String>) -> Self {
        Self {
            error_type: error_type.into(),
            title: title.into(),
            status: status.as_u16(),
            detail,
            instance: None,
        }
    }

    /// 400: the upload was refused before validation.
    pub fn invalid_upload(detail: impl Into<String>) -> Self {
        Self::new(
            "urn:oasgate:error:invalid-upload",
            "Invalid Upload",
            StatusCode::BAD_REQUEST,
            Some(detail.into()),
        )
    }

    /// 422: the uploaded bytes are not a readable document.
    pub fn unreadable_document(detail: impl Into<String>) -> Self {
        Self::new(
            "urn:oasgate:error:unreadable-document",
            "Unreadable Document",
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(detail.into()),
        )
    }

    /// 422: the rule engine produced a diagnostic that cannot be classified.
    pub fn unclassifiable_finding(detail: impl Into<String>) -> Self {
        Self::new(
            "urn:oasgate:error:unclassifiable-finding",
            "Unclassifiable Finding",
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(detail.into()),
        )
    }

    /// 502: the document passed validation but the catalog did not take it.
    pub fn publish_failed(detail: impl Into<String>) -> Self {
        Self::new(
            "urn:oasgate:error:publish-failed",
            "Publish Failed",
            StatusCode::BAD_GATEWAY,
            Some(detail.into()),
        )
    }

    pub fn internal_error() -> Self {
        Self::new(
            "urn:oasgate:error:internal-error",
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
        )
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Json(&self).into_response();
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

impl From<ValidateError> for ProblemDetails {
    fn from(err: ValidateError) -> Self {
        match err {
            ValidateError::Parse(e) => Self::unreadable_document(e.to_string()),
            ValidateError::Classification(e) => Self::unclassifiable_finding(e.to_string()),
        }
    }
}

impl From<GateError> for ProblemDetails {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Validate(e) => e.into(),
            GateError::Publish(e) => Self::publish_failed(e.to_string()),
        }
    }
}
