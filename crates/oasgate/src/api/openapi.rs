//! OpenAPI document validation and publication endpoints.

use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use oasgate_core::{GateError, GateOutcome, Severity, Upload, ValidationResult};
use oasgate_telemetry::{log_upload_rejected, MetricsRegistry};

use super::router::AppState;
use super::upload::{self, UploadRejection};
use crate::error::ProblemDetails;

/// Which endpoint a gate run serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Validate,
    Publish,
}

impl Endpoint {
    fn as_str(self) -> &'static str {
        match self {
            Endpoint::Validate => "validate",
            Endpoint::Publish => "publish",
        }
    }

    fn path(self) -> &'static str {
        match self {
            Endpoint::Validate => "/v1/openapi/validate",
            Endpoint::Publish => "/v1/openapi/publish",
        }
    }
}

/// POST /v1/openapi/validate
///
/// 200 with the findings when the document passes the error gate, 400 with
/// the same array shape when it does not.
pub async fn validate_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ProblemDetails> {
    let upload = accept(&state, Endpoint::Validate, multipart).await?;

    match run_gate(&state, Endpoint::Validate, upload).await? {
        GateOutcome::Rejected(result) => Ok(findings(StatusCode::BAD_REQUEST, result)),
        GateOutcome::Validated(result) | GateOutcome::Published { result, .. } => {
            Ok(findings(StatusCode::OK, result))
        }
    }
}

/// POST /v1/openapi/publish
///
/// 400 with the findings when the document fails the error gate; 201 with a
/// plain-text confirmation once the catalog has taken it.
pub async fn publish_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ProblemDetails> {
    let upload = accept(&state, Endpoint::Publish, multipart).await?;

    match run_gate(&state, Endpoint::Publish, upload).await? {
        GateOutcome::Rejected(result) => Ok(findings(StatusCode::BAD_REQUEST, result)),
        GateOutcome::Published { receipt, .. } => Ok((
            StatusCode::CREATED,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            receipt.message,
        )
            .into_response()),
        GateOutcome::Validated(_) => {
            tracing::error!("publish gate stopped at validated");
            Err(ProblemDetails::internal_error().with_instance(Endpoint::Publish.path()))
        }
    }
}

fn findings(status: StatusCode, result: ValidationResult) -> Response {
    (status, Json(result.into_findings())).into_response()
}

async fn accept(
    state: &AppState,
    endpoint: Endpoint,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Upload, ProblemDetails> {
    let received = match multipart {
        Ok(multipart) => upload::receive(multipart, state.limits).await,
        Err(rejection) => Err(UploadRejection::from(rejection)),
    };

    received.map_err(|rejection| {
        log_upload_rejected!(
            endpoint = endpoint.as_str(),
            reason = rejection.reason(),
            detail = %rejection
        );
        state.metrics.record_upload_rejection(rejection.reason());
        ProblemDetails::from(rejection).with_instance(endpoint.path())
    })
}

/// Run the gate on the blocking pool; the engine is CPU-bound.
async fn run_gate(
    state: &AppState,
    endpoint: Endpoint,
    upload: Upload,
) -> Result<GateOutcome, ProblemDetails> {
    let gate = state.gate.clone();
    let started = Instant::now();

    let outcome = tokio::task::spawn_blocking(move || match endpoint {
        Endpoint::Validate => gate.validate_only(&upload),
        Endpoint::Publish => gate.run(&upload),
    })
    .await
    .map_err(|e| {
        tracing::error!(endpoint = endpoint.as_str(), error = %e, "validation task failed");
        ProblemDetails::internal_error().with_instance(endpoint.path())
    })?;

    record(&state.metrics, endpoint, &outcome, started.elapsed().as_secs_f64());
    outcome.map_err(|e| ProblemDetails::from(e).with_instance(endpoint.path()))
}

fn record(
    metrics: &MetricsRegistry,
    endpoint: Endpoint,
    outcome: &Result<GateOutcome, GateError>,
    duration_secs: f64,
) {
    let label = match outcome {
        Ok(GateOutcome::Rejected(_)) => "failed",
        Ok(_) | Err(GateError::Publish(_)) => "passed",
        Err(GateError::Validate(_)) => "error",
    };
    metrics.record_validation(endpoint.as_str(), label, duration_secs);

    if let Ok(outcome) = outcome {
        let result = outcome.result();
        for severity in Severity::ALL {
            metrics.record_findings(
                &severity.label().to_ascii_lowercase(),
                result.count(severity) as u64,
            );
        }
    }

    match outcome {
        Ok(GateOutcome::Published { .. }) => metrics.record_publication("published"),
        Err(GateError::Publish(_)) => metrics.record_publication("failed"),
        _ => {}
    }
}
