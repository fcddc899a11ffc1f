//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;
use super::types::{ErrorResponse, SubmitResponse, ValidateResponse};
use crate::io::sink::LogSink;
use crate::runner::{ReplayReport, replay};
use crate::script::SessionScript;
use crate::validate::{LineCandidate, validate_candidate};
use crate::wizard::{SubmitError, WizardSession};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Validates raw form input.
///
/// `POST /validate` → 200 + `ValidateResponse` JSON, valid or not
pub async fn post_validate(
    State(state): State<Arc<AppState>>,
    Json(candidate): Json<LineCandidate>,
) -> Json<ValidateResponse> {
    let errors = validate_candidate(&candidate, &state.config.limits);
    Json(ValidateResponse {
        valid: errors.is_empty(),
        errors,
    })
}

/// Replays a session script.
///
/// `POST /replay` → 200 + `ReplayReport` JSON
/// `POST /replay` with an unknown preset → 400 + `ErrorResponse`
pub async fn post_replay(
    State(state): State<Arc<AppState>>,
    Json(script): Json<SessionScript>,
) -> Result<Json<ReplayReport>, ApiError> {
    let config = script
        .config_or(state.config.clone())
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::message(e.to_string()))))?;
    Ok(Json(replay(&script, &config).report()))
}

/// Submits raw form input.
///
/// The length rule is applied before validation, so a long line sent with
/// end feeding is accepted as linear.
///
/// `POST /submit` → 200 + `SubmitResponse` JSON
/// `POST /submit` with field errors → 422 + `ErrorResponse` with `errors`
pub async fn post_submit(
    State(state): State<Arc<AppState>>,
    Json(candidate): Json<LineCandidate>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let unprocessable = |errors| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "configuration is invalid".to_string(),
                errors: Some(errors),
            }),
        )
    };

    let line = candidate.to_configuration().map_err(unprocessable)?;
    let session = WizardSession::with_line(state.config.limits.clone(), line);
    match session.submit(&mut LogSink) {
        Ok(line) => Ok(Json(SubmitResponse {
            status: "accepted",
            line,
        })),
        Err(SubmitError::Invalid(errors)) => Err(unprocessable(errors)),
        Err(e @ SubmitError::Sink(_)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::message(e.to_string())),
        )),
    }
}
