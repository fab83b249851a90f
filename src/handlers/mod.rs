use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{CareerForm, CareerRequest, ContactRequest, FieldError, SubmissionResponse},
    service::{RelayError, RelayService},
    upload::{StagedFile, StagingDir, StagingError},
};

#[derive(OpenApi)]
#[openapi(
    paths(submit_contact, submit_career, health_check),
    components(schemas(
        ContactRequest,
        CareerForm,
        CareerRequest,
        SubmissionResponse,
        FieldError
    )),
    tags(
        (name = "forms", description = "Website form submissions relayed by email")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    post,
    path = "/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Inquiry relayed", body = SubmissionResponse),
        (status = 400, description = "Invalid submission", body = SubmissionResponse),
        (status = 500, description = "Email delivery failed", body = SubmissionResponse)
    ),
    tag = "forms"
)]
#[debug_handler]
pub async fn submit_contact(
    State(service): State<Arc<RelayService>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response("contact", &rejection),
    };

    match service.submit_contact(request).await {
        Ok(()) => (StatusCode::OK, Json(SubmissionResponse::ok())).into_response(),
        Err(e) => relay_error_response("contact inquiry", e),
    }
}

#[utoipa::path(
    post,
    path = "/career",
    request_body(content(
        (CareerForm = "multipart/form-data"),
        (CareerRequest = "application/json")
    )),
    responses(
        (status = 200, description = "Application relayed", body = SubmissionResponse),
        (status = 400, description = "Invalid submission", body = SubmissionResponse),
        (status = 413, description = "Upload too large", body = SubmissionResponse),
        (status = 500, description = "Email delivery failed", body = SubmissionResponse)
    ),
    tag = "forms"
)]
#[debug_handler]
pub async fn submit_career(
    State(service): State<Arc<RelayService>>,
    request: Request,
) -> Response {
    // JSON applications carry no résumé
    if is_json(request.headers()) {
        let request = match Json::<CareerRequest>::from_request(request, &()).await {
            Ok(Json(request)) => request,
            Err(rejection) => return json_rejection_response("career", &rejection),
        };
        return match service.submit_career(request, None).await {
            Ok(()) => (StatusCode::OK, Json(SubmissionResponse::ok())).into_response(),
            Err(e) => relay_error_response("career application", e),
        };
    }

    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::warn!("Rejected career payload: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(SubmissionResponse::failed(rejection.body_text())),
            )
                .into_response();
        }
    };

    let (request, resume) = match read_career_form(service.staging(), &mut multipart).await {
        Ok(form) => form,
        Err(e) => return staging_error_response(e),
    };

    match service.submit_career(request, resume).await {
        Ok(()) => (StatusCode::OK, Json(SubmissionResponse::ok())).into_response(),
        Err(e) => relay_error_response("career application", e),
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up")
    ),
    tag = "forms"
)]
#[debug_handler]
pub async fn health_check() -> Response {
    (StatusCode::OK, "Hello from form relay!").into_response()
}

/// Reads the career form, streaming the résumé into the staging directory as
/// it arrives. An already staged résumé is removed if a later field fails.
async fn read_career_form(
    staging: &StagingDir,
    multipart: &mut Multipart,
) -> Result<(CareerRequest, Option<StagedFile>), StagingError> {
    let mut request = CareerRequest::default();
    let mut resume: Option<StagedFile> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "resume" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            // Browsers send an empty part when no file was chosen
            if file_name.is_empty() {
                continue;
            }
            if resume.is_some() {
                tracing::warn!("Ignoring additional resume file '{}'", file_name);
                continue;
            }
            resume = Some(staging.stage(&file_name, field).await?);
        } else {
            let value = field.text().await?;
            if !request.set_field(&name, value) {
                tracing::debug!("Ignoring unknown career form field '{}'", name);
            }
        }
    }

    Ok((request, resume))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json"
                || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
}

fn json_rejection_response(kind: &str, rejection: &JsonRejection) -> Response {
    tracing::warn!("Rejected {kind} payload: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(SubmissionResponse::failed(rejection.body_text())),
    )
        .into_response()
}

fn relay_error_response(kind: &str, error: RelayError) -> Response {
    match error {
        RelayError::InvalidInput(errors) => {
            tracing::warn!("Rejected {kind}: {errors}");
            (
                StatusCode::BAD_REQUEST,
                Json(SubmissionResponse::invalid(
                    errors.to_string(),
                    errors.into_fields(),
                )),
            )
                .into_response()
        }
        e => {
            tracing::error!("Failed to relay {kind}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmissionResponse::failed(e.to_string())),
            )
                .into_response()
        }
    }
}

fn staging_error_response(error: StagingError) -> Response {
    match error {
        StagingError::Multipart(e) => {
            tracing::warn!("Failed to read career form: {}", e.body_text());
            (e.status(), Json(SubmissionResponse::failed(e.body_text()))).into_response()
        }
        e @ StagingError::Io(_) => {
            tracing::error!("Failed to stage resume upload: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmissionResponse::failed(e.to_string())),
            )
                .into_response()
        }
    }
}
