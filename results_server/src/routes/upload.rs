//! Multipart upload of a JUnit XML result file.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Response;

use super::{detail, AppState};
use crate::error::IngestError;
use crate::models::test_run::NewTestRun;
use crate::services::ingest_service;

/// Form fields of an upload request.
#[derive(Debug, Default)]
struct UploadForm {
    branch: Option<String>,
    revision: Option<String>,
    platform: Option<String>,
    bbnum: Option<String>,
    typ: Option<String>,
    info: Option<String>,
    file_name: Option<String>,
    file: Option<Vec<u8>>,
}

/// Rejected before ingestion, with the status and message to return.
#[derive(Debug)]
struct FormRejection(StatusCode, String);

impl FormRejection {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self(StatusCode::UNPROCESSABLE_ENTITY, message.into())
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, FormRejection> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FormRejection(e.status(), e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            form.file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| FormRejection(e.status(), e.body_text()))?;
            form.file = Some(bytes.to_vec());
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| FormRejection(e.status(), e.body_text()))?;
        let value = Some(value).filter(|v| !v.is_empty());
        match name.as_str() {
            "branch" => form.branch = value,
            "revision" => form.revision = value,
            "platform" => form.platform = value,
            "bbnum" => form.bbnum = value,
            "typ" => form.typ = value,
            "info" => form.info = value,
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Check required fields and split the form into run parameters and the file.
fn validate(form: UploadForm) -> Result<(NewTestRun, Vec<u8>), FormRejection> {
    let platform = form
        .platform
        .ok_or_else(|| FormRejection::unprocessable("Field required: platform"))?;
    let bbnum = form
        .bbnum
        .ok_or_else(|| FormRejection::unprocessable("Field required: bbnum"))?
        .trim()
        .parse::<i32>()
        .map_err(|_| FormRejection::unprocessable("Field bbnum must be an integer"))?;
    let typ = form
        .typ
        .ok_or_else(|| FormRejection::unprocessable("Field required: typ"))?;
    let file = form
        .file
        .ok_or_else(|| FormRejection::unprocessable("Field required: file"))?;

    let is_xml = form
        .file_name
        .as_deref()
        .is_some_and(|name| name.ends_with(".xml"));
    if !is_xml {
        return Err(FormRejection(
            StatusCode::BAD_REQUEST,
            "Only .xml files are supported".to_string(),
        ));
    }

    let run = NewTestRun {
        branch: form.branch,
        revision: form.revision,
        platform,
        bbnum,
        typ,
        info: form.info,
    };
    Ok((run, file))
}

pub async fn upload_test_results(State(state): State<AppState>, multipart: Multipart) -> Response {
    let started = Instant::now();

    let (run, file) = match read_form(multipart).await.and_then(validate) {
        Ok(parts) => parts,
        Err(FormRejection(status, message)) => {
            tracing::warn!(status = status.as_u16(), reason = %message, "Upload rejected");
            crate::metrics::upload_finished("rejected");
            return detail(status, message);
        }
    };

    let result = ingest_service::ingest(state.store.as_ref(), run, &file).await;
    crate::metrics::ingest_duration(started.elapsed().as_millis() as u64);

    match result {
        Ok(outcome) => {
            crate::metrics::upload_finished(outcome.label());
            detail(StatusCode::OK, outcome.detail())
        }
        Err(IngestError::InvalidInput(e)) => {
            crate::metrics::upload_finished("invalid_input");
            detail(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(IngestError::Storage(e)) => {
            crate::metrics::upload_finished("storage_error");
            detail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
