//! Axum route handlers for the Analysis API.

use axum::extract::{multipart::Field, Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::pipeline::{run_analysis, AnalysisInput, JobSource, MISSING_RESUME_MESSAGE};
use crate::analysis::segmenter::Section;
use crate::errors::AppError;
use crate::extraction::{extract_text, CandidateDocument, DocumentKind};
use crate::llm_client::ImagePayload;
use crate::state::AppState;

pub const UNSUPPORTED_RESUME_MESSAGE: &str =
    "Unsupported résumé format. Please upload a PDF or Word (.docx) file.";
pub const UNSUPPORTED_IMAGE_MESSAGE: &str = "The job posting image must be a PNG or JPEG file.";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub model: String,
    pub segmented: bool,
    pub sections: Vec<Section>,
    pub job_source: JobSource,
    pub resume_chars: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub kind: DocumentKind,
    pub chars: usize,
    pub text: String,
}

/// A file part as uploaded, before its format is checked.
#[derive(Debug)]
struct UploadedFile {
    bytes: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

impl UploadedFile {
    fn into_document(self) -> Result<CandidateDocument, AppError> {
        let kind = DocumentKind::detect(self.content_type.as_deref(), self.file_name.as_deref())
            .ok_or_else(|| AppError::Validation(UNSUPPORTED_RESUME_MESSAGE.to_string()))?;
        Ok(CandidateDocument::new(self.bytes, kind))
    }
}

/// The multipart form: `resume` file, optional `job_text`, optional `job_image` file.
#[derive(Debug, Default)]
struct AnalysisForm {
    resume: Option<UploadedFile>,
    job_text: Option<String>,
    job_image: Option<Bytes>,
}

impl AnalysisForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = AnalysisForm::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed_upload)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "resume" => form.resume = read_file(field).await?,
                "job_text" => form.job_text = Some(field.text().await.map_err(malformed_upload)?),
                "job_image" => form.job_image = read_file(field).await?.map(|f| f.bytes),
                other => debug!("Ignoring unexpected form field '{other}'"),
            }
        }

        Ok(form)
    }

    fn into_input(self) -> Result<AnalysisInput, AppError> {
        let resume = self.resume.map(UploadedFile::into_document).transpose()?;
        let job_image = self
            .job_image
            .map(|bytes| {
                ImagePayload::from_bytes(bytes)
                    .ok_or_else(|| AppError::Validation(UNSUPPORTED_IMAGE_MESSAGE.to_string()))
            })
            .transpose()?;

        Ok(AnalysisInput {
            resume,
            job_text: self.job_text,
            job_image,
        })
    }
}

/// Browsers send an empty, unnamed part when no file was chosen; that counts as absent.
/// A named but empty file is kept so it fails extraction visibly.
async fn read_file(field: Field<'_>) -> Result<Option<UploadedFile>, AppError> {
    let content_type = field.content_type().map(str::to_string);
    let file_name = field
        .file_name()
        .map(str::to_string)
        .filter(|n| !n.is_empty());
    let bytes = field.bytes().await.map_err(malformed_upload)?;

    if bytes.is_empty() && file_name.is_none() {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        bytes,
        content_type,
        file_name,
    }))
}

fn malformed_upload(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }
    AppError::Validation(format!("Malformed upload: {}", e.body_text()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Full pipeline: extract résumé → (transcribe image) → prompt → model → segment.
/// The model call is cancelled if the client disconnects or the server shuts down.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let analysis_id = Uuid::new_v4();
    let input = AnalysisForm::read(multipart).await?.into_input()?;

    let cancel = state.shutdown.child_token();
    // Dropping the handler future (client gone) fires the guard.
    let guard = cancel.clone().drop_guard();

    info!("Analysis {analysis_id} started");
    let outcome = run_analysis(
        state.gateway.as_ref(),
        state.parser.as_ref(),
        input,
        &cancel,
    )
    .await;
    guard.disarm();
    let outcome = outcome?;

    info!(
        "Analysis {analysis_id} finished with {} section(s)",
        outcome.sections.bodies().len()
    );

    Ok(Json(AnalysisReport {
        analysis_id,
        model: outcome.model,
        segmented: outcome.sections.is_segmented(),
        sections: outcome.sections.into_panels(),
        job_source: outcome.job_source,
        resume_chars: outcome.resume_chars,
        generated_at: Utc::now(),
    }))
}

/// POST /api/v1/resumes/extract
///
/// Extracts the résumé alone so the form can confirm it was read before analysis.
pub async fn handle_extract_resume(multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    let document = AnalysisForm::read(multipart)
        .await?
        .resume
        .ok_or_else(|| AppError::Validation(MISSING_RESUME_MESSAGE.to_string()))?
        .into_document()?;

    let kind = document.kind;
    let text = extract_text(document).await?;

    Ok(Json(ExtractResponse {
        kind,
        chars: text.chars().count(),
        text,
    }))
}
