//! Analysis pipeline: validate → extract → transcribe → build prompt → call model → segment.
//!
//! Strictly sequential. Every stage returns a typed `Result`; a model failure
//! short-circuits to an error and is never handed to the segmenter.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::analysis::prompt_builder::AnalysisRequest;
use crate::analysis::segmenter::{AnalysisSections, SectionParser};
use crate::analysis::transcribe::transcribe_job_image;
use crate::errors::AppError;
use crate::extraction::{extract_text, CandidateDocument};
use crate::llm_client::{ImagePayload, ModelGateway};

pub const MISSING_RESUME_MESSAGE: &str = "Please upload a résumé (PDF or Word document).";
pub const MISSING_JOB_MESSAGE: &str =
    "Please provide the job posting as text or as an image (PNG or JPEG).";

/// The job posting, normalized to one of its two accepted forms.
#[derive(Debug, Clone)]
pub enum JobPosting {
    Text(String),
    Image(ImagePayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Text,
    Image,
}

impl JobPosting {
    pub fn source(&self) -> JobSource {
        match self {
            JobPosting::Text(_) => JobSource::Text,
            JobPosting::Image(_) => JobSource::Image,
        }
    }
}

/// Everything one form submission carries. Any part may be missing.
#[derive(Debug, Default)]
pub struct AnalysisInput {
    pub resume: Option<CandidateDocument>,
    pub job_text: Option<String>,
    pub job_image: Option<ImagePayload>,
}

impl AnalysisInput {
    /// Non-blank text wins over an image; blank text counts as absent.
    fn take_job_posting(&mut self) -> Option<JobPosting> {
        match self.job_text.take().filter(|t| !t.trim().is_empty()) {
            Some(text) => Some(JobPosting::Text(text)),
            None => self.job_image.take().map(JobPosting::Image),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub sections: AnalysisSections,
    pub job_source: JobSource,
    pub resume_chars: usize,
    pub model: String,
}

pub async fn run_analysis(
    gateway: &dyn ModelGateway,
    parser: &dyn SectionParser,
    mut input: AnalysisInput,
    cancel: &CancellationToken,
) -> Result<AnalysisOutcome, AppError> {
    let resume = input
        .resume
        .take()
        .ok_or_else(|| AppError::Validation(MISSING_RESUME_MESSAGE.to_string()))?;
    let job = input
        .take_job_posting()
        .ok_or_else(|| AppError::Validation(MISSING_JOB_MESSAGE.to_string()))?;
    let job_source = job.source();

    let kind = resume.kind;
    let resume_text = extract_text(resume).await?;
    let resume_chars = resume_text.chars().count();
    info!("Extracted {resume_chars} chars from {kind:?} résumé");

    let job_text = match job {
        JobPosting::Text(text) => text,
        JobPosting::Image(image) => transcribe_job_image(gateway, &image, cancel).await?,
    };

    let request = AnalysisRequest::build(&resume_text, &job_text, parser);
    let raw = gateway.generate(request.prompt(), None, cancel).await?;

    let sections = parser.parse(&raw);
    if !sections.is_segmented() {
        warn!(
            "Model reply did not follow the section format ({} chars); showing it whole",
            raw.len()
        );
    }

    Ok(AnalysisOutcome {
        sections,
        job_source,
        resume_chars,
        model: gateway.model_id().to_string(),
    })
}
