// Résumé text extraction.
// Parsing is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod docx;
pub mod pdf;

#[cfg(test)]
pub mod fixtures;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read Word document: {0}")]
    Docx(String),

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The two résumé formats the form accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolves the kind from the declared MIME type, then the file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        match content_type.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some(PDF_MIME) => return Some(DocumentKind::Pdf),
            Some(DOCX_MIME) => return Some(DocumentKind::Docx),
            _ => {}
        }

        let extension = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }
}

/// An uploaded résumé. Lives for one request and is dropped once its text is extracted.
#[derive(Debug, Clone)]
pub struct CandidateDocument {
    pub bytes: Bytes,
    pub kind: DocumentKind,
}

impl CandidateDocument {
    pub fn new(bytes: Bytes, kind: DocumentKind) -> Self {
        Self { bytes, kind }
    }
}

/// Extracts plain text from a résumé without blocking the async runtime.
pub async fn extract_text(document: CandidateDocument) -> Result<String, ExtractError> {
    let CandidateDocument { bytes, kind } = document;
    tokio::task::spawn_blocking(move || match kind {
        DocumentKind::Pdf => pdf::extract_pdf_text(&bytes),
        DocumentKind::Docx => docx::extract_docx_text(&bytes),
    })
    .await?
}
