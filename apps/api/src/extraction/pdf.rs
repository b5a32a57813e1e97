//! PDF résumé extraction.
//!
//! Text is pulled page by page with `lopdf`. A page that cannot be decoded
//! contributes an empty string; only a document that cannot be loaded at all
//! is an error. When every page comes back blank the whole file is retried
//! through `pdf-extract`, which copes with some font encodings `lopdf` does not.

use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::Document;
use tracing::{debug, warn};

use crate::extraction::ExtractError;

/// Extracts each page's text in page order.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let pages = doc
        .get_pages()
        .into_keys()
        .map(|page_num| {
            doc.extract_text(&[page_num]).unwrap_or_else(|e| {
                debug!("PDF page {page_num} has no extractable text: {e}");
                String::new()
            })
        })
        .collect();

    Ok(pages)
}

/// Extracts a PDF's text as the concatenation of its pages.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = extract_pdf_pages(bytes)?;
    Ok(join_pages(pages, || fallback_extract(bytes)))
}

/// Concatenates pages with no separator. Only when every page is blank is the
/// fallback consulted, and its text is used only if it found any.
fn join_pages(pages: Vec<String>, fallback: impl FnOnce() -> Option<String>) -> String {
    let text = pages.concat();
    if pages.is_empty() || !text.trim().is_empty() {
        return text;
    }

    match fallback() {
        Some(recovered) => {
            debug!(
                "Using pdf-extract fallback ({} chars) for {} blank page(s)",
                recovered.len(),
                pages.len()
            );
            recovered
        }
        None => text,
    }
}

fn fallback_extract(bytes: &[u8]) -> Option<String> {
    // pdf-extract panics on some malformed font programs
    let outcome = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));
    match outcome {
        Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            warn!("pdf-extract fallback failed: {e}");
            None
        }
        Err(_) => {
            warn!("pdf-extract fallback panicked");
            None
        }
    }
}
