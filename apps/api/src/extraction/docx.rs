//! DOCX résumé extraction.
//!
//! Reads `word/document.xml` from the package and returns the body's paragraphs
//! joined by `\n`, in document order. Only paragraphs that are direct children
//! of `w:body` count; table cells and text boxes are skipped.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::extraction::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let xml = read_document_part(bytes)?;
    let paragraphs = body_paragraphs(&xml)?;
    Ok(paragraphs.join("\n"))
}

fn read_document_part(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Docx(format!("{DOCUMENT_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(format!("{DOCUMENT_PART}: {e}")))?;
    Ok(xml)
}

/// Walks the WordprocessingML tree, tracking the element stack by local name.
fn body_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    // stack depth of the body paragraph currently being read
    let mut open_paragraph: Option<usize> = None;
    let mut current = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractError::Docx(format!("malformed XML: {e}")))?;

        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"p" && open_paragraph.is_none() && parent_is_body(&stack) {
                    open_paragraph = Some(stack.len());
                    current.clear();
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"p" if open_paragraph.is_none() && parent_is_body(&stack) => {
                        paragraphs.push(String::new());
                    }
                    b"tab" if in_run(&stack, open_paragraph) => current.push('\t'),
                    b"br" | b"cr" if in_run(&stack, open_paragraph) => current.push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if stack.last().map(Vec::as_slice) == Some(b"t".as_slice())
                    && reads_run_text(&stack, open_paragraph)
                {
                    let text = t
                        .unescape()
                        .map_err(|e| ExtractError::Docx(format!("malformed text: {e}")))?;
                    current.push_str(&text);
                }
            }
            Event::CData(t) => {
                if stack.last().map(Vec::as_slice) == Some(b"t".as_slice())
                    && reads_run_text(&stack, open_paragraph)
                {
                    current.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(_) => {
                stack.pop();
                if open_paragraph == Some(stack.len()) {
                    paragraphs.push(std::mem::take(&mut current));
                    open_paragraph = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Run content only; `w:tab` under `w:pPr/w:tabs` is a tab-stop definition.
fn in_run(stack: &[Vec<u8>], open_paragraph: Option<usize>) -> bool {
    stack.last().map(Vec::as_slice) == Some(b"r".as_slice())
        && reads_run_text(stack, open_paragraph)
}

fn parent_is_body(stack: &[Vec<u8>]) -> bool {
    stack.last().map(Vec::as_slice) == Some(b"body".as_slice())
}

/// True when the innermost `w:p` on the stack is the open body paragraph,
/// so text from nested text-box paragraphs is not attributed to it.
fn reads_run_text(stack: &[Vec<u8>], open_paragraph: Option<usize>) -> bool {
    let Some(depth) = open_paragraph else {
        return false;
    };
    stack
        .iter()
        .rposition(|name| name == b"p")
        .is_some_and(|innermost| innermost == depth)
}
