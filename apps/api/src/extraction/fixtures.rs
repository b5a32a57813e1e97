//! Résumé files built in memory for tests.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

/// Wraps WordprocessingML body content in a minimal DOCX package.
pub fn docx_from_body(body: &str) -> Vec<u8> {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("[Content_Types].xml", FileOptions::default())
        .unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer
        .start_file("word/document.xml", FileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

/// A DOCX whose body holds one paragraph per line.
pub fn docx_with_paragraphs(lines: &[&str]) -> Vec<u8> {
    let body: String = lines.iter().map(|l| paragraph(l)).collect();
    docx_from_body(&body)
}
