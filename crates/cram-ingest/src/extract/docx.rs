//! DOCX text extraction.
//!
//! A .docx file is a zip archive; the document body lives in
//! `word/document.xml`. We walk the XML by hand rather than pulling in a
//! full parser: text lives inside `<w:t>` runs, and the only structure we
//! care about is paragraph, tab, and line-break markers.

use std::io::{Cursor, Read};
use tracing::debug;

/// Extract plain text from a DOCX byte buffer.
pub fn extract_text(bytes: &[u8]) -> Result<String, String> {
    let cursor = Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| format!("not a valid docx archive: {}", e))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing word/document.xml: {}", e))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("unreadable document.xml: {}", e))?;

    let text = document_xml_to_text(&xml);
    debug!("Extracted {} characters from docx body", text.len());
    Ok(text)
}

/// Walk document.xml, collecting run text and structural breaks.
fn document_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    let mut chars = xml.char_indices().peekable();
    let mut in_text_run = false;

    while let Some((idx, ch)) = chars.next() {
        if ch == '<' {
            let rest = &xml[idx..];
            let end = match rest.find('>') {
                Some(e) => e,
                None => break,
            };
            let tag = &rest[1..end];

            if tag == "w:t" || tag.starts_with("w:t ") {
                in_text_run = true;
            } else if tag == "/w:t" {
                in_text_run = false;
            } else if tag == "/w:p" {
                out.push_str("\n\n");
            } else if tag.trim_end_matches('/').trim_end() == "w:tab" {
                // Exact match only: attributed <w:tab w:val=…/> elements are
                // tab-stop definitions inside <w:tabs>, not body tabs.
                out.push('\t');
            } else if tag.starts_with("w:br") {
                out.push('\n');
            }

            // Skip past the tag body, including the closing '>'
            while let Some(&(i, _)) = chars.peek() {
                if i <= idx + end {
                    chars.next();
                } else {
                    break;
                }
            }
        } else if in_text_run {
            out.push(ch);
        }
    }

    unescape_xml(&out).trim().to_string()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            writer
                .start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(document_xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_extracts_paragraphs() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
            <w:p><w:r><w:t>Second</w:t></w:r><w:r><w:t> paragraph.</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_text(&build_docx(xml)).unwrap();
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let xml = r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b &amp; c</w:t><w:br/><w:t>d</w:t></w:r></w:p>"#;
        let text = extract_text(&build_docx(xml)).unwrap();
        assert_eq!(text, "a\tb & c\nd");
    }

    #[test]
    fn test_tab_stop_definitions_emit_no_tabs() {
        let xml = r#"<w:p>
            <w:pPr><w:tabs><w:tab w:val="left" w:pos="708"/><w:tab w:val="right" w:pos="9062"/></w:tabs></w:pPr>
            <w:r><w:t>No tabs here</w:t></w:r>
        </w:p>"#;
        let text = extract_text(&build_docx(xml)).unwrap();
        assert_eq!(text, "No tabs here");
    }

    #[test]
    fn test_preserved_space_attribute() {
        let xml = r#"<w:p><w:r><w:t xml:space="preserve"> spaced </w:t></w:r></w:p>"#;
        let text = extract_text(&build_docx(xml)).unwrap();
        assert_eq!(text, "spaced");
    }

    #[test]
    fn test_not_a_zip() {
        assert!(extract_text(b"plain bytes").is_err());
    }

    #[test]
    fn test_zip_without_document_xml() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            writer
                .start_file("other.txt", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"x").unwrap();
            writer.finish().unwrap();
        }
        let err = extract_text(&cursor.into_inner()).unwrap_err();
        assert!(err.contains("document.xml"));
    }
}
