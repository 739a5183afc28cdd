//! DOCX text extraction.
//!
//! A DOCX file is a zip archive; the document body lives in
//! `word/document.xml`. Text content sits inside `<w:t>` runs, paragraphs
//! end with `</w:p>`, and explicit tabs/breaks have their own empty
//! elements. That is all the structure needed for plain text extraction,
//! so this walks the XML directly instead of pulling in a full XML parser.

use std::io::{Cursor, Read};

use crate::ExtractError;

/// Extract text from a DOCX (or legacy-named .doc OOXML) document.
pub fn extract_from_docx(data: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| ExtractError::Docx(format!("not a valid archive: {}", e)))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(format!("missing word/document.xml: {}", e)))?
        .read_to_string(&mut document_xml)
        .map_err(|e| ExtractError::Docx(format!("unreadable document.xml: {}", e)))?;

    Ok(document_xml_to_text(&document_xml))
}

/// Walk `document.xml`, keeping text inside `<w:t>` runs and turning
/// paragraph ends, tabs, and breaks into whitespace.
fn document_xml_to_text(xml: &str) -> String {
    let mut text = String::new();
    let mut in_text_run = false;
    let mut pos = 0;

    while let Some(offset) = xml[pos..].find('<') {
        let tag_start = pos + offset;
        if in_text_run && tag_start > pos {
            decode_entities_into(&xml[pos..tag_start], &mut text);
        }

        let tag_end = match xml[tag_start..].find('>') {
            Some(e) => tag_start + e,
            None => break,
        };
        let tag = &xml[tag_start + 1..tag_end];

        if tag == "w:t" || tag.starts_with("w:t ") {
            in_text_run = !tag.ends_with('/');
        } else if tag == "/w:t" {
            in_text_run = false;
        } else if tag == "/w:p" {
            text.push('\n');
        } else if tag == "w:tab" || tag.starts_with("w:tab ") || tag == "w:tab/" {
            text.push('\t');
        } else if tag == "w:br" || tag.starts_with("w:br ") || tag == "w:br/" {
            text.push('\n');
        }

        pos = tag_end + 1;
    }

    // Collapse runs of blank paragraphs left by structural markup
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

fn decode_entities_into(raw: &str, out: &mut String) {
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            out.push_str(rest);
            return;
        };
        match &rest[..=semi] {
            "&amp;" => out.push('&'),
            "&lt;" => out.push('<'),
            "&gt;" => out.push('>'),
            "&quot;" => out.push('"'),
            "&apos;" => out.push('\''),
            other => out.push_str(other),
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
}
