use std::io::{Cursor, Read};

use quick_xml::events::Event;

use crate::extract::errors::ExtractError;

/// Pull raw text out of a DOCX document, discarding styling and structure.
///
/// A DOCX file is a ZIP archive; the document body lives in
/// `word/document.xml` as WordprocessingML. Text nodes sit inside `w:t`
/// elements, paragraphs end at `w:p` boundaries.
pub fn extract(data: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| ExtractError::extraction("word", format!("not a Word archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::extraction("word", format!("missing document body: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::extraction("word", e.to_string()))?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"w:tab" => out.push('\t'),
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| ExtractError::extraction("word", e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::extraction(
                    "word",
                    format!("malformed document XML: {e}"),
                ));
            }
            _ => {}
        }
    }

    Ok(out)
}
