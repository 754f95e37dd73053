use crate::extract::errors::ExtractError;
use crate::extract::normalize_whitespace;

#[derive(Debug)]
pub struct PdfText {
    pub text: String,
    /// Reported to the trace sink only; never affects success or failure.
    pub pages: usize,
}

/// Extract page text from an in-memory PDF. Pages come back concatenated in
/// document order.
pub fn extract(data: &[u8]) -> Result<PdfText, ExtractError> {
    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| ExtractError::extraction("pdf", e.to_string()))?;

    let pages = lopdf::Document::load_mem(data)
        .map(|doc| doc.get_pages().len())
        .unwrap_or(0);

    Ok(PdfText {
        text: normalize_whitespace(&text),
        pages,
    })
}

/// Build a one-page PDF containing `text`, for tests across the extract
/// module.
#[cfg(test)]
pub(crate) fn pdf_with_text(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 48.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content stream"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize pdf");
    buffer
}
