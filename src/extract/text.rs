use encoding_rs::Encoding;

use crate::extract::errors::ExtractError;

const DETECTION_WINDOW: usize = 4096;

/// Decode a plain-text payload to UTF-8.
///
/// The charset is guessed from the first few KB so Latin-1 and friends
/// survive the trip; a decode with errors is an extraction failure rather
/// than silently mangled text.
pub fn extract(data: &[u8]) -> Result<String, ExtractError> {
    let encoding = detect_encoding(data);
    let (decoded, _, had_errors) = encoding.decode(data);
    if had_errors {
        return Err(ExtractError::extraction(
            "text",
            format!("failed to decode content with encoding {}", encoding.name()),
        ));
    }
    Ok(decoded.into_owned())
}

/// Last-resort decode for payloads with no usable content type: strict
/// UTF-8 only. Anything that is not text fails as unsupported.
pub fn extract_unknown(data: &[u8]) -> Result<String, ExtractError> {
    String::from_utf8(data.to_vec()).map_err(|_| {
        ExtractError::UnsupportedFormat(
            "no declared content type and payload is not valid UTF-8 text".to_string(),
        )
    })
}

fn detect_encoding(data: &[u8]) -> &'static Encoding {
    let window = &data[..data.len().min(DETECTION_WINDOW)];
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, true);
    detector.guess(None, true)
}
